// src/stages/summary_generation.rs

use crate::analysis::parse_analysis_json;
use crate::analysis::stats::recommendations_of;
use crate::constants::SUMMARY_FILE;
use crate::core_types::{AnalysisResult, AnalysisStats, ApiInfo, SummaryResult};
use crate::errors::Result;
use crate::flow::{ContextPatch, SharedContext, Stage, StageAction, StageOutcome, DEFAULT_ACTION};
use crate::session::Session;
use std::collections::{BTreeMap, HashSet};

/// Label of the edge back to the analysis stage.
pub const NEEDS_MORE_INFO: &str = "needs_more_info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryAction {
    Done,
    /// Some endpoints have no result and another analysis round is allowed.
    NeedsMoreInfo,
}

impl StageAction for SummaryAction {
    fn label(&self) -> &'static str {
        match self {
            SummaryAction::Done => DEFAULT_ACTION,
            SummaryAction::NeedsMoreInfo => NEEDS_MORE_INFO,
        }
    }
}

/// Builds the final report and decides whether another round is needed.
pub struct SummaryGenerationStage {
    refinement_rounds: u32,
}

impl SummaryGenerationStage {
    pub fn new(refinement_rounds: u32) -> Self {
        Self { refinement_rounds }
    }
}

pub struct SummaryInput {
    apis: Vec<ApiInfo>,
    results: Vec<AnalysisResult>,
    stats: Option<AnalysisStats>,
    pending: usize,
    round: u32,
    session: Option<Session>,
}

fn method_of(api: &ApiInfo) -> String {
    let method = if api.http_method.is_empty() {
        &api.req.method
    } else {
        &api.http_method
    };
    if method.trim().is_empty() {
        "UNKNOWN".to_string()
    } else {
        method.trim().to_uppercase()
    }
}

/// One-paragraph overview: method counts, coverage and success rate.
fn describe(input: &SummaryInput) -> String {
    let mut per_method: BTreeMap<String, usize> = BTreeMap::new();
    for api in &input.apis {
        *per_method.entry(method_of(api)).or_default() += 1;
    }
    let methods = per_method
        .iter()
        .map(|(m, n)| format!("{m}={n}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = format!(
        "{} APIs found ({}). {} analyzed, {} without result.",
        input.apis.len(),
        if methods.is_empty() { "none" } else { methods.as_str() },
        input.results.len(),
        input.pending
    );
    if let Some(rate) = input.stats.and_then(|s| s.success_rate) {
        text.push_str(&format!(" Success rate: {rate:.2}%."));
    }
    text
}

fn collect_recommendations(input: &SummaryInput) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut recommendations: Vec<String> = input
        .results
        .iter()
        .filter_map(|r| parse_analysis_json(&r.analysis))
        .flat_map(|object| recommendations_of(&object))
        .filter(|r| seen.insert(r.clone()))
        .collect();
    if input.pending > 0 {
        recommendations.push(format!(
            "{} APIs have no analysis result; re-run the analysis for them",
            input.pending
        ));
    }
    recommendations
}

impl Stage for SummaryGenerationStage {
    type Prepared = SummaryInput;
    type Output = SummaryResult;
    type Action = SummaryAction;

    fn name(&self) -> &'static str {
        "summary_generation"
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<SummaryInput> {
        log::info!("Generating summary - total APIs: {}", ctx.apis.len());
        Ok(SummaryInput {
            apis: ctx.apis.clone(),
            results: ctx.analysis_results.clone(),
            stats: ctx.analysis_stats,
            pending: ctx.pending_indices().len(),
            round: ctx.refinement_round,
            session: ctx.session.clone(),
        })
    }

    fn execute(&self, input: &SummaryInput) -> Result<SummaryResult> {
        Ok(SummaryResult {
            total_apis: input.apis.len(),
            api_summary: describe(input),
            recommendations: collect_recommendations(input),
            analysis_results: input.results.clone(),
        })
    }

    fn finalize(
        &self,
        _ctx: &SharedContext,
        input: SummaryInput,
        summary: SummaryResult,
    ) -> Result<StageOutcome<SummaryAction>> {
        if let Some(session) = &input.session {
            let path = session.write_json(SUMMARY_FILE, &summary)?;
            log::info!("Summary written to {}", path.display());
        }
        log::info!("{}", summary.api_summary);

        let mut patch = ContextPatch::new().summary(summary);
        let action = if input.pending > 0 && input.round < self.refinement_rounds {
            log::info!(
                "{} APIs lack results, starting refinement round {}",
                input.pending,
                input.round + 1
            );
            patch = patch.refinement_round(input.round + 1);
            SummaryAction::NeedsMoreInfo
        } else {
            SummaryAction::Done
        };
        Ok(StageOutcome::new(patch, action))
    }
}
