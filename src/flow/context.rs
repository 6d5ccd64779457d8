// src/flow/context.rs

//! The state shared by all stages of one run, and the patches stages return.

use crate::core_types::{AnalysisResult, AnalysisStats, ApiInfo, ProjectInfo, SummaryResult};
use crate::session::Session;
use serde::Serialize;
use std::collections::HashSet;

/// Everything the stages of one run have produced so far.
///
/// Owned by the caller; the engine is the only writer and merges one
/// [`ContextPatch`] per stage execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SharedContext {
    pub project_info: Option<ProjectInfo>,
    pub apis: Vec<ApiInfo>,
    /// Sorted by `index`; at most one result per API.
    pub analysis_results: Vec<AnalysisResult>,
    pub analysis_stats: Option<AnalysisStats>,
    pub final_summary: Option<SummaryResult>,
    /// How many times the analysis stage has been re-entered for missing results.
    pub refinement_round: u32,
    pub session: Option<Session>,
}

impl SharedContext {
    pub fn new(project_info: ProjectInfo, session: Option<Session>) -> Self {
        Self {
            project_info: Some(project_info),
            session,
            ..Self::default()
        }
    }

    /// Indices into `apis` that have no analysis result yet.
    pub fn pending_indices(&self) -> Vec<usize> {
        let done: HashSet<usize> = self.analysis_results.iter().map(|r| r.index).collect();
        (0..self.apis.len()).filter(|i| !done.contains(i)).collect()
    }

    /// Merges a stage's patch.
    ///
    /// Replacing `apis` drops existing results, since their indices refer to
    /// the old list. New results are appended, then the list is sorted by
    /// index and a later result for an index already present is discarded.
    pub fn apply(&mut self, patch: ContextPatch) {
        if let Some(project_info) = patch.project_info {
            self.project_info = Some(project_info);
        }
        if let Some(apis) = patch.apis {
            self.apis = apis;
            self.analysis_results.clear();
            self.analysis_stats = None;
        }
        if !patch.new_results.is_empty() {
            self.analysis_results.extend(patch.new_results);
            // Stable sort keeps the earlier result first for duplicate indices.
            self.analysis_results.sort_by_key(|r| r.index);
            self.analysis_results.dedup_by_key(|r| r.index);
        }
        if let Some(stats) = patch.analysis_stats {
            self.analysis_stats = Some(stats);
        }
        if let Some(summary) = patch.final_summary {
            self.final_summary = Some(summary);
        }
        if let Some(round) = patch.refinement_round {
            self.refinement_round = round;
        }
    }
}

/// The changes one stage execution makes to the [`SharedContext`].
#[derive(Debug, Clone, Default)]
pub struct ContextPatch {
    pub project_info: Option<ProjectInfo>,
    pub apis: Option<Vec<ApiInfo>>,
    pub new_results: Vec<AnalysisResult>,
    pub analysis_stats: Option<AnalysisStats>,
    pub final_summary: Option<SummaryResult>,
    pub refinement_round: Option<u32>,
}

impl ContextPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_info(mut self, info: ProjectInfo) -> Self {
        self.project_info = Some(info);
        self
    }

    pub fn apis(mut self, apis: Vec<ApiInfo>) -> Self {
        self.apis = Some(apis);
        self
    }

    pub fn results(mut self, results: Vec<AnalysisResult>) -> Self {
        self.new_results = results;
        self
    }

    pub fn stats(mut self, stats: AnalysisStats) -> Self {
        self.analysis_stats = Some(stats);
        self
    }

    pub fn summary(mut self, summary: SummaryResult) -> Self {
        self.final_summary = Some(summary);
        self
    }

    pub fn refinement_round(mut self, round: u32) -> Self {
        self.refinement_round = Some(round);
        self
    }
}
