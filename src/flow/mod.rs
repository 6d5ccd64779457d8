//! The stage graph engine.
//!
//! A [`Flow`] is a set of named stages plus a transition table keyed by
//! `(stage, action label)`. Running it walks from the start stage, merging
//! each stage's [`ContextPatch`] into the caller's [`SharedContext`], until a
//! stage returns an action with no outgoing edge. That action's label is the
//! result of the run.
//!
//! # Examples
//!
//! ```
//! use wfg::flow::{ContextPatch, DefaultAction, Flow, NoopObserver, SharedContext, Stage, StageOutcome};
//! use wfg::CancellationToken;
//!
//! struct Bump;
//!
//! impl Stage for Bump {
//!     type Prepared = u32;
//!     type Output = u32;
//!     type Action = DefaultAction;
//!
//!     fn name(&self) -> &'static str { "bump" }
//!     fn prepare(&self, ctx: &SharedContext) -> wfg::Result<u32> { Ok(ctx.refinement_round) }
//!     fn execute(&self, round: &u32) -> wfg::Result<u32> { Ok(round + 1) }
//!     fn finalize(&self, _: &SharedContext, _: u32, next: u32) -> wfg::Result<StageOutcome<DefaultAction>> {
//!         Ok(StageOutcome::new(ContextPatch::new().refinement_round(next), DefaultAction::Default))
//!     }
//! }
//!
//! let flow = Flow::builder().stage(Bump).start("bump").build().unwrap();
//! let mut ctx = SharedContext::default();
//! let action = flow.run(&mut ctx, &CancellationToken::new(), &NoopObserver).unwrap();
//! assert_eq!(action, "default");
//! assert_eq!(ctx.refinement_round, 1);
//! ```

mod context;

pub use context::{ContextPatch, SharedContext};

use crate::cancellation::CancellationToken;
use crate::constants::DEFAULT_MAX_ITERATIONS;
use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// The label of [`DefaultAction::Default`].
pub const DEFAULT_ACTION: &str = "default";

/// An action a stage can return. Its label selects the outgoing edge.
pub trait StageAction: fmt::Debug + Send + 'static {
    fn label(&self) -> &'static str;
}

/// For stages that only ever continue along one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultAction {
    #[default]
    Default,
}

impl StageAction for DefaultAction {
    fn label(&self) -> &'static str {
        DEFAULT_ACTION
    }
}

/// What a stage hands back to the engine.
#[derive(Debug)]
pub struct StageOutcome<A> {
    pub patch: ContextPatch,
    pub action: A,
}

impl<A: StageAction> StageOutcome<A> {
    pub fn new(patch: ContextPatch, action: A) -> Self {
        Self { patch, action }
    }
}

/// One node of the graph.
///
/// `prepare` reads what it needs from the context, `execute` does the work
/// without context access, and `finalize` turns the result into a patch and
/// an action. An error from any phase aborts the run.
pub trait Stage: Send + Sync {
    type Prepared;
    type Output;
    type Action: StageAction;

    /// Unique name used for edges, logs and snapshot files.
    fn name(&self) -> &'static str;

    fn prepare(&self, ctx: &SharedContext) -> Result<Self::Prepared>;

    fn execute(&self, prepared: &Self::Prepared) -> Result<Self::Output>;

    fn finalize(
        &self,
        ctx: &SharedContext,
        prepared: Self::Prepared,
        output: Self::Output,
    ) -> Result<StageOutcome<Self::Action>>;
}

/// Object-safe view of a [`Stage`], so stages with different associated
/// types can live in one graph.
trait Node: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &SharedContext) -> Result<(ContextPatch, &'static str)>;
}

impl<S: Stage> Node for S {
    fn name(&self) -> &'static str {
        Stage::name(self)
    }

    fn run(&self, ctx: &SharedContext) -> Result<(ContextPatch, &'static str)> {
        let prepared = self.prepare(ctx)?;
        let output = self.execute(&prepared)?;
        let outcome = self.finalize(ctx, prepared, output)?;
        log::debug!("Stage '{}' returned {:?}", Stage::name(self), outcome.action);
        Ok((outcome.patch, outcome.action.label()))
    }
}

/// Notified after each stage's patch has been merged.
pub trait FlowObserver {
    /// `sequence` counts stage executions from 1.
    fn stage_completed(
        &self,
        sequence: usize,
        stage: &str,
        action: &str,
        ctx: &SharedContext,
    ) -> Result<()>;
}

/// An observer that does nothing.
pub struct NoopObserver;

impl FlowObserver for NoopObserver {
    fn stage_completed(&self, _: usize, _: &str, _: &str, _: &SharedContext) -> Result<()> {
        Ok(())
    }
}

/// Assembles and validates a [`Flow`].
pub struct FlowBuilder {
    stages: Vec<Box<dyn Node>>,
    edges: Vec<(String, String, String)>,
    start: Option<String>,
    max_iterations: usize,
}

impl FlowBuilder {
    /// Registers a stage under its [`Stage::name`].
    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Adds the transition `from --label--> to`.
    pub fn edge(mut self, from: &str, label: &str, to: &str) -> Self {
        self.edges
            .push((from.to_string(), label.to_string(), to.to_string()));
        self
    }

    /// Shorthand for `edge(from, "default", to)`.
    pub fn then(self, from: &str, to: &str) -> Self {
        self.edge(from, DEFAULT_ACTION, to)
    }

    pub fn start(mut self, name: &str) -> Self {
        self.start = Some(name.to_string());
        self
    }

    /// Caps the total number of stage executions per run.
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Validates the graph.
    ///
    /// # Errors
    /// `Error::Graph` for duplicate stage names, a missing or unknown start
    /// stage, edges touching unknown stages, conflicting edges, or a zero
    /// iteration cap.
    pub fn build(self) -> Result<Flow> {
        let mut index = HashMap::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if index.insert(stage.name(), i).is_some() {
                return Err(Error::Graph(format!(
                    "duplicate stage name '{}'",
                    stage.name()
                )));
            }
        }
        let lookup = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| Error::Graph(format!("unknown stage '{name}'")))
        };

        let start_name = self
            .start
            .ok_or_else(|| Error::Graph("no start stage set".to_string()))?;
        let start = lookup(&start_name)?;

        let mut transitions = HashMap::new();
        for (from, label, to) in &self.edges {
            let key = (lookup(from)?, label.clone());
            let target = lookup(to)?;
            if let Some(existing) = transitions.insert(key, target) {
                if existing != target {
                    return Err(Error::Graph(format!(
                        "stage '{from}' has conflicting edges for action '{label}'"
                    )));
                }
            }
        }

        if self.max_iterations == 0 {
            return Err(Error::Graph("max_iterations must be at least 1".to_string()));
        }

        Ok(Flow {
            stages: self.stages,
            transitions,
            start,
            max_iterations: self.max_iterations,
        })
    }
}

/// A validated stage graph.
pub struct Flow {
    stages: Vec<Box<dyn Node>>,
    transitions: HashMap<(usize, String), usize>,
    start: usize,
    max_iterations: usize,
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("Flow")
            .field("stages", &names)
            .field("start", &names[self.start])
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl Flow {
    pub fn builder() -> FlowBuilder {
        FlowBuilder {
            stages: Vec::new(),
            edges: Vec::new(),
            start: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Runs the graph to completion and returns the terminal action label.
    ///
    /// On error `ctx` keeps every patch merged before the failing stage.
    ///
    /// # Errors
    /// Any stage error, `Error::Interrupted` if `token` is cancelled between
    /// stages, `Error::IterationLimit` if the cap is reached, or an observer error.
    pub fn run(
        &self,
        ctx: &mut SharedContext,
        token: &CancellationToken,
        observer: &dyn FlowObserver,
    ) -> Result<&'static str> {
        let mut current = self.start;
        let mut executed = 0usize;

        loop {
            token.check()?;
            if executed >= self.max_iterations {
                log::error!(
                    "Stage graph stopped after {} executions (last stage '{}')",
                    executed,
                    self.stages[current].name()
                );
                return Err(Error::IterationLimit(self.max_iterations));
            }
            executed += 1;

            let stage = &self.stages[current];
            log::info!("Running stage '{}' ({})", stage.name(), executed);
            let (patch, action) = stage.run(ctx).map_err(|e| {
                log::error!("Stage '{}' failed: {}", stage.name(), e);
                e
            })?;
            ctx.apply(patch);
            observer.stage_completed(executed, stage.name(), action, ctx)?;

            match self.transitions.get(&(current, action.to_string())) {
                Some(&next) => current = next,
                None => {
                    log::debug!("Flow ended at '{}' with action '{}'", stage.name(), action);
                    return Ok(action);
                }
            }
        }
    }
}
