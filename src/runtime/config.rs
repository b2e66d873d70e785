//! Run configuration.

use std::sync::Arc;

use super::checkpointer::Checkpointer;

/// Default ceiling on executed nodes per invocation.
///
/// Generous enough for deep agent loops, small enough to catch a cycle that
/// never routes to the terminal sentinel.
pub const DEFAULT_STEP_BUDGET: u64 = 25;

/// Graph-level run configuration, attached at build time with
/// [`GraphBuilder::with_config`](crate::graph::GraphBuilder::with_config).
#[derive(Clone)]
pub struct RunConfig {
    /// Maximum number of node executions per invocation.
    pub step_budget: u64,
    /// Persistence backend; `None` disables checkpointing entirely.
    pub checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            checkpointer: None,
        }
    }
}

impl RunConfig {
    /// Override the step budget for every run of this graph.
    #[must_use]
    pub fn with_step_budget(mut self, budget: u64) -> Self {
        self.step_budget = budget;
        self
    }

    /// Attach a persistence backend.
    #[must_use]
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("step_budget", &self.step_budget)
            .field("checkpointer", &self.checkpointer.is_some())
            .finish()
    }
}

/// Per-invocation options for [`CompiledGraph::invoke_with`] and
/// [`CompiledGraph::stream_with`].
///
/// [`CompiledGraph::invoke_with`]: crate::graph::CompiledGraph::invoke_with
/// [`CompiledGraph::stream_with`]: crate::graph::CompiledGraph::stream_with
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Conversation identity for checkpoint save/load. Runs without a thread
    /// id never touch the checkpointer.
    pub thread_id: Option<String>,
    /// Step budget override for this invocation only.
    pub step_budget: Option<u64>,
}

impl RunOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope this run to a persistent conversation thread.
    #[must_use]
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Override the graph's step budget for this run.
    #[must_use]
    pub fn with_step_budget(mut self, budget: u64) -> Self {
        self.step_budget = Some(budget);
        self
    }
}
