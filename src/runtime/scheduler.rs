//! Sequential step scheduler.
//!
//! One [`Scheduler`] drives one run: starting at the virtual `Start`
//! endpoint, it resolves the next node (conditional edge first, then the
//! unconditional one), executes it, merges its update through the channel
//! reducers, persists a checkpoint for thread-scoped runs, and repeats until
//! the route reaches `End`, the step budget is exhausted, or an error aborts
//! the run. Exactly one node is in flight at any time.

use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::graph::compiled::GraphInner;
use crate::node::{NodeContext, NodeError};
use crate::reducers::ReducerError;
use crate::runtime::checkpointer::{Checkpoint, CheckpointError, Checkpointer};
use crate::runtime::config::RunOptions;
use crate::state::{RunState, StateUpdate};
use crate::types::NodeId;

/// Fatal run-time failure; the run stops at the step that raised it.
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    /// A router produced a key with no usable target.
    #[error("router at {from} returned {key:?}, which resolves to no declared node (step {step})")]
    #[diagnostic(
        code(stategraph::run::invalid_route),
        help("Every router key must name a declared node, a mapping entry, or \"End\".")
    )]
    InvalidRoute { from: NodeId, key: String, step: u64 },

    /// Control flow reached a node with no outgoing edge at all.
    #[error("no outgoing edge from {node} (step {step})")]
    #[diagnostic(
        code(stategraph::run::dangling_node),
        help("Add an edge from the node to another node or to End.")
    )]
    DanglingNode { node: NodeId, step: u64 },

    /// A node's execution returned an error.
    #[error("node {node} failed at step {step}")]
    #[diagnostic(code(stategraph::run::node))]
    NodeRun {
        node: NodeId,
        step: u64,
        #[source]
        #[diagnostic_source]
        source: NodeError,
    },

    /// The run executed its full step budget without reaching End.
    #[error("step budget of {budget} exhausted before reaching End")]
    #[diagnostic(
        code(stategraph::run::step_budget),
        help("Raise the budget via RunConfig/RunOptions, or fix the loop's exit route.")
    )]
    StepBudgetExceeded { budget: u64 },

    /// Merging a node's update through a channel reducer failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Reducer(#[from] ReducerError),

    /// Checkpoint persistence failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// One streamed progress item: which node ran at which step, and the partial
/// update it produced (pre-merge).
#[derive(Clone, Debug)]
pub struct StepDelta {
    /// One-based step number.
    pub step: u64,
    /// Node that executed.
    pub node: NodeId,
    /// The update the node returned, before reduction into the run state.
    pub update: StateUpdate,
}

/// Drives one run of a compiled graph, one node at a time.
pub struct Scheduler {
    graph: Arc<GraphInner>,
    state: RunState,
    current: NodeId,
    steps: u64,
    budget: u64,
    thread_id: Option<String>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    run_id: Uuid,
    finished: bool,
}

impl Scheduler {
    /// Prepare a run: resolve the initial state (checkpoint or schema
    /// defaults) and merge the caller's input through the reducers.
    pub(crate) async fn start(
        graph: Arc<GraphInner>,
        input: StateUpdate,
        options: RunOptions,
    ) -> Result<Self, RunError> {
        let budget = options.step_budget.unwrap_or(graph.config.step_budget);
        let checkpointer = match &options.thread_id {
            Some(_) => graph.config.checkpointer.clone(),
            None => None,
        };
        let run_id = Uuid::new_v4();

        let mut state = match (&checkpointer, &options.thread_id) {
            (Some(checkpointer), Some(thread_id)) => {
                match checkpointer.load(thread_id).await? {
                    Some(checkpoint) => {
                        tracing::debug!(
                            %run_id,
                            thread_id,
                            step = checkpoint.step,
                            "resuming from checkpoint"
                        );
                        RunState::from_values(&graph.schema, checkpoint.values)
                    }
                    None => RunState::fresh(&graph.schema),
                }
            }
            _ => RunState::fresh(&graph.schema),
        };
        if !input.is_empty() {
            state.apply(&graph.schema, &input)?;
        }

        Ok(Self {
            graph,
            state,
            current: NodeId::Start,
            steps: 0,
            budget,
            thread_id: options.thread_id,
            checkpointer,
            run_id,
            finished: false,
        })
    }

    /// Execute the next node.
    ///
    /// Returns `Ok(None)` once the route has reached `End`; after that every
    /// further call is a no-op returning `None` again. An `Err` also
    /// terminates the run, but thread-scoped runs keep the checkpoints saved
    /// up to the failing step.
    pub async fn advance(&mut self) -> Result<Option<StepDelta>, RunError> {
        if self.finished {
            return Ok(None);
        }
        let next = match self.resolve_next()? {
            Some(next) => next,
            None => {
                self.finished = true;
                tracing::debug!(run_id = %self.run_id, steps = self.steps, "run complete");
                return Ok(None);
            }
        };
        if self.steps >= self.budget {
            self.finished = true;
            return Err(RunError::StepBudgetExceeded {
                budget: self.budget,
            });
        }

        let step = self.steps + 1;
        let node = self
            .graph
            .nodes
            .get(&next)
            .ok_or_else(|| RunError::DanglingNode {
                node: next.clone(),
                step,
            })?;
        let ctx = NodeContext {
            node: next.clone(),
            step,
            thread_id: self.thread_id.clone(),
        };
        tracing::debug!(run_id = %self.run_id, node = %next, step, "executing node");
        let update = node
            .run(self.state.snapshot(), ctx)
            .await
            .map_err(|source| {
                self.finished = true;
                RunError::NodeRun {
                    node: next.clone(),
                    step,
                    source,
                }
            })?;

        self.state.apply(&self.graph.schema, &update)?;
        self.steps = step;
        self.current = next.clone();

        if let (Some(checkpointer), Some(thread_id)) = (&self.checkpointer, &self.thread_id) {
            let checkpoint = Checkpoint::new(
                thread_id.clone(),
                step,
                self.state.values().clone(),
            );
            checkpointer.save(checkpoint).await?;
        }

        Ok(Some(StepDelta {
            step,
            node: next,
            update,
        }))
    }

    /// Resolve the node after `current`: the conditional route when one is
    /// declared, otherwise the unconditional edge. Compilation guarantees a
    /// node never has both. `Ok(None)` means the route reached `End`.
    fn resolve_next(&mut self) -> Result<Option<NodeId>, RunError> {
        if let Some(edge) = self.graph.conditional_edges.get(&self.current) {
            let (key, target) = edge.route(&self.state.snapshot());
            let step = self.steps + 1;
            let Some(target) = target else {
                self.finished = true;
                return Err(RunError::InvalidRoute {
                    from: self.current.clone(),
                    key,
                    step,
                });
            };
            if target.is_end() {
                return Ok(None);
            }
            if target.is_start() || !self.graph.nodes.contains_key(&target) {
                self.finished = true;
                return Err(RunError::InvalidRoute {
                    from: self.current.clone(),
                    key,
                    step,
                });
            }
            return Ok(Some(target));
        }
        match self.graph.edges.get(&self.current) {
            Some(next) if next.is_end() => Ok(None),
            Some(next) => Ok(Some(next.clone())),
            None => {
                self.finished = true;
                Err(RunError::DanglingNode {
                    node: self.current.clone(),
                    step: self.steps + 1,
                })
            }
        }
    }

    /// Number of nodes executed so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Current merged state.
    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Consume into the final merged state.
    #[must_use]
    pub fn into_state(self) -> RunState {
        self.state
    }
}
