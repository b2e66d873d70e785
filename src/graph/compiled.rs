//! The immutable, runnable form of a graph.

use futures_util::StreamExt;
use futures_util::TryStreamExt;
use futures_util::stream::{self, BoxStream};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::instrument;

use super::edges::ConditionalEdge;
use crate::channels::StateSchema;
use crate::node::Node;
use crate::runtime::scheduler::{RunError, Scheduler, StepDelta};
use crate::runtime::{RunConfig, RunOptions};
use crate::state::{RunState, StateUpdate};
use crate::types::NodeId;

/// Frozen graph definition shared by all runs of one compiled graph.
pub(crate) struct GraphInner {
    pub(crate) schema: StateSchema,
    pub(crate) nodes: FxHashMap<NodeId, Arc<dyn Node>>,
    /// Unconditional transitions; compilation guarantees one per source.
    pub(crate) edges: FxHashMap<NodeId, NodeId>,
    pub(crate) conditional_edges: FxHashMap<NodeId, ConditionalEdge>,
    pub(crate) config: RunConfig,
}

/// Compiled, immutable, runnable graph.
///
/// Cheap to clone (shared definition); each run owns its own state, so any
/// number of independent runs may execute concurrently. Produced by
/// [`GraphBuilder::compile`](crate::graph::GraphBuilder::compile).
///
/// # Examples
///
/// ```rust
/// use stategraph::channels::StateSchema;
/// use stategraph::graph::GraphBuilder;
/// use stategraph::message::Message;
/// use stategraph::node::FnNode;
/// use stategraph::state::StateUpdate;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = GraphBuilder::new(StateSchema::messages())
///     .add_node(
///         "chat",
///         FnNode::new(|_snapshot, _ctx| async move {
///             Ok(StateUpdate::new().with_messages(vec![Message::assistant("ack")]))
///         }),
///     )
///     .set_entry("chat")
///     .add_edge("chat", "End")
///     .compile()?;
///
/// let input = StateUpdate::new().with_messages(vec![Message::user("hi")]);
/// let final_state = graph.invoke(input).await?;
/// assert_eq!(final_state.messages()?.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CompiledGraph {
    inner: Arc<GraphInner>,
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("nodes", &self.node_ids())
            .finish_non_exhaustive()
    }
}

impl CompiledGraph {
    pub(crate) fn from_inner(inner: GraphInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub(crate) fn inner(&self) -> &GraphInner {
        &self.inner
    }

    /// The schema this graph was compiled against.
    #[must_use]
    pub fn schema(&self) -> &StateSchema {
        &self.inner.schema
    }

    /// Names of the registered executable nodes, sorted.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.inner.nodes.keys().cloned().collect();
        ids.sort_by_key(NodeId::encode);
        ids
    }

    /// Run to termination and return the fully merged terminal state.
    ///
    /// The caller's `input` is a partial update merged over the initial state
    /// (schema defaults, or the thread's checkpoint when resuming) through
    /// the channel reducers.
    #[instrument(skip(self, input), err)]
    pub async fn invoke(&self, input: StateUpdate) -> Result<RunState, RunError> {
        self.invoke_with(input, RunOptions::default()).await
    }

    /// [`invoke`](Self::invoke) with per-run options: a thread identifier for
    /// checkpoint scoping and/or a step budget override.
    #[instrument(skip(self, input), fields(thread = ?options.thread_id), err)]
    pub async fn invoke_with(
        &self,
        input: StateUpdate,
        options: RunOptions,
    ) -> Result<RunState, RunError> {
        let mut scheduler = Scheduler::start(Arc::clone(&self.inner), input, options).await?;
        while scheduler.advance().await?.is_some() {}
        Ok(scheduler.into_state())
    }

    /// Run lazily, yielding one [`StepDelta`] per executed node.
    ///
    /// The sequence is finite (termination or step budget) and not
    /// restartable: a fresh call re-runs from the initial state. Dropping the
    /// stream stops scheduling; no further node executes after the consumer
    /// detaches.
    #[must_use]
    pub fn stream(&self, input: StateUpdate) -> BoxStream<'static, Result<StepDelta, RunError>> {
        self.stream_with(input, RunOptions::default())
    }

    /// [`stream`](Self::stream) with per-run options.
    #[must_use]
    pub fn stream_with(
        &self,
        input: StateUpdate,
        options: RunOptions,
    ) -> BoxStream<'static, Result<StepDelta, RunError>> {
        let inner = Arc::clone(&self.inner);
        let setup = async move {
            let scheduler = Scheduler::start(inner, input, options).await?;
            Ok::<_, RunError>(stream::try_unfold(scheduler, |mut scheduler| async move {
                match scheduler.advance().await? {
                    Some(delta) => Ok(Some((delta, scheduler))),
                    None => Ok(None),
                }
            }))
        };
        stream::once(setup).try_flatten().boxed()
    }
}
