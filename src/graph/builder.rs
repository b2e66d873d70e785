//! GraphBuilder: fluent accumulation of nodes and edges before compilation.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{ConditionalEdge, RouterFn};
use crate::channels::StateSchema;
use crate::node::Node;
use crate::runtime::RunConfig;
use crate::state::StateSnapshot;
use crate::types::NodeId;

/// Builder for workflow graphs.
///
/// Accumulates node and edge definitions against a [`StateSchema`], then
/// validates and freezes them with [`compile`](Self::compile). Registration
/// problems (duplicate nodes, edges into undeclared nodes) are recorded and
/// surfaced at compile time, before any node executes.
///
/// Every graph needs an entry: either [`set_entry`](Self::set_entry) or an
/// edge from [`NodeId::Start`]. `Start` and `End` are virtual endpoints and
/// must never be registered with [`add_node`](Self::add_node).
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
/// let graph = GraphBuilder::new(StateSchema::messages())
///     .add_node(
///         "chat",
///         FnNode::new(|_snapshot, _ctx| async move {
///             Ok(StateUpdate::new().with_messages(vec![Message::assistant("ack")]))
///         }),
///     )
///     .set_entry("chat")
///     .add_edge("chat", "End")
///     .compile()
///     .unwrap();
/// ```
pub struct GraphBuilder {
    pub(crate) schema: StateSchema,
    pub(crate) nodes: FxHashMap<NodeId, Arc<dyn Node>>,
    pub(crate) edges: FxHashMap<NodeId, Vec<NodeId>>,
    pub(crate) conditional_edges: FxHashMap<NodeId, ConditionalEdge>,
    pub(crate) config: RunConfig,
    /// Registration mistakes, reported by `compile`.
    pub(crate) duplicate_nodes: Vec<NodeId>,
    pub(crate) duplicate_routers: Vec<NodeId>,
}

impl GraphBuilder {
    /// Start building a graph over the given state schema.
    #[must_use]
    pub fn new(schema: StateSchema) -> Self {
        Self {
            schema,
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_edges: FxHashMap::default(),
            config: RunConfig::default(),
            duplicate_nodes: Vec::new(),
            duplicate_routers: Vec::new(),
        }
    }

    /// Register an executable node.
    ///
    /// Registering the same name twice is a build error reported at compile.
    /// Attempts to register the virtual `Start`/`End` endpoints are ignored
    /// with a warning.
    #[must_use]
    pub fn add_node(mut self, id: impl Into<NodeId>, node: impl Node + 'static) -> Self {
        let id = id.into();
        match id {
            NodeId::Start | NodeId::End => {
                tracing::warn!(%id, "ignoring registration of virtual endpoint");
            }
            NodeId::Named(_) => {
                if self.nodes.insert(id.clone(), Arc::new(node)).is_some() {
                    self.duplicate_nodes.push(id);
                }
            }
        }
        self
    }

    /// Register an unconditional edge.
    ///
    /// Forward references are allowed; endpoints are resolved at compile
    /// time. At most one unconditional edge may leave a node; branching
    /// requires a conditional edge.
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        self.edges.entry(from.into()).or_default().push(to.into());
        self
    }

    /// Register a conditional edge whose router keys name target nodes
    /// directly (`"End"` terminates the run).
    #[must_use]
    pub fn add_conditional_edges(
        mut self,
        from: impl Into<NodeId>,
        router: impl Fn(&StateSnapshot) -> String + Send + Sync + 'static,
    ) -> Self {
        let from = from.into();
        let router: RouterFn = Arc::new(router);
        self.insert_conditional(ConditionalEdge::new(from, router));
        self
    }

    /// Register a conditional edge with a key → target translation table.
    ///
    /// Router keys missing from the mapping fail the run with an invalid
    /// route error.
    #[must_use]
    pub fn add_conditional_edges_with(
        mut self,
        from: impl Into<NodeId>,
        router: impl Fn(&StateSnapshot) -> String + Send + Sync + 'static,
        mapping: impl IntoIterator<Item = (&'static str, &'static str)>,
    ) -> Self {
        let from = from.into();
        let router: RouterFn = Arc::new(router);
        let mapping: FxHashMap<String, NodeId> = mapping
            .into_iter()
            .map(|(key, target)| (key.to_string(), NodeId::from(target)))
            .collect();
        self.insert_conditional(ConditionalEdge::with_mapping(from, router, mapping));
        self
    }

    /// Designate the first node executed. Equivalent to
    /// `add_edge(NodeId::Start, id)`.
    #[must_use]
    pub fn set_entry(self, id: impl Into<NodeId>) -> Self {
        self.add_edge(NodeId::Start, id)
    }

    /// Attach run configuration (step budget, checkpointer).
    #[must_use]
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    fn insert_conditional(&mut self, edge: ConditionalEdge) {
        let from = edge.from().clone();
        if self.conditional_edges.insert(from.clone(), edge).is_some() {
            self.duplicate_routers.push(from);
        }
    }
}
