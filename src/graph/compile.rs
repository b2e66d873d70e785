//! Graph validation and compilation.
//!
//! [`GraphBuilder::compile`] checks the accumulated definition and freezes it
//! into a [`CompiledGraph`]. All structural misconfiguration is reported here,
//! before any node executes; the only routing checks deferred to run time are
//! the targets of routers without a mapping, which are statically unknown.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::builder::GraphBuilder;
use super::compiled::{CompiledGraph, GraphInner};
use crate::types::NodeId;

/// Build-time misconfiguration, raised by [`GraphBuilder::compile`].
#[derive(Debug, Error, Diagnostic)]
pub enum GraphValidationError {
    /// The same node name was registered more than once.
    #[error("node registered twice: {node}")]
    #[diagnostic(code(stategraph::graph::duplicate_node))]
    DuplicateNode { node: NodeId },

    /// An edge or mapping references a node that was never declared.
    #[error("edge references undeclared node {node} (from {referenced_from})")]
    #[diagnostic(
        code(stategraph::graph::unknown_node),
        help("Declare the node with add_node before compiling.")
    )]
    UnknownNode {
        node: NodeId,
        referenced_from: NodeId,
    },

    /// No entry was designated.
    #[error("no entry node: set_entry or an edge from Start is required")]
    #[diagnostic(code(stategraph::graph::missing_entry))]
    MissingEntry,

    /// More than one unconditional edge leaves the node. Fan-out is not
    /// supported by this engine; branching requires a conditional edge.
    #[error("{count} unconditional edges declared from {node}; at most one is allowed")]
    #[diagnostic(
        code(stategraph::graph::ambiguous_edges),
        help("Replace the extra edges with a conditional edge.")
    )]
    AmbiguousEdges { node: NodeId, count: usize },

    /// A node has both an unconditional and a conditional edge.
    #[error("node {node} declares both an unconditional and a conditional edge")]
    #[diagnostic(code(stategraph::graph::conflicting_edges))]
    ConflictingEdges { node: NodeId },

    /// More than one conditional edge was registered for the node.
    #[error("node {node} declares more than one conditional edge")]
    #[diagnostic(code(stategraph::graph::duplicate_router))]
    DuplicateRouter { node: NodeId },

    /// A reachable, non-terminal node has no outgoing path.
    #[error("node {node} is reachable but has no outgoing edge")]
    #[diagnostic(
        code(stategraph::graph::dead_end),
        help("Add an edge to another node or to End.")
    )]
    DeadEnd { node: NodeId },

    /// An edge targets the Start sentinel or leaves the End sentinel.
    #[error("invalid sentinel edge: {from} -> {to}")]
    #[diagnostic(code(stategraph::graph::sentinel_edge))]
    SentinelEdge { from: NodeId, to: NodeId },
}

impl GraphBuilder {
    /// Validate the accumulated definition and produce an immutable
    /// [`CompiledGraph`].
    ///
    /// # Errors
    ///
    /// Any [`GraphValidationError`]: duplicate registrations, undeclared edge
    /// endpoints, missing entry, ambiguous or conflicting edges, or a
    /// reachable dead-end node.
    pub fn compile(self) -> Result<CompiledGraph, GraphValidationError> {
        if let Some(node) = self.duplicate_nodes.first() {
            return Err(GraphValidationError::DuplicateNode { node: node.clone() });
        }
        if let Some(node) = self.duplicate_routers.first() {
            return Err(GraphValidationError::DuplicateRouter { node: node.clone() });
        }

        let declared = |id: &NodeId| -> bool { self.nodes.contains_key(id) };

        // Endpoint checks for every unconditional edge.
        for (from, targets) in &self.edges {
            if from.is_end() {
                return Err(GraphValidationError::SentinelEdge {
                    from: from.clone(),
                    to: targets.first().cloned().unwrap_or(NodeId::End),
                });
            }
            if from.is_named() && !declared(from) {
                return Err(GraphValidationError::UnknownNode {
                    node: from.clone(),
                    referenced_from: from.clone(),
                });
            }
            for to in targets {
                if to.is_start() {
                    return Err(GraphValidationError::SentinelEdge {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
                if to.is_named() && !declared(to) {
                    return Err(GraphValidationError::UnknownNode {
                        node: to.clone(),
                        referenced_from: from.clone(),
                    });
                }
            }
            if targets.len() > 1 {
                return Err(GraphValidationError::AmbiguousEdges {
                    node: from.clone(),
                    count: targets.len(),
                });
            }
            if self.conditional_edges.contains_key(from) {
                return Err(GraphValidationError::ConflictingEdges { node: from.clone() });
            }
        }

        // Conditional edges: source declared, mapping targets declared.
        for (from, edge) in &self.conditional_edges {
            if from.is_end() {
                return Err(GraphValidationError::SentinelEdge {
                    from: from.clone(),
                    to: NodeId::End,
                });
            }
            if from.is_named() && !declared(from) {
                return Err(GraphValidationError::UnknownNode {
                    node: from.clone(),
                    referenced_from: from.clone(),
                });
            }
            if let Some(targets) = edge.known_targets() {
                for to in targets {
                    if to.is_start() {
                        return Err(GraphValidationError::SentinelEdge {
                            from: from.clone(),
                            to: to.clone(),
                        });
                    }
                    if to.is_named() && !declared(to) {
                        return Err(GraphValidationError::UnknownNode {
                            node: to.clone(),
                            referenced_from: from.clone(),
                        });
                    }
                }
            }
        }

        if !self.edges.contains_key(&NodeId::Start)
            && !self.conditional_edges.contains_key(&NodeId::Start)
        {
            return Err(GraphValidationError::MissingEntry);
        }

        self.check_reachable_dead_ends()?;

        let node_count = self.nodes.len();
        let edges: FxHashMap<NodeId, NodeId> = self
            .edges
            .into_iter()
            .filter_map(|(from, mut targets)| targets.pop().map(|to| (from, to)))
            .collect();

        tracing::debug!(
            nodes = node_count,
            edges = edges.len(),
            conditional = self.conditional_edges.len(),
            "graph compiled"
        );

        Ok(CompiledGraph::from_inner(GraphInner {
            schema: self.schema,
            nodes: self.nodes,
            edges,
            conditional_edges: self.conditional_edges,
            config: self.config,
        }))
    }

    /// Walk the statically known transitions from Start; every visited
    /// non-terminal node must have some outgoing path. Nodes reachable only
    /// through an unmapped router are left to run-time validation; declared
    /// but unreachable nodes get a warning, not an error.
    fn check_reachable_dead_ends(&self) -> Result<(), GraphValidationError> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut frontier = vec![NodeId::Start];
        while let Some(current) = frontier.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let unconditional = self.edges.get(&current).into_iter().flatten();
            let conditional: Vec<NodeId> = self
                .conditional_edges
                .get(&current)
                .and_then(|edge| edge.known_targets())
                .map(|targets| targets.into_iter().cloned().collect())
                .unwrap_or_default();
            let mut has_outgoing = false;
            for next in unconditional.cloned().chain(conditional) {
                has_outgoing = true;
                if next.is_named() {
                    frontier.push(next);
                }
            }
            // An unmapped router counts as an outgoing path of unknown shape.
            if self.conditional_edges.contains_key(&current) {
                has_outgoing = true;
            }
            if !has_outgoing && current.is_named() {
                return Err(GraphValidationError::DeadEnd { node: current });
            }
        }
        for node in self.nodes.keys() {
            if !visited.contains(node) && !self.conditional_edges.values().any(|e| {
                // Nodes fed by an unmapped router are reachable in principle.
                e.known_targets().is_none() && visited.contains(e.from())
            }) {
                tracing::warn!(%node, "node is unreachable from Start");
            }
        }
        Ok(())
    }
}
