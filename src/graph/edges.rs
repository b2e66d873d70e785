//! Conditional edge types and router functions.
//!
//! A conditional edge resolves the next node at run time by invoking a
//! [`RouterFn`] against the current state snapshot. The router returns a key;
//! with a mapping attached the key is translated to a declared node (or the
//! terminal sentinel), otherwise the key is used directly as the target name.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::NodeId;

/// Routing function for conditional edges.
///
/// Evaluated against the state as merged after the source node executed. The
/// returned key must name a declared node, a mapping entry, or `"End"`.
///
/// # Examples
///
/// ```rust
/// use stategraph::graph::RouterFn;
/// use std::sync::Arc;
///
/// // Stop after the conversation grows past six messages.
/// let continue_or_stop: RouterFn = Arc::new(|snapshot| {
///     if snapshot.seq_len("messages") > 6 {
///         "End".to_string()
///     } else {
///         "reflect".to_string()
///     }
/// });
/// ```
pub type RouterFn = Arc<dyn Fn(&StateSnapshot) -> String + Send + Sync + 'static>;

/// A state-dependent transition out of one node.
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeId,
    router: RouterFn,
    mapping: Option<FxHashMap<String, NodeId>>,
}

impl ConditionalEdge {
    /// Edge whose router keys are used directly as target names.
    pub fn new(from: impl Into<NodeId>, router: RouterFn) -> Self {
        Self {
            from: from.into(),
            router,
            mapping: None,
        }
    }

    /// Edge whose router keys are translated through `mapping` first.
    pub fn with_mapping(
        from: impl Into<NodeId>,
        router: RouterFn,
        mapping: FxHashMap<String, NodeId>,
    ) -> Self {
        Self {
            from: from.into(),
            router,
            mapping: Some(mapping),
        }
    }

    /// Source node of this edge.
    #[must_use]
    pub fn from(&self) -> &NodeId {
        &self.from
    }

    /// Declared mapping targets, when a mapping is attached.
    ///
    /// Used by compile-time validation and reachability; an edge without a
    /// mapping has statically unknown targets and is validated at run time.
    #[must_use]
    pub fn known_targets(&self) -> Option<Vec<&NodeId>> {
        self.mapping.as_ref().map(|m| m.values().collect())
    }

    pub(crate) fn mapping(&self) -> Option<&FxHashMap<String, NodeId>> {
        self.mapping.as_ref()
    }

    /// Invoke the router and translate its key.
    ///
    /// Returns the raw key (for error reporting) and the resolved target;
    /// `None` means the key missed the mapping entirely.
    pub(crate) fn route(&self, snapshot: &StateSnapshot) -> (String, Option<NodeId>) {
        let key = (self.router)(snapshot);
        let target = match &self.mapping {
            Some(mapping) => mapping.get(&key).cloned(),
            None => Some(NodeId::from(key.as_str())),
        };
        (key, target)
    }
}

impl fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .field("mapping", &self.mapping)
            .finish_non_exhaustive()
    }
}
