//! Core identifiers for the stategraph engine.
//!
//! [`NodeId`] names the vertices of a workflow graph. `Start` and `End` are
//! virtual sentinels: they are never registered or executed, they only anchor
//! the topology. Every executable node is `Named`.
//!
//! # Examples
//!
//! ```rust
//! use stategraph::types::NodeId;
//!
//! let chat = NodeId::named("chat");
//! assert_eq!(chat.encode(), "Named:chat");
//! assert_eq!(NodeId::decode("Named:chat"), chat);
//!
//! // String literals coerce where a NodeId is expected.
//! assert_eq!(NodeId::from("End"), NodeId::End);
//! assert_eq!(NodeId::from("chat"), chat);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a vertex in a workflow graph.
///
/// `Start` and `End` are structural sentinels. A run begins with the scheduler
/// positioned at `Start` and terminates when a transition resolves to `End`.
/// Neither may be registered as an executable node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// Virtual entry sentinel; the first transition of every run leaves it.
    Start,
    /// Virtual terminal sentinel; reaching it ends the run.
    End,
    /// An executable node registered with [`GraphBuilder::add_node`](crate::graph::GraphBuilder::add_node).
    Named(String),
}

impl NodeId {
    /// Convenience constructor for a named node.
    pub fn named(name: impl Into<String>) -> Self {
        NodeId::Named(name.into())
    }

    /// Encode into the persisted string form.
    ///
    /// - `Start` → `"Start"`
    /// - `End` → `"End"`
    /// - `Named("x")` → `"Named:x"`
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeId::Start => "Start".to_string(),
            NodeId::End => "End".to_string(),
            NodeId::Named(s) => format!("Named:{s}"),
        }
    }

    /// Decode a persisted string form.
    ///
    /// Unrecognized encodings fall back to `Named(s)` so older snapshots keep
    /// round-tripping.
    pub fn decode(s: &str) -> Self {
        if s == "Start" {
            NodeId::Start
        } else if s == "End" {
            NodeId::End
        } else if let Some(rest) = s.strip_prefix("Named:") {
            NodeId::Named(rest.to_string())
        } else {
            NodeId::Named(s.to_string())
        }
    }

    /// Returns `true` for the `Start` sentinel.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` for the `End` sentinel.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` for an executable (named) node.
    #[must_use]
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

// Router keys and builder calls read better with bare literals; "Start"/"End"
// are reserved and resolve to the sentinels.
impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeId::Start,
            "End" => NodeId::End,
            other => NodeId::Named(other.to_string()),
        }
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId::from(s.as_str())
    }
}
