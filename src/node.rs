//! Node execution primitives.
//!
//! A [`Node`] is one named unit of graph work: it receives an owned
//! [`StateSnapshot`] and returns a [`StateUpdate`] covering just the channels
//! it changed. Nodes are pure with respect to the graph: there is no side
//! channel between nodes, but they may perform external effects (model
//! calls, tool calls). Those effects are not part of the engine's contract
//! and are never retried by it; a node wrapping a slow external call owns its
//! own timeout and must surface [`NodeError`] on expiry so the run fails
//! cleanly instead of hanging.
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use stategraph::message::Message;
//! use stategraph::node::{Node, NodeContext, NodeError};
//! use stategraph::state::{StateSnapshot, StateUpdate};
//!
//! struct Greeter;
//!
//! #[async_trait]
//! impl Node for Greeter {
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         _ctx: NodeContext,
//!     ) -> Result<StateUpdate, NodeError> {
//!         Ok(StateUpdate::new().with_messages(vec![Message::assistant("hello")]))
//!     }
//! }
//! ```
//!
//! Plain async closures work through [`FnNode`], so recipe-style graphs don't
//! need a struct per step:
//!
//! ```rust
//! use stategraph::node::FnNode;
//! use stategraph::state::StateUpdate;
//!
//! let node = FnNode::new(|_snapshot, _ctx| async move { Ok(StateUpdate::new()) });
//! ```

use async_trait::async_trait;
use miette::Diagnostic;
use std::future::Future;
use thiserror::Error;

use crate::state::{StateSnapshot, StateUpdate};
use crate::types::NodeId;

/// Executable unit of graph work.
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute against the current state snapshot.
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext)
    -> Result<StateUpdate, NodeError>;
}

/// Execution metadata passed to each node invocation.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Identifier of the executing node.
    pub node: NodeId,
    /// One-based step number within the current run.
    pub step: u64,
    /// Thread identifier when the run is checkpoint-scoped.
    pub thread_id: Option<String>,
}

/// Adapter turning an async closure into a [`Node`].
///
/// The closure receives the snapshot and context and returns the node's
/// partial update. This is the expected shape for recipe-style graphs where
/// model and tool clients are captured by the closure (explicit dependency
/// injection, no ambient singletons).
pub struct FnNode<F> {
    f: F,
}

impl<F> FnNode<F> {
    /// Wrap an async closure. Bounds here let closure signatures infer at the
    /// call site.
    pub fn new<Fut>(f: F) -> Self
    where
        F: Fn(StateSnapshot, NodeContext) -> Fut + Send + Sync,
        Fut: Future<Output = Result<StateUpdate, NodeError>> + Send,
    {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Node for FnNode<F>
where
    F: Fn(StateSnapshot, NodeContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StateUpdate, NodeError>> + Send,
{
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        (self.f)(snapshot, ctx).await
    }
}

/// Fatal failure inside a node's execution.
///
/// Returning `Err` aborts the run; the scheduler wraps it with the node name
/// and step so callers can tell which part of the graph failed.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data missing from the snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(stategraph::node::missing_input),
        help("Check that an upstream node produced the required channel data.")
    )]
    MissingInput { what: &'static str },

    /// External provider or service failure.
    #[error("provider error ({provider}): {message}")]
    #[diagnostic(code(stategraph::node::provider))]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// The node's own deadline for an external call expired.
    #[error("node timed out after {millis}ms")]
    #[diagnostic(
        code(stategraph::node::timeout),
        help("Timeouts are the node's responsibility; raise the deadline or fix the collaborator.")
    )]
    Timeout { millis: u64 },

    /// JSON (de)serialization failure while reading or building channel data.
    #[error(transparent)]
    #[diagnostic(code(stategraph::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Anything else worth aborting the run for.
    #[error("{0}")]
    #[diagnostic(code(stategraph::node::other))]
    Other(String),
}
