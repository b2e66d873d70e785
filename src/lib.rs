//! Stategraph: a sequential graph execution engine for agentic workflows.
//!
//! Workflows are directed graphs of async [`Node`](node::Node)s that
//! communicate only through a shared state container of named channels. A
//! [`GraphBuilder`](graph::GraphBuilder) accumulates nodes and edges against
//! a [`StateSchema`](channels::StateSchema), validates the topology, and
//! freezes it into an immutable [`CompiledGraph`](graph::CompiledGraph).
//! Running a compiled graph walks it strictly sequentially: one node at a
//! time, each update merged through the channel reducers, each transition
//! resolved by an unconditional edge or a state-inspecting router.
//!
//! Runs either complete eagerly ([`invoke`](graph::CompiledGraph::invoke)) or
//! lazily as a stream of per-step deltas
//! ([`stream`](graph::CompiledGraph::stream)). A step budget bounds every
//! run, so a miswired cycle fails loudly instead of spinning. Conversations
//! persist across invocations by attaching a
//! [`Checkpointer`](runtime::Checkpointer) and scoping runs to a thread id.
//!
//! # Examples
//!
//! ```rust
//! use stategraph::channels::StateSchema;
//! use stategraph::graph::GraphBuilder;
//! use stategraph::message::Message;
//! use stategraph::node::FnNode;
//! use stategraph::state::StateUpdate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = GraphBuilder::new(StateSchema::messages())
//!     .add_node(
//!         "chat",
//!         FnNode::new(|_snapshot, _ctx| async move {
//!             Ok(StateUpdate::new().with_messages(vec![Message::assistant("ack")]))
//!         }),
//!     )
//!     .set_entry("chat")
//!     .add_edge("chat", "End")
//!     .compile()?;
//!
//! let input = StateUpdate::new().with_messages(vec![Message::user("hi")]);
//! let state = graph.invoke(input).await?;
//! let messages = state.messages()?;
//! assert_eq!(messages.len(), 2);
//! assert_eq!(messages[1].content, "ack");
//! # Ok(())
//! # }
//! ```

pub mod channels;
pub mod graph;
pub mod message;
pub mod node;
pub mod reducers;
pub mod runtime;
pub mod state;
pub mod telemetry;
pub mod types;
