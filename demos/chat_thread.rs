//! Resumable chat thread: two invocations and a streamed one, all sharing a
//! checkpointed conversation.
//!
//! ```sh
//! cargo run --example chat_thread
//! ```

use std::sync::Arc;

use futures_util::StreamExt;
use miette::IntoDiagnostic;
use stategraph::channels::StateSchema;
use stategraph::graph::GraphBuilder;
use stategraph::message::Message;
use stategraph::node::FnNode;
use stategraph::runtime::{InMemoryCheckpointer, RunConfig, RunOptions};
use stategraph::state::StateUpdate;

#[tokio::main]
async fn main() -> miette::Result<()> {
    stategraph::telemetry::init();

    let echo = FnNode::new(|snapshot: stategraph::state::StateSnapshot, _ctx| async move {
        let turns = snapshot.seq_len("messages");
        Ok(StateUpdate::new()
            .with_messages(vec![Message::assistant(format!("reply #{turns}"))]))
    });

    let checkpointer = Arc::new(InMemoryCheckpointer::new());
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("echo", echo)
        .set_entry("echo")
        .add_edge("echo", "End")
        .with_config(RunConfig::default().with_checkpointer(checkpointer))
        .compile()?;

    let thread = || RunOptions::new().with_thread_id("demo-thread");

    let state = graph
        .invoke_with(
            StateUpdate::new().with_messages(vec![Message::user("hello")]),
            thread(),
        )
        .await?;
    println!("after first turn: {} messages", state.messages().into_diagnostic()?.len());

    let state = graph
        .invoke_with(
            StateUpdate::new().with_messages(vec![Message::user("tell me more")]),
            thread(),
        )
        .await?;
    println!("after second turn: {} messages", state.messages().into_diagnostic()?.len());

    // Third turn, streamed this time. Same thread, same history.
    let mut stream = graph.stream_with(
        StateUpdate::new().with_messages(vec![Message::user("one more")]),
        thread(),
    );
    while let Some(delta) = stream.next().await {
        let delta = delta?;
        println!("step {} ran node {}", delta.step, delta.node);
    }

    Ok(())
}
