//! Intent routing with a mapped conditional edge.
//!
//! ```sh
//! cargo run --example router
//! ```

use miette::IntoDiagnostic;
use stategraph::channels::StateSchema;
use stategraph::graph::GraphBuilder;
use stategraph::message::Message;
use stategraph::node::FnNode;
use stategraph::state::{StateSnapshot, StateUpdate};

fn classify(snapshot: &StateSnapshot) -> String {
    let Ok(messages) = snapshot.messages() else {
        return "chat".to_string();
    };
    match messages.iter().rev().find(|m| m.has_role(Message::USER)) {
        Some(m) if m.content.contains('?') => "lookup".to_string(),
        _ => "chat".to_string(),
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    stategraph::telemetry::init();

    let intake = FnNode::new(|_snapshot, _ctx| async move { Ok(StateUpdate::new()) });
    let lookup = FnNode::new(|_snapshot, _ctx| async move {
        Ok(StateUpdate::new().with_messages(vec![Message::assistant("looked it up: 42")]))
    });
    let chat = FnNode::new(|_snapshot, _ctx| async move {
        Ok(StateUpdate::new().with_messages(vec![Message::assistant("sounds good!")]))
    });

    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("intake", intake)
        .add_node("lookup", lookup)
        .add_node("chat", chat)
        .set_entry("intake")
        .add_conditional_edges_with(
            "intake",
            classify,
            [("lookup", "lookup"), ("chat", "chat")],
        )
        .add_edge("lookup", "End")
        .add_edge("chat", "End")
        .compile()?;

    for text in ["what is the answer?", "thanks, that helps"] {
        let input = StateUpdate::new().with_messages(vec![Message::user(text)]);
        let state = graph.invoke(input).await?;
        let messages = state.messages().into_diagnostic()?;
        println!("user: {text}");
        println!("  -> {}", messages.last().map(|m| m.content.as_str()).unwrap_or(""));
    }
    Ok(())
}
