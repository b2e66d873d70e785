//! Bounded draft/critique loop: the router ends the run once the
//! conversation reaches a target length.
//!
//! ```sh
//! cargo run --example reflection
//! ```

use miette::IntoDiagnostic;
use stategraph::channels::StateSchema;
use stategraph::graph::GraphBuilder;
use stategraph::message::Message;
use stategraph::node::FnNode;
use stategraph::state::StateUpdate;

#[tokio::main]
async fn main() -> miette::Result<()> {
    stategraph::telemetry::init();

    let draft = FnNode::new(|_snapshot, ctx: stategraph::node::NodeContext| async move {
        Ok(StateUpdate::new()
            .with_messages(vec![Message::assistant(format!("draft at step {}", ctx.step))]))
    });
    let critique = FnNode::new(|_snapshot, _ctx| async move {
        Ok(StateUpdate::new().with_messages(vec![Message::assistant("needs work")]))
    });

    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("draft", draft)
        .add_node("critique", critique)
        .set_entry("draft")
        .add_edge("draft", "critique")
        .add_conditional_edges("critique", |snapshot| {
            if snapshot.seq_len("messages") > 6 {
                "End".to_string()
            } else {
                "draft".to_string()
            }
        })
        .compile()?;

    println!("{}", graph.to_mermaid());

    let input = StateUpdate::new().with_messages(vec![Message::user("write me a limerick")]);
    let state = graph.invoke(input).await?;
    for message in state.messages().into_diagnostic()? {
        println!("[{}] {}", message.role, message.content);
    }
    Ok(())
}
