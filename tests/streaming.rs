//! Lazy execution through the per-step delta stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::{StreamExt, TryStreamExt};
use stategraph::channels::StateSchema;
use stategraph::graph::GraphBuilder;
use stategraph::message::Message;
use stategraph::node::{FnNode, Node, NodeError};
use stategraph::runtime::RunError;
use stategraph::state::StateUpdate;
use stategraph::types::NodeId;

fn say(text: &'static str) -> impl Node + 'static {
    FnNode::new(move |_snapshot, _ctx| async move {
        Ok(StateUpdate::new().with_messages(vec![Message::assistant(text)]))
    })
}

fn counting(counter: Arc<AtomicUsize>) -> impl Node + 'static {
    FnNode::new(move |_snapshot, _ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(StateUpdate::new())
        }
    })
}

#[tokio::test]
async fn stream_yields_one_delta_per_node() {
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("first", say("one"))
        .add_node("second", say("two"))
        .set_entry("first")
        .add_edge("first", "second")
        .add_edge("second", "End")
        .compile()
        .unwrap();

    let deltas: Vec<_> = graph
        .stream(StateUpdate::new())
        .try_collect()
        .await
        .unwrap();
    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas[0].step, 1);
    assert_eq!(deltas[0].node, NodeId::named("first"));
    assert_eq!(deltas[1].step, 2);
    assert_eq!(deltas[1].node, NodeId::named("second"));
    // Deltas carry the node's own update, not the merged state.
    let first_update = deltas[0].update.get("messages").unwrap();
    assert_eq!(first_update.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn dropping_the_stream_stops_scheduling() {
    let counter = Arc::new(AtomicUsize::new(0));
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("tick", counting(counter.clone()))
        .set_entry("tick")
        .add_edge("tick", "tick")
        .compile()
        .unwrap();

    {
        let mut stream = graph.stream(StateUpdate::new());
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.step, 1);
    }
    // The stream owned the run; nothing executes after the drop.
    tokio::task::yield_now().await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn node_failure_surfaces_as_a_stream_item() {
    let boom = FnNode::new(|_snapshot, _ctx| async move {
        Err::<StateUpdate, _>(NodeError::Other("bad".to_string()))
    });
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("ok", say("fine"))
        .add_node("boom", boom)
        .set_entry("ok")
        .add_edge("ok", "boom")
        .add_edge("boom", "End")
        .compile()
        .unwrap();

    let mut stream = graph.stream(StateUpdate::new());
    let first = stream.next().await.unwrap();
    assert!(first.is_ok());
    let second = stream.next().await.unwrap();
    assert!(matches!(second, Err(RunError::NodeRun { step: 2, .. })));
}

#[tokio::test]
async fn budget_exhaustion_surfaces_as_a_stream_item() {
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("a", say("a"))
        .set_entry("a")
        .add_edge("a", "a")
        .compile()
        .unwrap();

    let options = stategraph::runtime::RunOptions::new().with_step_budget(2);
    let mut stream = graph.stream_with(StateUpdate::new(), options);
    assert!(stream.next().await.unwrap().is_ok());
    assert!(stream.next().await.unwrap().is_ok());
    let third = stream.next().await.unwrap();
    assert!(matches!(third, Err(RunError::StepBudgetExceeded { budget: 2 })));
}

#[tokio::test]
async fn a_fresh_stream_reruns_from_scratch() {
    let counter = Arc::new(AtomicUsize::new(0));
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("tick", counting(counter.clone()))
        .set_entry("tick")
        .add_edge("tick", "End")
        .compile()
        .unwrap();

    let _: Vec<_> = graph.stream(StateUpdate::new()).try_collect().await.unwrap();
    let _: Vec<_> = graph.stream(StateUpdate::new()).try_collect().await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}
