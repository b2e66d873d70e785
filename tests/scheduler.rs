//! End-to-end runs through the sequential scheduler.

use serde_json::json;
use stategraph::channels::StateSchema;
use stategraph::graph::GraphBuilder;
use stategraph::message::Message;
use stategraph::node::{FnNode, Node, NodeError};
use stategraph::runtime::{RunConfig, RunError, RunOptions};
use stategraph::state::StateUpdate;
use stategraph::types::NodeId;

fn say(text: &'static str) -> impl Node + 'static {
    FnNode::new(move |_snapshot, _ctx| async move {
        Ok(StateUpdate::new().with_messages(vec![Message::assistant(text)]))
    })
}

#[tokio::test]
async fn linear_chat_appends_in_order() {
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("chat", say("ack"))
        .set_entry("chat")
        .add_edge("chat", "End")
        .compile()
        .unwrap();

    let input = StateUpdate::new().with_messages(vec![Message::user("hi")]);
    let state = graph.invoke(input).await.unwrap();
    let messages = state.messages().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], Message::user("hi"));
    assert_eq!(messages[1], Message::assistant("ack"));
}

#[tokio::test]
async fn empty_input_runs_from_defaults() {
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("chat", say("hello"))
        .set_entry("chat")
        .add_edge("chat", "End")
        .compile()
        .unwrap();

    let state = graph.invoke(StateUpdate::new()).await.unwrap();
    assert_eq!(state.messages().unwrap().len(), 1);
}

#[tokio::test]
async fn reflection_loop_terminates_by_router() {
    // draft and critique alternate until the conversation outgrows six
    // messages; with one seed message that is three round trips.
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("draft", say("draft"))
        .add_node("critique", say("critique"))
        .set_entry("draft")
        .add_edge("draft", "critique")
        .add_conditional_edges("critique", |snapshot| {
            if snapshot.seq_len("messages") > 6 {
                "End".to_string()
            } else {
                "draft".to_string()
            }
        })
        .compile()
        .unwrap();

    let input = StateUpdate::new().with_messages(vec![Message::user("topic")]);
    let state = graph.invoke(input).await.unwrap();
    let messages = state.messages().unwrap();
    assert_eq!(messages.len(), 7);
    let drafts = messages.iter().filter(|m| m.content == "draft").count();
    let critiques = messages.iter().filter(|m| m.content == "critique").count();
    assert_eq!(drafts, 3);
    assert_eq!(critiques, 3);
}

#[tokio::test]
async fn router_key_outside_mapping_fails_the_run() {
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("a", say("a"))
        .add_node("b", say("b"))
        .set_entry("a")
        .add_conditional_edges_with("a", |_| "sideways".to_string(), [("forward", "b")])
        .add_edge("b", "End")
        .compile()
        .unwrap();

    let err = graph.invoke(StateUpdate::new()).await.unwrap_err();
    match err {
        RunError::InvalidRoute { from, key, step } => {
            assert_eq!(from, NodeId::named("a"));
            assert_eq!(key, "sideways");
            assert_eq!(step, 2);
        }
        other => panic!("expected InvalidRoute, got {other:?}"),
    }
}

#[tokio::test]
async fn unmapped_router_naming_unknown_node_fails_the_run() {
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("a", say("a"))
        .set_entry("a")
        .add_conditional_edges("a", |_| "nowhere".to_string())
        .compile()
        .unwrap();

    let err = graph.invoke(StateUpdate::new()).await.unwrap_err();
    assert!(matches!(err, RunError::InvalidRoute { key, .. } if key == "nowhere"));
}

#[tokio::test]
async fn router_reaching_a_node_without_exit_dangles_at_run_time() {
    // "b" is only reachable through an unmapped router, so its missing exit
    // passes compilation and must fail the run instead.
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("a", say("a"))
        .add_node("b", say("b"))
        .set_entry("a")
        .add_conditional_edges("a", |_| "b".to_string())
        .compile()
        .unwrap();

    let err = graph.invoke(StateUpdate::new()).await.unwrap_err();
    match err {
        RunError::DanglingNode { node, step } => {
            assert_eq!(node, NodeId::named("b"));
            assert_eq!(step, 3);
        }
        other => panic!("expected DanglingNode, got {other:?}"),
    }
}

#[tokio::test]
async fn step_budget_stops_a_cycle() {
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("a", say("a"))
        .add_node("b", say("b"))
        .set_entry("a")
        .add_edge("a", "b")
        .add_edge("b", "a")
        .compile()
        .unwrap();

    let options = RunOptions::new().with_step_budget(5);
    let err = graph.invoke_with(StateUpdate::new(), options).await.unwrap_err();
    assert!(matches!(err, RunError::StepBudgetExceeded { budget: 5 }));
}

#[tokio::test]
async fn graph_level_budget_applies_without_options() {
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("a", say("a"))
        .set_entry("a")
        .add_edge("a", "a")
        .with_config(RunConfig::default().with_step_budget(3))
        .compile()
        .unwrap();

    let err = graph.invoke(StateUpdate::new()).await.unwrap_err();
    assert!(matches!(err, RunError::StepBudgetExceeded { budget: 3 }));
}

#[tokio::test]
async fn node_failure_is_wrapped_with_node_and_step() {
    let boom = FnNode::new(|_snapshot, _ctx| async move {
        Err::<StateUpdate, _>(NodeError::Other("backend unavailable".to_string()))
    });
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("ok", say("fine"))
        .add_node("boom", boom)
        .set_entry("ok")
        .add_edge("ok", "boom")
        .add_edge("boom", "End")
        .compile()
        .unwrap();

    let err = graph.invoke(StateUpdate::new()).await.unwrap_err();
    match err {
        RunError::NodeRun { node, step, source } => {
            assert_eq!(node, NodeId::named("boom"));
            assert_eq!(step, 2);
            assert!(matches!(source, NodeError::Other(_)));
        }
        other => panic!("expected NodeRun, got {other:?}"),
    }
}

#[tokio::test]
async fn node_context_reports_identity_and_step() {
    let probe = FnNode::new(|_snapshot, ctx| async move {
        Ok(StateUpdate::new().set(
            "seen",
            json!({ "node": ctx.node.to_string(), "step": ctx.step }),
        ))
    });
    let schema = StateSchema::builder()
        .append_channel("messages")
        .replace_channel("seen")
        .build();
    let graph = GraphBuilder::new(schema)
        .add_node("probe", probe)
        .set_entry("probe")
        .add_edge("probe", "End")
        .compile()
        .unwrap();

    let state = graph.invoke(StateUpdate::new()).await.unwrap();
    assert_eq!(state.get("seen"), Some(&json!({ "node": "probe", "step": 1 })));
}

#[tokio::test]
async fn update_to_undeclared_channel_fails_the_merge() {
    let rogue = FnNode::new(|_snapshot, _ctx| async move {
        Ok(StateUpdate::new().set("undeclared", json!(1)))
    });
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("rogue", rogue)
        .set_entry("rogue")
        .add_edge("rogue", "End")
        .compile()
        .unwrap();

    let err = graph.invoke(StateUpdate::new()).await.unwrap_err();
    assert!(matches!(err, RunError::Reducer(_)));
}

#[tokio::test]
async fn routers_see_state_merged_after_the_source_node() {
    // The router must observe the message the node just appended.
    let graph = GraphBuilder::new(StateSchema::messages())
        .add_node("emit", say("emitted"))
        .add_node("after", say("after"))
        .set_entry("emit")
        .add_conditional_edges("emit", |snapshot| {
            if snapshot.seq_len("messages") == 1 {
                "after".to_string()
            } else {
                "End".to_string()
            }
        })
        .add_edge("after", "End")
        .compile()
        .unwrap();

    let state = graph.invoke(StateUpdate::new()).await.unwrap();
    let messages = state.messages().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "after");
}
