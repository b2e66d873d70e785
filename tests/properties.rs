//! Property checks for reducers, message trimming, and identifiers.

use proptest::prelude::*;
use serde_json::{Value, json};
use stategraph::message::{Message, trim_messages};
use stategraph::reducers::{Append, MapMerge, Reducer, Replace};
use stategraph::types::NodeId;

fn json_strings() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{0,8}", 0..12)
}

fn to_array(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| json!(s)).collect())
}

proptest! {
    #[test]
    fn append_is_concatenation(a in json_strings(), b in json_strings()) {
        let merged = Append.apply(to_array(&a), to_array(&b)).unwrap();
        let mut expected = a.clone();
        expected.extend(b.clone());
        prop_assert_eq!(merged, to_array(&expected));
    }

    #[test]
    fn append_never_shrinks(a in json_strings(), b in json_strings()) {
        let merged = Append.apply(to_array(&a), to_array(&b)).unwrap();
        prop_assert_eq!(merged.as_array().unwrap().len(), a.len() + b.len());
    }

    #[test]
    fn replace_ignores_current(current in "[a-z]{0,8}", update in "[a-z]{0,8}") {
        let merged = Replace.apply(json!(current), json!(update.clone())).unwrap();
        prop_assert_eq!(merged, json!(update));
    }

    #[test]
    fn map_merge_prefers_update_keys(
        shared in prop::collection::hash_map("[a-z]{1,4}", 0u32..100, 0..6),
        update_only in prop::collection::hash_map("[A-Z]{1,4}", 0u32..100, 0..6),
    ) {
        let current: Value = json!(shared);
        let mut update_map = shared.clone();
        for v in update_map.values_mut() {
            *v += 1000;
        }
        update_map.extend(update_only.clone());
        let merged = MapMerge.apply(current, json!(update_map.clone())).unwrap();
        prop_assert_eq!(merged, json!(update_map));
    }

    #[test]
    fn trim_bounds_length(contents in json_strings(), keep in 0usize..16) {
        let log: Vec<Message> = contents.iter().map(Message::user).collect();
        let trimmed = trim_messages(&log, keep);
        prop_assert!(trimmed.len() <= keep);
        // The kept messages are the most recent ones, order preserved.
        let expected: Vec<Message> = log[log.len().saturating_sub(keep)..].to_vec();
        prop_assert_eq!(trimmed, expected);
    }

    #[test]
    fn trim_always_keeps_a_leading_system_message(
        contents in json_strings(), keep in 0usize..16,
    ) {
        let mut log = vec![Message::system("rules")];
        log.extend(contents.iter().map(Message::user));
        let trimmed = trim_messages(&log, keep);
        prop_assert_eq!(&trimmed[0], &log[0]);
        prop_assert!(trimmed.len() <= keep + 1);
    }

    #[test]
    fn node_id_encoding_round_trips(name in "[a-zA-Z0-9_]{1,16}") {
        let id = NodeId::named(name);
        prop_assert_eq!(NodeId::decode(&id.encode()), id);
    }
}

#[test]
fn sentinel_encodings_round_trip() {
    assert_eq!(NodeId::decode(&NodeId::Start.encode()), NodeId::Start);
    assert_eq!(NodeId::decode(&NodeId::End.encode()), NodeId::End);
    // A node literally named "Start" stays distinguishable once encoded.
    let tricky = NodeId::named("Start");
    assert_eq!(NodeId::decode(&tricky.encode()), tricky);
}
