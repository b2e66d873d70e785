//! Merge policies for state channels.
//!
//! A [`Reducer`] combines a channel's current value with a node's partial
//! update and yields the new value. Reducers are pure: they never touch
//! anything but their two inputs, so merge semantics stay explicit and
//! testable.
//!
//! Built-in policies:
//!
//! - [`Append`]: concatenate arrays, order preserved, no deduplication.
//!   This is the conversational-history policy: within one run the channel
//!   only grows.
//! - [`Replace`]: last write wins.
//! - [`MapMerge`]: shallow JSON object merge, update keys override.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

/// Merge policy applied when a node's update names a channel.
///
/// Implementations must be pure and total over the value shapes they declare;
/// a shape mismatch is reported as [`ReducerError::Apply`] and aborts the run.
pub trait Reducer: Send + Sync {
    /// Combine `current` with `update`, returning the channel's new value.
    fn apply(&self, current: Value, update: Value) -> Result<Value, ReducerError>;
}

/// Failure while merging a node's partial update into state.
#[derive(Debug, Error, Diagnostic)]
pub enum ReducerError {
    /// The update named a channel the schema never declared.
    #[error("no channel declared with name: {0}")]
    #[diagnostic(
        code(stategraph::reducers::unknown_channel),
        help("Declare the channel on the StateSchema before nodes write to it.")
    )]
    UnknownChannel(String),

    /// The reducer rejected the value shapes it was given.
    #[error("reducer apply failed for channel {channel}: {message}")]
    #[diagnostic(code(stategraph::reducers::apply))]
    Apply { channel: String, message: String },
}

impl ReducerError {
    pub(crate) fn apply(channel: impl Into<String>, message: impl Into<String>) -> Self {
        ReducerError::Apply {
            channel: channel.into(),
            message: message.into(),
        }
    }
}

/// Append-only sequence merge: `current ++ update`, both JSON arrays.
///
/// Never deduplicates and never reorders. A single non-array update value is
/// treated as a one-element append so nodes can return a bare item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Append;

impl Reducer for Append {
    fn apply(&self, current: Value, update: Value) -> Result<Value, ReducerError> {
        let mut items = match current {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(ReducerError::apply(
                    "append",
                    format!("existing value is not an array: {other}"),
                ));
            }
        };
        match update {
            Value::Array(new_items) => items.extend(new_items),
            single => items.push(single),
        }
        Ok(Value::Array(items))
    }
}

/// Last-write-wins merge: the update replaces the current value outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Replace;

impl Reducer for Replace {
    fn apply(&self, _current: Value, update: Value) -> Result<Value, ReducerError> {
        Ok(update)
    }
}

/// Shallow JSON object merge; keys present in the update override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapMerge;

impl Reducer for MapMerge {
    fn apply(&self, current: Value, update: Value) -> Result<Value, ReducerError> {
        let mut map = match current {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(ReducerError::apply(
                    "map_merge",
                    format!("existing value is not an object: {other}"),
                ));
            }
        };
        match update {
            Value::Object(new_entries) => {
                for (key, value) in new_entries {
                    map.insert(key, value);
                }
            }
            other => {
                return Err(ReducerError::apply(
                    "map_merge",
                    format!("update is not an object: {other}"),
                ));
            }
        }
        Ok(Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_concatenates_in_order() {
        let merged = Append
            .apply(json!(["a", "b"]), json!(["b", "c"]))
            .unwrap();
        assert_eq!(merged, json!(["a", "b", "b", "c"]));
    }

    #[test]
    fn append_wraps_bare_item() {
        let merged = Append.apply(json!([1]), json!(2)).unwrap();
        assert_eq!(merged, json!([1, 2]));
    }

    #[test]
    fn append_rejects_non_array_current() {
        assert!(Append.apply(json!("x"), json!([1])).is_err());
    }

    #[test]
    fn replace_drops_current() {
        let merged = Replace.apply(json!({"old": true}), json!(7)).unwrap();
        assert_eq!(merged, json!(7));
    }

    #[test]
    fn map_merge_overrides_keys_shallowly() {
        let merged = MapMerge
            .apply(json!({"a": 1, "b": 1}), json!({"b": 2, "c": 3}))
            .unwrap();
        assert_eq!(merged, json!({"a": 1, "b": 2, "c": 3}));
    }
}
