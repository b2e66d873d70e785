//! Run-time state container.
//!
//! [`RunState`] maps channel names to JSON values. One instance exists per
//! in-flight run; only the scheduler mutates it, and every mutation goes
//! through the channel reducers declared in the [`StateSchema`]. Nodes see an
//! owned [`StateSnapshot`] and hand back a [`StateUpdate`] naming just the
//! channels they changed.
//!
//! # Examples
//!
//! ```rust
//! use stategraph::channels::StateSchema;
//! use stategraph::state::{RunState, StateUpdate};
//! use serde_json::json;
//!
//! let schema = StateSchema::messages();
//! let mut state = RunState::fresh(&schema);
//!
//! let update = StateUpdate::new().set("messages", json!(["hi"]));
//! state.apply(&schema, &update).unwrap();
//! assert_eq!(state.get("messages"), Some(&json!(["hi"])));
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channels::{MESSAGES, StateSchema};
use crate::message::{Message, messages_from_value};
use crate::reducers::ReducerError;

/// Mutable state of one run: channel name → current value.
///
/// Owned exclusively by the run that created it; concurrent runs never share
/// a `RunState`. Cross-invocation sharing goes through checkpoints only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    values: FxHashMap<String, Value>,
}

impl RunState {
    /// Seed a fresh state from the schema defaults. Each default producer
    /// runs exactly once here.
    #[must_use]
    pub fn fresh(schema: &StateSchema) -> Self {
        Self {
            values: schema.defaults(),
        }
    }

    /// Rebuild state from persisted channel values, filling any channel the
    /// snapshot predates with its schema default.
    #[must_use]
    pub fn from_values(schema: &StateSchema, mut values: FxHashMap<String, Value>) -> Self {
        for name in schema.names() {
            if !values.contains_key(name) {
                if let Some(spec) = schema.channel(name) {
                    values.insert(name.to_string(), spec.default_value());
                }
            }
        }
        Self { values }
    }

    /// Current value of a channel.
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&Value> {
        self.values.get(channel)
    }

    /// All channel values.
    #[must_use]
    pub fn values(&self) -> &FxHashMap<String, Value> {
        &self.values
    }

    /// Consume into the raw channel map (used by checkpointing).
    #[must_use]
    pub fn into_values(self) -> FxHashMap<String, Value> {
        self.values
    }

    /// Decode the conventional [`MESSAGES`] channel.
    pub fn messages(&self) -> Result<Vec<Message>, serde_json::Error> {
        match self.values.get(MESSAGES) {
            Some(value) => messages_from_value(value),
            None => Ok(Vec::new()),
        }
    }

    /// Owned snapshot handed to nodes and routers.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            values: self.values.clone(),
        }
    }

    /// Merge a partial update through the schema's reducers.
    ///
    /// For each channel present in the update the new value is
    /// `reducer(current ?? default, update)`; channels absent from the update
    /// are untouched. Naming an undeclared channel fails the merge.
    pub fn apply(&mut self, schema: &StateSchema, update: &StateUpdate) -> Result<(), ReducerError> {
        for (name, incoming) in update.iter() {
            let spec = schema
                .channel(name)
                .ok_or_else(|| ReducerError::UnknownChannel(name.to_string()))?;
            let current = self
                .values
                .remove(name)
                .unwrap_or_else(|| spec.default_value());
            let merged = spec.reduce(current, incoming.clone())?;
            self.values.insert(name.to_string(), merged);
        }
        Ok(())
    }
}

/// Read-only view of run state at a point in time.
///
/// Snapshots are cloned data: nodes may hold them across awaits without
/// observing later merges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateSnapshot {
    values: FxHashMap<String, Value>,
}

impl StateSnapshot {
    /// Value of a channel at snapshot time.
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&Value> {
        self.values.get(channel)
    }

    /// All channel values at snapshot time.
    #[must_use]
    pub fn values(&self) -> &FxHashMap<String, Value> {
        &self.values
    }

    /// Length of an array-valued channel, `0` when absent or not an array.
    #[must_use]
    pub fn seq_len(&self, channel: &str) -> usize {
        self.values
            .get(channel)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Decode the conventional [`MESSAGES`] channel.
    pub fn messages(&self) -> Result<Vec<Message>, serde_json::Error> {
        match self.values.get(MESSAGES) {
            Some(value) => messages_from_value(value),
            None => Ok(Vec::new()),
        }
    }
}

/// Partial state produced by one node execution: the subset of channels with
/// new values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    channels: FxHashMap<String, Value>,
}

impl StateUpdate {
    /// An empty update (touches nothing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style channel assignment.
    #[must_use]
    pub fn set(mut self, channel: impl Into<String>, value: Value) -> Self {
        self.channels.insert(channel.into(), value);
        self
    }

    /// Assign the [`MESSAGES`] channel from typed messages.
    #[must_use]
    pub fn with_messages(self, messages: Vec<Message>) -> Self {
        self.set(MESSAGES, crate::message::messages_to_value(&messages))
    }

    /// Returns `true` if the update touches no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Value assigned to a channel, if any.
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&Value> {
        self.channels.get(channel)
    }

    /// Iterate the touched channels.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for StateUpdate {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            channels: iter.into_iter().collect(),
        }
    }
}
