//! Channel declarations and the state schema.
//!
//! A [`ChannelSpec`] names one slot of shared state and binds it to a default
//! producer and a merge policy ([`Reducer`]). The [`StateSchema`] is the
//! immutable registry of channel specs a graph is compiled against: fresh run
//! state is seeded from the defaults, and every node update flows through the
//! declared reducers.
//!
//! # Examples
//!
//! ```rust
//! use stategraph::channels::StateSchema;
//! use serde_json::json;
//!
//! // The common conversational shape: an append-only "messages" log.
//! let schema = StateSchema::messages();
//! assert!(schema.contains("messages"));
//!
//! // Custom shape with a scratch map and a counter.
//! let schema = StateSchema::builder()
//!     .append_channel("messages")
//!     .merge_channel("scratch")
//!     .replace_channel_with_default("attempts", || json!(0))
//!     .build();
//! assert_eq!(schema.len(), 3);
//! ```

use rustc_hash::FxHashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::reducers::{Append, MapMerge, Reducer, ReducerError, Replace};

/// Name of the conventional conversation channel.
pub const MESSAGES: &str = "messages";

type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Declaration of a single named state slot.
///
/// The default producer runs once per fresh state container; the reducer
/// governs every subsequent merge into the slot.
#[derive(Clone)]
pub struct ChannelSpec {
    name: String,
    default: DefaultFn,
    reducer: Arc<dyn Reducer>,
}

impl ChannelSpec {
    /// Declare a channel with an explicit default producer and reducer.
    pub fn new(
        name: impl Into<String>,
        default: impl Fn() -> Value + Send + Sync + 'static,
        reducer: Arc<dyn Reducer>,
    ) -> Self {
        Self {
            name: name.into(),
            default: Arc::new(default),
            reducer,
        }
    }

    /// Channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produce the channel's initial value.
    #[must_use]
    pub fn default_value(&self) -> Value {
        (self.default)()
    }

    /// Merge `update` into `current` with this channel's reducer.
    pub fn reduce(&self, current: Value, update: Value) -> Result<Value, ReducerError> {
        self.reducer.apply(current, update)
    }
}

impl fmt::Debug for ChannelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Immutable registry of channel declarations for one graph.
#[derive(Clone, Debug, Default)]
pub struct StateSchema {
    channels: FxHashMap<String, ChannelSpec>,
}

impl StateSchema {
    /// Start declaring channels.
    #[must_use]
    pub fn builder() -> StateSchemaBuilder {
        StateSchemaBuilder::default()
    }

    /// Schema with a single append-only [`MESSAGES`] channel, the shape used
    /// by chat, reflection, and supervisor graphs.
    #[must_use]
    pub fn messages() -> Self {
        Self::builder().append_channel(MESSAGES).build()
    }

    /// Look up a channel declaration.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&ChannelSpec> {
        self.channels.get(name)
    }

    /// Returns `true` if `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Number of declared channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if no channels are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channel names in sorted order, for deterministic iteration.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.channels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Seed a fresh value map from the channel defaults.
    #[must_use]
    pub fn defaults(&self) -> FxHashMap<String, Value> {
        self.channels
            .iter()
            .map(|(name, spec)| (name.clone(), spec.default_value()))
            .collect()
    }
}

/// Fluent builder for a [`StateSchema`].
#[derive(Default)]
pub struct StateSchemaBuilder {
    channels: FxHashMap<String, ChannelSpec>,
}

impl StateSchemaBuilder {
    /// Declare a fully custom channel.
    #[must_use]
    pub fn channel(mut self, spec: ChannelSpec) -> Self {
        self.channels.insert(spec.name().to_string(), spec);
        self
    }

    /// Append-only array channel, defaulting to `[]`.
    #[must_use]
    pub fn append_channel(self, name: impl Into<String>) -> Self {
        self.channel(ChannelSpec::new(
            name,
            || Value::Array(Vec::new()),
            Arc::new(Append),
        ))
    }

    /// Last-write-wins channel, defaulting to `null`.
    #[must_use]
    pub fn replace_channel(self, name: impl Into<String>) -> Self {
        self.channel(ChannelSpec::new(name, || Value::Null, Arc::new(Replace)))
    }

    /// Last-write-wins channel with an explicit default.
    #[must_use]
    pub fn replace_channel_with_default(
        self,
        name: impl Into<String>,
        default: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        self.channel(ChannelSpec::new(name, default, Arc::new(Replace)))
    }

    /// Shallow-merged JSON object channel, defaulting to `{}`.
    #[must_use]
    pub fn merge_channel(self, name: impl Into<String>) -> Self {
        self.channel(ChannelSpec::new(
            name,
            || Value::Object(serde_json::Map::new()),
            Arc::new(MapMerge),
        ))
    }

    /// Finish the declaration.
    #[must_use]
    pub fn build(self) -> StateSchema {
        StateSchema {
            channels: self.channels,
        }
    }
}
