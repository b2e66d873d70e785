//! Checkpoint persistence.
//!
//! A [`Checkpoint`] is the full channel map of a run after one step, keyed by
//! thread id. The scheduler saves one after every successful step of a
//! thread-scoped run, so a failed run still leaves its partial progress
//! behind, and loads the latest one when the same thread id is used again.
//!
//! Concurrent runs on the same thread id are not coordinated: the last save
//! wins. Callers who need stronger guarantees serialize their own access per
//! thread.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Persisted state of one thread after one step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Thread this checkpoint belongs to.
    pub thread_id: String,
    /// Step number the saving run had just completed.
    pub step: u64,
    /// Full channel map at that point.
    pub values: FxHashMap<String, Value>,
    /// Wall-clock save time.
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Stamp a checkpoint with the current time.
    #[must_use]
    pub fn new(thread_id: impl Into<String>, step: u64, values: FxHashMap<String, Value>) -> Self {
        Self {
            thread_id: thread_id.into(),
            step,
            values,
            created_at: Utc::now(),
        }
    }
}

/// Persistence failure while saving or loading a checkpoint.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointError {
    /// Checkpoint payload could not be encoded or decoded.
    #[error("checkpoint serialization failed")]
    #[diagnostic(code(stategraph::checkpoint::serde))]
    Serde(#[from] serde_json::Error),

    /// The backing store rejected the operation.
    #[error("checkpoint storage error: {message}")]
    #[diagnostic(
        code(stategraph::checkpoint::storage),
        help("Check that the backing store is reachable and writable.")
    )]
    Storage { message: String },
}

impl CheckpointError {
    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}

/// Pluggable persistence backend.
///
/// Implementations must tolerate `save` being called once per step; only the
/// latest checkpoint per thread needs to be retrievable.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persist the latest checkpoint for its thread, replacing any prior one.
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError>;

    /// Latest checkpoint for the thread, or `None` for a fresh thread.
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;
}

/// Process-local checkpointer for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    threads: Mutex<FxHashMap<String, Checkpoint>>,
}

impl InMemoryCheckpointer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        tracing::debug!(
            thread_id = %checkpoint.thread_id,
            step = checkpoint.step,
            "saving checkpoint"
        );
        self.threads
            .lock()
            .insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        Ok(self.threads.lock().get(thread_id).cloned())
    }
}
