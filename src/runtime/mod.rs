//! Run-time machinery: scheduling, configuration, and checkpointing.

pub mod checkpointer;
#[cfg(feature = "sqlite")]
pub mod checkpointer_sqlite;
pub mod config;
pub mod scheduler;

pub use checkpointer::{Checkpoint, CheckpointError, Checkpointer, InMemoryCheckpointer};
#[cfg(feature = "sqlite")]
pub use checkpointer_sqlite::SqliteCheckpointer;
pub use config::{DEFAULT_STEP_BUDGET, RunConfig, RunOptions};
pub use scheduler::{RunError, Scheduler, StepDelta};
