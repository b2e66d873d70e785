//! SQLite-backed checkpointer (feature `sqlite`).
//!
//! Stores one row per thread; each save upserts the latest channel map as a
//! JSON blob. Suitable for single-writer deployments where conversations must
//! survive process restarts.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::checkpointer::{Checkpoint, CheckpointError, Checkpointer};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS checkpoints (
    thread_id TEXT PRIMARY KEY,
    step INTEGER NOT NULL,
    state_json TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

/// Durable checkpointer backed by a SQLite database.
pub struct SqliteCheckpointer {
    pool: SqlitePool,
}

impl SqliteCheckpointer {
    /// Connect to `database_url` and ensure the checkpoint table exists.
    pub async fn connect(database_url: &str) -> Result<Self, CheckpointError> {
        // SQLite won't create the database file on connect; touch it first
        // for plain sqlite:// URLs.
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" && !std::path::Path::new(path).exists() {
                std::fs::File::create(path).map_err(CheckpointError::storage)?;
            }
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await
            .map_err(CheckpointError::storage)?;
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(CheckpointError::storage)?;
        tracing::debug!(database_url, "sqlite checkpointer ready");
        Ok(Self { pool })
    }

    /// Connect using the `STATEGRAPH_SQLITE_URL` environment variable
    /// (`.env` honored), defaulting to `sqlite://stategraph.db`.
    pub async fn connect_from_env() -> Result<Self, CheckpointError> {
        let _ = dotenvy::dotenv();
        let url = std::env::var("STATEGRAPH_SQLITE_URL")
            .unwrap_or_else(|_| "sqlite://stategraph.db".to_string());
        Self::connect(&url).await
    }
}

#[async_trait]
impl Checkpointer for SqliteCheckpointer {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        let state_json = serde_json::to_string(&checkpoint.values)?;
        sqlx::query(
            "INSERT INTO checkpoints (thread_id, step, state_json, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(thread_id) DO UPDATE SET
                 step = excluded.step,
                 state_json = excluded.state_json,
                 created_at = excluded.created_at",
        )
        .bind(&checkpoint.thread_id)
        .bind(checkpoint.step as i64)
        .bind(state_json)
        .bind(checkpoint.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(CheckpointError::storage)?;
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let row = sqlx::query(
            "SELECT step, state_json, created_at FROM checkpoints WHERE thread_id = ?1",
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CheckpointError::storage)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let step: i64 = row.try_get("step").map_err(CheckpointError::storage)?;
        let state_json: String = row
            .try_get("state_json")
            .map_err(CheckpointError::storage)?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(CheckpointError::storage)?;
        let values: FxHashMap<String, Value> = serde_json::from_str(&state_json)?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(CheckpointError::storage)?
            .with_timezone(&chrono::Utc);
        Ok(Some(Checkpoint {
            thread_id: thread_id.to_string(),
            step: step as u64,
            values,
            created_at,
        }))
    }
}
