//! SQLite-backed queue of partially saved workouts.

use std::sync::Arc;

use async_trait::async_trait;
use liftlog_core::SaveRetryQueue;
use liftlog_domain::{Result as DomainResult, RetryEntry};
use rusqlite::{params, Connection, Row};
use tokio::task;
use tracing::{debug, warn};

use super::manager::{map_sql_error, DbManager};
use crate::errors::{map_join_error, InfraError};

/// Retry queue persisted in the `save_retry_queue` table.
pub struct SqliteRetryQueue {
    db: Arc<DbManager>,
}

impl SqliteRetryQueue {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn fetch_for_user(conn: &Connection, user_id: &str) -> DomainResult<Vec<RetryEntry>> {
        let mut stmt = conn.prepare(SELECT_FOR_USER_SQL).map_err(map_sql_error)?;
        let rows = stmt.query_map(params![user_id], map_retry_row).map_err(map_sql_error)?;
        let raw = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)?;
        Ok(raw.into_iter().filter_map(decode_entry).collect())
    }
}

#[async_trait]
impl SaveRetryQueue for SqliteRetryQueue {
    async fn enqueue(&self, entry: RetryEntry) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let failed = serde_json::to_string(&entry.failed_exercises).map_err(InfraError::from)?;
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO save_retry_queue (
                    id, workout_id, user_id, failed_exercises_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![entry.id, entry.workout_id, entry.user_id, failed, entry.created_at],
            )
            .map_err(map_sql_error)?;
            debug!(entry_id = %entry.id, workout_id = %entry.workout_id, "retry entry queued");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn pending_for_user(&self, user_id: &str) -> DomainResult<Vec<RetryEntry>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<RetryEntry>> {
            let conn = db.get_connection()?;
            Self::fetch_for_user(&conn, &user_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn drain_for_user(&self, user_id: &str) -> DomainResult<Vec<RetryEntry>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<RetryEntry>> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let entries = Self::fetch_for_user(&tx, &user_id)?;
            tx.execute("DELETE FROM save_retry_queue WHERE user_id = ?1", params![user_id])
                .map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;
            debug!(user_id = %user_id, drained = entries.len(), "retry queue drained");
            Ok(entries)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn discard_for_workout(&self, user_id: &str, workout_id: &str) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let workout_id = workout_id.to_string();

        task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection()?;
            let removed = conn
                .execute(
                    "DELETE FROM save_retry_queue WHERE user_id = ?1 AND workout_id = ?2",
                    params![user_id, workout_id],
                )
                .map_err(map_sql_error)?;
            debug!(workout_id = %workout_id, removed, "retry entries discarded");
            Ok(removed)
        })
        .await
        .map_err(map_join_error)?
    }
}

const SELECT_FOR_USER_SQL: &str = "SELECT
        id, workout_id, user_id, failed_exercises_json, created_at
    FROM save_retry_queue
    WHERE user_id = ?1
    ORDER BY created_at ASC, id ASC";

struct RawEntry {
    id: String,
    workout_id: String,
    user_id: String,
    failed_exercises_json: String,
    created_at: i64,
}

fn map_retry_row(row: &Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        user_id: row.get(2)?,
        failed_exercises_json: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn decode_entry(raw: RawEntry) -> Option<RetryEntry> {
    match serde_json::from_str::<Vec<String>>(&raw.failed_exercises_json) {
        Ok(failed_exercises) => Some(RetryEntry {
            id: raw.id,
            workout_id: raw.workout_id,
            user_id: raw.user_id,
            failed_exercises,
            created_at: raw.created_at,
        }),
        Err(err) => {
            warn!(
                entry_id = %raw.id,
                error = %err,
                "invalid failed-exercise list in retry queue; skipping entry"
            );
            None
        }
    }
}
