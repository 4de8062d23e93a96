//! SQLite implementation of the workout backend port.
//!
//! Every write is an upsert keyed by identity: workouts by id, sets by
//! `(workout_id, exercise_name, set_number)`, analytics by workout id. A
//! retried save therefore converges on the same rows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use liftlog_core::WorkoutBackend;
use liftlog_domain::{
    LiftlogError, Result as DomainResult, SetRecord, WorkoutAnalytics, WorkoutRecord,
};
use rusqlite::{params, Connection, Row};
use tokio::task;
use tracing::{debug, info};
use uuid::Uuid;

use super::manager::{map_sql_error, DbManager};
use crate::errors::{map_join_error, InfraError};

/// SQLite-backed workout storage.
pub struct SqliteWorkoutBackend {
    db: Arc<DbManager>,
}

impl SqliteWorkoutBackend {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Stored sets of a workout, ordered by exercise and set number.
    pub async fn load_sets(&self, workout_id: &str) -> DomainResult<Vec<SetRecord>> {
        let db = Arc::clone(&self.db);
        let workout_id = workout_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<SetRecord>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(SELECT_SETS_SQL).map_err(map_sql_error)?;
            let rows = stmt.query_map(params![workout_id], map_set_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Status column of a workout (`saved` or `recovered`).
    pub async fn workout_status(&self, workout_id: &str) -> DomainResult<Option<String>> {
        let db = Arc::clone(&self.db);
        let workout_id = workout_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<String>> {
            let conn = db.get_connection()?;
            match conn.query_row(
                "SELECT status FROM workouts WHERE id = ?1",
                params![workout_id],
                |row| row.get(0),
            ) {
                Ok(status) => Ok(Some(status)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    fn upsert_workout(conn: &Connection, id: &str, record: &WorkoutRecord) -> DomainResult<()> {
        let metadata = serde_json::to_string(&record.metadata).map_err(InfraError::from)?;
        let now = timestamp();
        conn.execute(
            UPSERT_WORKOUT_SQL,
            params![
                id,
                record.user_id,
                record.name,
                record.training_type,
                record.start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
                record.end_time.to_rfc3339_opts(SecondsFormat::Millis, true),
                to_i64(record.duration_seconds),
                metadata,
                now,
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    fn upsert_sets(
        conn: &mut Connection,
        workout_id: &str,
        exercise_name: &str,
        sets: &[SetRecord],
    ) -> DomainResult<()> {
        let tx = conn.transaction().map_err(map_sql_error)?;
        {
            let mut stmt = tx.prepare(UPSERT_SET_SQL).map_err(map_sql_error)?;
            for set in sets {
                stmt.execute(params![
                    workout_id,
                    exercise_name,
                    set.set_number,
                    set.weight,
                    set.reps,
                    set.rest_time,
                    set.completed,
                    set.rpe,
                ])
                .map_err(map_sql_error)?;
            }
        }
        // Sets removed since an earlier attempt must not linger.
        let max_set_number = sets.iter().map(|set| set.set_number).max().unwrap_or(0);
        tx.execute(
            "DELETE FROM exercise_sets
             WHERE workout_id = ?1 AND exercise_name = ?2 AND set_number > ?3",
            params![workout_id, exercise_name, max_set_number],
        )
        .map_err(map_sql_error)?;
        tx.commit().map_err(map_sql_error)
    }
}

#[async_trait]
impl WorkoutBackend for SqliteWorkoutBackend {
    async fn save_workout(&self, record: &WorkoutRecord) -> DomainResult<String> {
        let db = Arc::clone(&self.db);
        let record = record.clone();
        let id = record.workout_id.clone().unwrap_or_else(|| Uuid::now_v7().to_string());

        task::spawn_blocking(move || -> DomainResult<String> {
            let conn = db.get_connection()?;
            Self::upsert_workout(&conn, &id, &record)?;
            info!(workout_id = %id, user_id = %record.user_id, "workout row upserted");
            Ok(id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn save_exercise_sets(
        &self,
        workout_id: &str,
        exercise_name: &str,
        sets: &[SetRecord],
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let workout_id = workout_id.to_string();
        let exercise_name = exercise_name.to_string();
        let sets = sets.to_vec();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            Self::upsert_sets(&mut conn, &workout_id, &exercise_name, &sets)?;
            debug!(workout_id = %workout_id, exercise = %exercise_name, sets = sets.len(), "sets upserted");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn record_analytics(&self, analytics: &WorkoutAnalytics) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let analytics = analytics.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                UPSERT_ANALYTICS_SQL,
                params![
                    analytics.workout_id,
                    analytics.user_id,
                    to_i64(analytics.experience_points),
                    analytics.total_volume,
                    analytics.completed_sets,
                    to_i64(analytics.duration_seconds),
                    timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn recover_partially_completed_workout(&self, workout_id: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let workout_id = workout_id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    "UPDATE workouts SET status = 'recovered', updated_at = ?2 WHERE id = ?1",
                    params![workout_id, timestamp()],
                )
                .map_err(map_sql_error)?;
            if updated == 0 {
                return Err(LiftlogError::NotFound(format!("workout {workout_id}")));
            }
            info!(workout_id = %workout_id, "workout marked recovered");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

const UPSERT_WORKOUT_SQL: &str = "INSERT INTO workouts (
        id, user_id, name, training_type, start_time, end_time, duration_seconds,
        metadata_json, status, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'saved', ?9, ?9)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        training_type = excluded.training_type,
        start_time = excluded.start_time,
        end_time = excluded.end_time,
        duration_seconds = excluded.duration_seconds,
        metadata_json = excluded.metadata_json,
        updated_at = excluded.updated_at";

const UPSERT_SET_SQL: &str = "INSERT INTO exercise_sets (
        workout_id, exercise_name, set_number, weight, reps, rest_time, completed, rpe
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(workout_id, exercise_name, set_number) DO UPDATE SET
        weight = excluded.weight,
        reps = excluded.reps,
        rest_time = excluded.rest_time,
        completed = excluded.completed,
        rpe = excluded.rpe";

const UPSERT_ANALYTICS_SQL: &str = "INSERT INTO workout_analytics (
        workout_id, user_id, experience_points, total_volume, completed_sets,
        duration_seconds, recorded_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(workout_id) DO UPDATE SET
        experience_points = excluded.experience_points,
        total_volume = excluded.total_volume,
        completed_sets = excluded.completed_sets,
        duration_seconds = excluded.duration_seconds,
        recorded_at = excluded.recorded_at";

const SELECT_SETS_SQL: &str = "SELECT
        exercise_name, set_number, weight, reps, rest_time, completed, rpe
    FROM exercise_sets
    WHERE workout_id = ?1
    ORDER BY exercise_name ASC, set_number ASC";

fn map_set_row(row: &Row<'_>) -> rusqlite::Result<SetRecord> {
    Ok(SetRecord {
        exercise_name: row.get(0)?,
        set_number: row.get(1)?,
        weight: row.get(2)?,
        reps: row.get(3)?,
        rest_time: row.get(4)?,
        completed: row.get(5)?,
        rpe: row.get(6)?,
    })
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
