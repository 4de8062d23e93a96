//! Conversions from external infrastructure errors into domain errors.

use std::io;

use liftlog_domain::LiftlogError;
use r2d2::Error as PoolError;
use rusqlite::Error as SqlError;
use serde_json::Error as JsonError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LiftlogError);

impl From<InfraError> for LiftlogError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LiftlogError> for InfraError {
    fn from(value: LiftlogError) -> Self {
        InfraError(value)
    }
}

trait IntoLiftlogError {
    fn into_liftlog(self) -> LiftlogError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → LiftlogError */
/* -------------------------------------------------------------------------- */

impl IntoLiftlogError for SqlError {
    fn into_liftlog(self) -> LiftlogError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        LiftlogError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        LiftlogError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        LiftlogError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        LiftlogError::Database("foreign key constraint violation".into())
                    }
                    (ErrorCode::DiskFull, _) => LiftlogError::Storage("disk is full".into()),
                    _ => LiftlogError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => LiftlogError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                LiftlogError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                LiftlogError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidParameterName(parameter_name) => {
                LiftlogError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => LiftlogError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => LiftlogError::Database("invalid SQL query".into()),
            other => LiftlogError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_liftlog())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → LiftlogError */
/* -------------------------------------------------------------------------- */

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(LiftlogError::Database(format!("connection pool unavailable: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → LiftlogError */
/* -------------------------------------------------------------------------- */

impl IntoLiftlogError for io::Error {
    fn into_liftlog(self) -> LiftlogError {
        match self.kind() {
            io::ErrorKind::NotFound => LiftlogError::NotFound(self.to_string()),
            io::ErrorKind::PermissionDenied => {
                LiftlogError::Storage(format!("permission denied: {self}"))
            }
            _ => LiftlogError::Storage(self.to_string()),
        }
    }
}

impl From<io::Error> for InfraError {
    fn from(value: io::Error) -> Self {
        InfraError(value.into_liftlog())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → LiftlogError */
/* -------------------------------------------------------------------------- */

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(LiftlogError::Serialization(value.to_string()))
    }
}

/// Map a failed `spawn_blocking` join into a domain error.
pub fn map_join_error(err: JoinError) -> LiftlogError {
    if err.is_cancelled() {
        LiftlogError::Internal("database task cancelled".into())
    } else {
        LiftlogError::Internal(format!("database task panic: {err}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
