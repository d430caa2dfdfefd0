//! Conversions from external infrastructure errors into domain errors.

use pbxpresence_common::CommonError;
use pbxpresence_domain::PresenceError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PresenceError);

impl From<InfraError> for PresenceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PresenceError> for InfraError {
    fn from(value: PresenceError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoPresenceError {
    fn into_presence(self) -> PresenceError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → PresenceError */
/* -------------------------------------------------------------------------- */

impl IntoPresenceError for SqlError {
    fn into_presence(self) -> PresenceError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        PresenceError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        PresenceError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        PresenceError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        PresenceError::Database("foreign key constraint violation".into())
                    }
                    _ => PresenceError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => PresenceError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                PresenceError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                PresenceError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => PresenceError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => PresenceError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_presence())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → PresenceError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(PresenceError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PresenceError */
/* -------------------------------------------------------------------------- */

impl IntoPresenceError for HttpError {
    fn into_presence(self) -> PresenceError {
        if self.is_timeout() {
            return PresenceError::Transport("HTTP request timed out".into());
        }
        if self.is_connect() {
            return PresenceError::Transport(format!("HTTP connection failure: {self}"));
        }
        if self.is_decode() {
            return PresenceError::Transport(format!("invalid response body: {self}"));
        }
        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
            return match code {
                401 | 403 => PresenceError::Authentication(message),
                _ => PresenceError::Transport(message),
            };
        }
        PresenceError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_presence())
    }
}

/* -------------------------------------------------------------------------- */
/* CommonError → PresenceError */
/* -------------------------------------------------------------------------- */

impl From<CommonError> for InfraError {
    fn from(value: CommonError) -> Self {
        let error = match value {
            CommonError::Config { message } => PresenceError::Config(message),
            CommonError::Crypto { message } | CommonError::Serialization { message } => {
                PresenceError::Security(message)
            }
            CommonError::Internal { message } => PresenceError::Internal(message),
        };
        InfraError(error)
    }
}

/// Shorthand used by repositories: `conn.execute(..).map_err(sql_err)?`.
pub(crate) fn sql_err(err: SqlError) -> PresenceError {
    PresenceError::from(InfraError::from(err))
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
