//! # Unified Error Taxonomy
//!
//! Every failure a consumer can observe, collapsed into one enum. Lower
//! layers keep their own error types; this is the boundary where they meet.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reqwest error / decode failure        ──► Transport                   │
//! │  HTTP 401 / 403                        ──► Authentication              │
//! │  HTTP non-2xx (other)                  ──► Server { status, message }  │
//! │  sqlx / cache failure                  ──► Database                    │
//! │  local input rejected before sending   ──► Validation                  │
//! │  2xx with no usable payload / no cache ──► MissingData                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Clone + PartialEq` so results carrying errors can be buffered, replayed
//! to late subscribers, and asserted on in tests.

use fable_db::DbError;
use fable_remote::{RemoteOutcome, TransportError};

/// Unified error type for all data operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    /// The request never produced a usable server answer.
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with a non-auth error status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The server rejected the caller's credentials (401) or rights (403).
    #[error("authentication error {status}: {message}")]
    Authentication { status: u16, message: String },

    /// The local cache failed to read or write.
    #[error("database error: {0}")]
    Database(String),

    /// Local input was rejected before any request was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// The operation completed but produced no data to show.
    #[error("no data available")]
    MissingData,
}

impl DataError {
    /// True when signing in again could plausibly fix this.
    pub fn is_auth(&self) -> bool {
        matches!(self, DataError::Authentication { .. })
    }

    /// True when the failure is local connectivity, worth a retry banner.
    pub fn is_transport(&self) -> bool {
        matches!(self, DataError::Transport(_))
    }
}

/// Result alias for data operations.
pub type DataResult<T> = Result<T, DataError>;

impl From<DbError> for DataError {
    fn from(err: DbError) -> Self {
        DataError::Database(err.to_string())
    }
}

impl From<TransportError> for DataError {
    fn from(err: TransportError) -> Self {
        DataError::Transport(err.to_string())
    }
}

impl From<fable_core::ValidationError> for DataError {
    fn from(err: fable_core::ValidationError) -> Self {
        DataError::Validation(err.to_string())
    }
}

impl From<fable_core::CoreError> for DataError {
    fn from(err: fable_core::CoreError) -> Self {
        DataError::Validation(err.to_string())
    }
}

// =============================================================================
// RemoteOutcome Conversion
// =============================================================================

/// Converts a [`RemoteOutcome`] into a [`DataResult`], applying the status
/// taxonomy.
pub trait OutcomeExt<T> {
    fn into_result(self) -> DataResult<T>;
}

impl<T> OutcomeExt<T> for RemoteOutcome<T> {
    fn into_result(self) -> DataResult<T> {
        match self {
            RemoteOutcome::Success(value) => Ok(value),
            RemoteOutcome::HttpError { status, message } if status == 401 || status == 403 => {
                Err(DataError::Authentication { status, message })
            }
            RemoteOutcome::HttpError { status, message } => {
                Err(DataError::Server { status, message })
            }
            RemoteOutcome::TransportFailure(err) => Err(err.into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fable_remote::TransportKind;

    #[test]
    fn test_auth_statuses_map_to_authentication() {
        for status in [401, 403] {
            let outcome: RemoteOutcome<()> = RemoteOutcome::HttpError {
                status,
                message: "denied".to_string(),
            };
            let err = outcome.into_result().unwrap_err();
            assert!(err.is_auth(), "status {status} should be auth");
        }
    }

    #[test]
    fn test_other_statuses_map_to_server() {
        let outcome: RemoteOutcome<()> = RemoteOutcome::HttpError {
            status: 500,
            message: "oops".to_string(),
        };
        assert_eq!(
            outcome.into_result().unwrap_err(),
            DataError::Server {
                status: 500,
                message: "oops".to_string(),
            }
        );
    }

    #[test]
    fn test_transport_failure_maps_to_transport() {
        let outcome: RemoteOutcome<()> = RemoteOutcome::TransportFailure(TransportError {
            kind: TransportKind::Timeout,
            message: "deadline exceeded".to_string(),
        });
        assert!(outcome.into_result().unwrap_err().is_transport());
    }

    #[test]
    fn test_success_passes_through() {
        let outcome = RemoteOutcome::Success(7);
        assert_eq!(outcome.into_result(), Ok(7));
    }
}
