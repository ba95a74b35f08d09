//! App-level errors: configuration and startup failures, plus a passthrough
//! for data errors surfaced by one-shot use cases.

use fable_sync::DataError;

/// Errors from app wiring and configuration.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("database error: {0}")]
    Database(#[from] fable_db::DbError),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Result alias for app operations.
pub type AppResult<T> = Result<T, AppError>;
