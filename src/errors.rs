use thiserror::Error;

/// Crate-wide error type.
///
/// Lookups that miss return `Option::None` instead of an error; the variants
/// here cover stored-data corruption, business-rule violations and IO.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A stored record is missing a required field or has the wrong shape.
    /// Raised per record during load; the surrounding collection keeps
    /// loading (skip-and-continue).
    #[error("malformed {kind} record: {reason}")]
    MalformedRecord { kind: &'static str, reason: String },

    /// A business rule was violated. The message is user-facing and, for the
    /// invoice status gate, itemizes every offending position.
    #[error("{0}")]
    ValidationError(String),

    /// Filesystem failure during write/provisioning. Not caught internally;
    /// the caller presents it.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// JSON (de)serialization failure outside the tolerant-read path.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn malformed(kind: &'static str, err: impl std::fmt::Display) -> Self {
        ServiceError::MalformedRecord {
            kind,
            reason: err.to_string(),
        }
    }
}
