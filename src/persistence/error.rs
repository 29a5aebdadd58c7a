//! Error types for the persistence layer.

use thiserror::Error;

/// Errors that can occur in the persistence layer.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A data store operation failed.
    #[error("a data store operation failed: {0}")]
    OperationFailed(String),

    /// Stored data could not be serialized or deserialized.
    #[error("failed to serialize or deserialize state: {0}")]
    SerializationError(String),

    /// A database migration failed.
    #[error("a data migration failed: {0}")]
    MigrationError(String),

    /// An invalid configuration or input was provided.
    #[error("invalid persistence configuration or input: {0}")]
    InvalidInput(String),
}
