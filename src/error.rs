//! Error types for pool, topology and constraint operations.

use thiserror::Error;

/// Errors surfaced by the resource pool and its collaborators.
///
/// All failures are synchronous and carry a human-readable description.
/// Nothing is retried internally; retry policy belongs to the caller.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Cannot find file {0}")]
    FileNotFound(String),

    #[error("Resource is reserved by {0}")]
    ResourceReserved(String),

    #[error("Unknown port reference {device}/{port}")]
    KeyNotFound { device: String, port: String },

    #[error("Load a resource file first")]
    NotLoaded,

    #[error("Not a connection constraint: {0}")]
    TypeMismatch(String),

    #[error("Resource does not meet constraint: {0}")]
    ConstraintUnmet(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}
