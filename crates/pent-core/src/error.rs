//! Error types for the Pent runtime
//!
//! Absence (of an object, an index match or an edge target) is never an error;
//! it is reported as `None` or an empty `Vec`. The variants here are either
//! store faults passed through unchanged or programming/configuration faults.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::ids::TypeId;

/// Error raised by a [`GraphStore`](crate::GraphStore) implementation.
///
/// Errors are `Clone` because a single batched fetch fans its outcome out to
/// every caller waiting on that batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store connection error: {0}")]
    Connection(String),

    /// The store rejected or failed to run a read/write
    #[error("Store query error: {0}")]
    Query(String),

    /// Arguments the store cannot act on
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A write would violate a store-level constraint
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Anything else
    #[error("Unknown store error: {0}")]
    Unknown(String),
}

impl From<String> for StoreError {
    fn from(error: String) -> Self {
        StoreError::Unknown(error)
    }
}

/// Core error type for entity loading and mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PentError {
    /// The loaded object is of a different concrete type than the caller asked for
    #[error("Type mismatch for {obj_id}: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Identifier that was loaded
        obj_id: Uuid,
        /// Type the caller asked for
        expected: String,
        /// Type the store holds for that identifier
        actual: String,
    },

    /// No entity type is registered under this name
    #[error("Type not registered: {0}")]
    UnregisteredType(String),

    /// The store returned a type tag with no registered entity type
    #[error("Unknown type id: {0}")]
    UnknownTypeId(TypeId),

    /// No edge definition exists under this name
    #[error("Unknown edge: {0}")]
    UnknownEdge(String),

    /// The entity types and the store schema do not line up one-to-one
    #[error("Registry does not match schema: {0}")]
    RegistryMismatch(String),

    /// A raw record is missing data every record must carry
    #[error("Invalid record {obj_id}: {reason}")]
    InvalidRecord {
        /// Identifier of the offending record
        obj_id: Uuid,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid runtime or schema configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The task running a batch ended without producing a result
    #[error("Batch aborted: {0}")]
    BatchAborted(String),

    /// Store fault, propagated unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for PentError {
    fn from(err: serde_json::Error) -> Self {
        PentError::Configuration(err.to_string())
    }
}

impl From<serde_yaml::Error> for PentError {
    fn from(err: serde_yaml::Error) -> Self {
        PentError::Configuration(err.to_string())
    }
}

/// Result type alias for Pent operations.
pub type PentResult<T> = Result<T, PentError>;
