//! Error types for resource assembly.

use datarest_model::ModelError;
use thiserror::Error;

/// Result type for assembly operations.
pub type HalResult<T> = Result<T, HalError>;

/// Errors raised while assembling resources or evaluating preconditions.
#[derive(Debug, Error)]
pub enum HalError {
    /// Unknown or unexported type, or an instance without identifier.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Two association properties map to the same relation.
    #[error("ambiguous association relation '{rel}' on {entity_type}; disambiguate with a rel override")]
    AmbiguousAssociationRel { entity_type: String, rel: String },

    /// An `If-Match` precondition did not hold.
    #[error("precondition failed: If-Match {expected} does not match current ETag {current}")]
    PreconditionFailed { expected: String, current: String },

    /// Metadata is inconsistent with the instance being assembled.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ModelError> for HalError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownEntityType(_) | ModelError::MissingIdentifier { .. } => {
                HalError::ResourceNotFound(err.to_string())
            }
            ModelError::Serialization(e) => HalError::Serialization(e),
            other => HalError::Metadata(other.to_string()),
        }
    }
}
