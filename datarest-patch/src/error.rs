//! Error types for patch application.

use datarest_model::ModelError;
use serde_json::Value as Json;
use thiserror::Error;

/// Result type for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors raised while applying a patch.
///
/// Every error is raised before the result instance is returned; the caller's
/// instance is never modified.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Unknown entity type, or an instance without identifier.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// The path does not start at a property of the entity.
    #[error("could not resolve property path '{path}' on {entity_type}")]
    UnresolvablePropertyPath { entity_type: String, path: String },

    /// A value could not be converted to the declared property type.
    #[error("cannot convert {found} to {expected} for property '{property}'")]
    TypeConversionFailure {
        property: String,
        expected: String,
        found: String,
    },

    /// The patch document is structurally invalid or addresses a missing
    /// location.
    #[error("malformed patch document: {0}")]
    MalformedPatchDocument(String),

    /// A `test` operation did not hold.
    #[error("test operation failed at '{path}': expected {expected}, found {actual}")]
    TestOperationFailed {
        path: String,
        expected: Json,
        actual: Json,
    },

    /// The strategy needs an existing instance and none was supplied.
    #[error("{0} requires an existing instance")]
    MissingTarget(&'static str),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PatchError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        PatchError::MalformedPatchDocument(message.into())
    }

    pub(crate) fn unresolvable(entity_type: &str, path: &str) -> Self {
        PatchError::UnresolvablePropertyPath {
            entity_type: entity_type.to_string(),
            path: path.to_string(),
        }
    }
}

impl From<ModelError> for PatchError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownProperty {
                entity_type,
                property,
            } => PatchError::UnresolvablePropertyPath {
                entity_type,
                path: property,
            },
            ModelError::Serialization(e) => PatchError::Serialization(e),
            other => PatchError::ResourceNotFound(other.to_string()),
        }
    }
}
