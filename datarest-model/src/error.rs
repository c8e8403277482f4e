//! Error types for the entity model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while looking up metadata or converting values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No metadata is registered for the type.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// The entity declares no property with this name.
    #[error("unknown property '{property}' on {entity_type}")]
    UnknownProperty {
        entity_type: String,
        property: String,
    },

    /// The instance's identifier is null or cannot be rendered.
    #[error("{entity_type} instance has no identifier")]
    MissingIdentifier { entity_type: String },

    /// Metadata violates a structural invariant.
    #[error("invalid metadata for {entity_type}: {reason}")]
    InvalidMetadata { entity_type: String, reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
