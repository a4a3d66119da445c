//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors produced while validating or transcoding remote records.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The record could not be deserialized into its typed shape.
    #[error("malformed {kind} record: {source}")]
    Malformed {
        /// Entity kind the record claimed to be.
        kind: &'static str,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A field required by the local shape was absent.
    #[error("{kind} record missing required field `{field}`")]
    MissingField {
        /// Entity kind the record claimed to be.
        kind: &'static str,
        /// Name of the absent field.
        field: &'static str,
    },

    /// Serialization of an outbound record failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ModelError {
    /// Creates a malformed-record error for the given kind.
    pub fn malformed(kind: &'static str, source: serde_json::Error) -> Self {
        Self::Malformed { kind, source }
    }

    /// Creates a missing-field error for the given kind.
    pub fn missing_field(kind: &'static str, field: &'static str) -> Self {
        Self::MissingField { kind, field }
    }
}
