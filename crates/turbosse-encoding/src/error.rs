//! Encoding error types.

use thiserror::Error;

/// A specialized `Result` type for encoding operations.
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;

/// Errors raised while turning a value into an SSE frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    /// The payload could not be serialized to text.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A derived `id` or `event` value contains CR or LF and would split its
    /// field on the wire.
    #[error("SSE {field} field must not contain line breaks")]
    LineBreak {
        /// Name of the offending field
        field: &'static str,
    },

    /// A frame was built without data.
    #[error("SSE frame requires data")]
    MissingData,
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
