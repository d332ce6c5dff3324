//! Emission error types.

use std::path::PathBuf;

use thiserror::Error;
use turbosse_encoding::EncodeError;

/// Boxed error produced by an event source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A specialized `Result` type for emission operations.
pub type EmitResult<T> = std::result::Result<T, EmitError>;

/// Errors in an emission configuration, raised before anything is written.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// A static event name was empty.
    #[error("Static event name must not be empty")]
    EmptyEventName,

    /// A static event name contains a line break.
    #[error("Invalid event name {0:?}: must not contain line breaks")]
    InvalidEventName(String),

    /// The sink channel capacity was zero.
    #[error("Channel capacity must be at least 1")]
    ZeroCapacity,

    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors reported by an [`crate::EventSink`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SinkError {
    /// The peer is gone or the sink was already ended.
    #[error("Sink closed")]
    Closed,

    /// Headers were set after the response head was committed.
    #[error("Response headers already sent")]
    HeadersSent,

    /// The response was aborted mid-stream.
    #[error("Response aborted: {0}")]
    Aborted(String),

    /// An underlying I/O error occurred.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors that end an emission.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EmitError {
    /// The configuration was rejected before any byte was written.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A value could not be encoded; the response was aborted.
    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),

    /// The source failed mid-stream; the response was aborted.
    #[error("Event source failed: {0}")]
    Source(#[source] BoxError),

    /// The sink rejected a write or could not be ended.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

impl EmitError {
    /// Wrap a source failure.
    pub fn from_source(err: impl Into<BoxError>) -> Self {
        Self::Source(err.into())
    }

    /// Returns `true` if the error was raised before any byte was written.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
