//! Error types for model and collection synchronization.

use serde_json::Value;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while talking to the REST backend.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("server responded with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Decoded response body, if any.
        body: Value,
    },

    /// The response body did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A model or collection was built incorrectly.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Creates a status error from a response.
    pub fn status(status: u16, body: Value) -> Self {
        Self::Status { status, body }
    }

    /// Returns true if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport(err) => err.is_retryable(),
            SyncError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns the HTTP status for server-side failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SyncError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures raised by an [`HttpClient`](crate::HttpClient) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection-level failure.
    #[error("{message}")]
    Connection {
        /// Error message.
        message: String,
        /// Whether the request can be retried.
        retryable: bool,
    },

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be decoded.
    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Creates a retryable connection error.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable connection error.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Connection { retryable, .. } => *retryable,
            TransportError::Timeout => true,
            TransportError::Decode(_) => false,
        }
    }
}

/// Programmer-misuse errors caught when assembling models and collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A collection was built without an element resource.
    #[error("collection requires an element resource")]
    MissingResource,

    /// A collection was given both a resource and a collection type.
    #[error("collection type already names the element resource")]
    ConflictingResource,

    /// A collection was built without an HTTP client.
    #[error("collection requires an HTTP client")]
    MissingClient,

    /// An endpoint string is unusable.
    #[error("invalid endpoint: {0:?}")]
    InvalidEndpoint(String),
}
