//! Error types for the HTTP client.

use restmodel_core::TransportError;
use thiserror::Error;

/// Result type for HTTP client setup and requests.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors raised by [`ReqwestClient`](crate::ReqwestClient).
#[derive(Error, Debug)]
pub enum HttpError {
    /// Error reported by reqwest.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// A configured default header is malformed.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader {
        /// Header name as configured.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base URL: {0:?}")]
    InvalidBaseUrl(String),

    /// A request URL could not be resolved.
    #[error("invalid request URL {url:?}: {reason}")]
    InvalidUrl {
        /// URL as given by the caller.
        url: String,
        /// Parser message.
        reason: String,
    },
}

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Reqwest(err) if err.is_timeout() => TransportError::Timeout,
            HttpError::Reqwest(err) if err.is_decode() => TransportError::Decode(err.to_string()),
            HttpError::Reqwest(err) => {
                let retryable = err.is_connect() || err.is_request() || err.is_body();
                TransportError::Connection {
                    message: err.to_string(),
                    retryable,
                }
            }
            other => TransportError::fatal(other.to_string()),
        }
    }
}
