//! Error types for the fetch module.

use thiserror::Error;

/// Errors that can occur while talking to a remote host.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be read to the end.
    #[error("failed reading response body from {url}: {source}")]
    Body {
        /// The URL whose body failed.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Creates a client construction error.
    pub fn client(source: reqwest::Error) -> Self {
        Self::Client { source }
    }

    /// Creates a transport error, promoting reqwest timeouts to [`FetchError::Timeout`].
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Body {
            url: url.into(),
            source,
        }
    }

    /// Returns the HTTP status code when the server answered with an error status.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
