//! Error types for the job guard.
//!
//! Configuration problems are fatal and surface before the guard loop
//! starts. API access problems are recoverable: the guard loop logs them and
//! backs off, so they never escape a running guard.

use thiserror::Error;

/// The main error type for job guard operations.
#[derive(Debug, Error)]
pub enum JobGuardError {
    /// The guard configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Pipeline records could not be retrieved.
    #[error("{0}")]
    ApiAccess(#[from] ApiAccessError),
}

/// Error raised while assembling a [`GuardConfig`](crate::config::GuardConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The ref pattern is not a valid regular expression.
    #[error("Invalid ref pattern '{pattern}': {source}")]
    InvalidRefPattern {
        /// The pattern as supplied.
        pattern: String,
        /// The compilation error.
        #[source]
        source: regex::Error,
    },

    /// The status pattern is not a valid regular expression.
    #[error("Invalid status pattern '{pattern}': {source}")]
    InvalidStatusPattern {
        /// The pattern as supplied.
        pattern: String,
        /// The compilation error.
        #[source]
        source: regex::Error,
    },

    /// No API credential was supplied.
    #[error("An API access token is required")]
    MissingCredential,

    /// No API base URL was supplied.
    #[error("An API base URL is required")]
    MissingApiUrl,

    /// No project identifier was supplied.
    #[error("A project identifier is required")]
    MissingProjectId,

    /// The API base URL cannot be used.
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidApiUrl {
        /// The URL as supplied.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The timeout must be strictly positive.
    #[error("Timeout must be greater than zero seconds")]
    InvalidTimeout,

    /// The backoff settings are inconsistent.
    #[error("Invalid backoff settings: {0}")]
    InvalidBackoff(String),
}

/// Error raised when the pipeline list cannot be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiAccessError {
    /// The request never produced a response.
    #[error("Failed to retrieve project pipeline data, request to {url} failed: {message}")]
    Transport {
        /// The requested URL.
        url: String,
        /// The underlying transport error.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("Failed to retrieve project pipeline data, {url} returned HTTP {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not a list of pipeline records.
    #[error("Failed to retrieve project pipeline data, malformed response from {url}: {message}")]
    Decode {
        /// The requested URL.
        url: String,
        /// The decoding error.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to retrieve project pipeline data, HTTP client unavailable: {0}")]
    Client(String),
}

impl ApiAccessError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Short name of the failure class, used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
            Self::Client(_) => "client",
        }
    }
}
