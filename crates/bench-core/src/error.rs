//! Error types for the benchmark core.

use thiserror::Error;

/// Result type for benchmark operations.
pub type BenchResult<T> = std::result::Result<T, BenchError>;

/// Remote error codes that are retried with backoff.
const RETRYABLE_CODES: &[&str] = &[
    "ThrottlingException",
    "ServiceUnavailableException",
    "ModelTimeoutException",
];

/// Errors that can occur while benchmarking a streaming endpoint.
#[derive(Error, Debug)]
pub enum BenchError {
    /// The endpoint returned an error response.
    #[error("API error ({status}) {code}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code from the endpoint.
        code: String,
        /// Human-readable error message.
        message: String,
    },

    /// Connection-level failure before or during the streaming call.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// Timeout waiting for the endpoint.
    #[error("Request timed out after {duration_ms}ms")]
    Timeout {
        /// Elapsed time in milliseconds before the timeout fired.
        duration_ms: u64,
    },

    /// A response or chunk could not be parsed.
    #[error("Failed to parse response: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// The event stream broke mid-response.
    #[error("Streaming error: {message}")]
    Streaming {
        /// Description of the streaming failure.
        message: String,
    },

    /// Client or endpoint configuration error.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration issue.
        message: String,
    },

    /// The requested model name is not in the registry.
    #[error("Unsupported model: {name}. Supported models: {supported}")]
    UnsupportedModel {
        /// The name that failed to resolve.
        name: String,
        /// Comma-separated list of supported names.
        supported: String,
    },

    /// The requested context size label is not recognized.
    #[error("Unsupported context size: {label}. Supported sizes: {supported}")]
    UnsupportedContextSize {
        /// The label that failed to resolve.
        label: String,
        /// Comma-separated list of supported labels.
        supported: String,
    },

    /// A batch produced no successful trials, so statistics are undefined.
    #[error("No successful trials in batch; cannot compute statistics")]
    NoSuccessfulTrials,

    /// Internal invariant violation.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl BenchError {
    /// Create an API error from response details.
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a streaming error.
    pub fn streaming(message: impl Into<String>) -> Self {
        Self::Streaming {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check whether this fault should be retried with backoff.
    ///
    /// Remote faults are retryable on rate limiting, transient service
    /// unavailability, model timeouts, and any 5xx status. Local and
    /// transport faults are treated conservatively as transient. Other 4xx
    /// responses fail immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, code, .. } => {
                RETRYABLE_CODES.contains(&code.as_str()) || *status == 429 || *status >= 500
            }
            Self::Connection { .. }
            | Self::Timeout { .. }
            | Self::Streaming { .. }
            | Self::Parse { .. } => true,
            _ => false,
        }
    }

    /// Get the HTTP status code if this fault carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
