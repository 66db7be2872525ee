//! Error types shared across the gateway.

use thiserror::Error;

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while serving a generation request or a live session.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client request cannot be turned into an upstream call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream answered a synchronous call with a non-success status.
    #[error("Upstream HTTP error: {status} - {body}")]
    UpstreamHttp {
        /// HTTP status code returned by upstream.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The request never reached upstream or the response could not be read.
    #[error("Request error: {0}")]
    Request(String),

    /// Upstream finished but produced an error or no usable payload.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// The long-running operation did not complete within the attempt budget.
    #[error("Operation {operation} did not complete after {attempts} attempts")]
    PollTimeout {
        /// Operation name returned by the start call.
        operation: String,
        /// Number of poll attempts made.
        attempts: u32,
    },

    /// Credential acquisition failed.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Streaming connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid-request error.
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new upstream HTTP error.
    pub fn upstream<S: Into<String>>(status: u16, body: S) -> Self {
        Self::UpstreamHttp { status, body: body.into() }
    }

    /// Create a new request error.
    pub fn request<S: Into<String>>(msg: S) -> Self {
        Self::Request(msg.into())
    }

    /// Create a new generation failure.
    pub fn generation<S: Into<String>>(msg: S) -> Self {
        Self::GenerationFailed(msg.into())
    }

    /// Create a new authentication error.
    pub fn auth<S: Into<String>>(msg: S) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a new connection error.
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Whether a poll attempt that failed with this error may be retried.
    ///
    /// Only transport-level failures qualify; everything else is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamHttp { .. } | Self::Request(_))
    }
}
