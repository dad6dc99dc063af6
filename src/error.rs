/// Boxed source error carried by [`TransportError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by [`RequestExecutor`](crate::RequestExecutor) calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Upstream rejected the credential (401 or 403). Never retried.
    #[error("auth error {status}: {body}")]
    Auth { status: u16, body: String },
    /// Non-success HTTP status code with raw response body. Never retried.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// 502/503/504 kept coming back until the retry budget ran out.
    #[error("Transient error after retries: {status} ({attempts} attempts)")]
    TransientExhausted {
        /// Status code of the last attempt.
        status: u16,
        /// Total number of dispatches, initial one included.
        attempts: u32,
    },
    /// Timeout or connection failure on every attempt.
    #[error("Network error after retries: {source}")]
    Network {
        /// Total number of dispatches, initial one included.
        attempts: u32,
        /// Error observed on the last attempt.
        #[source]
        source: TransportError,
    },
    /// Transport failure that is neither a timeout nor a connection failure.
    #[error(transparent)]
    Transport(TransportError),
    /// Success status with a body that is not valid JSON.
    #[error("invalid JSON in response: {0}")]
    Decode(#[source] serde_json::Error),
    /// Request body could not be serialized; nothing was sent.
    #[error("request body is not valid JSON: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// Returns the HTTP status code behind this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. }
            | Self::Http { status, .. }
            | Self::TransientExhausted { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for 401/403 rejections.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Failure raised by a [`Transport`](crate::Transport) before any HTTP
/// response was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The attempt exceeded its timeout.
    #[error("request timed out: {0}")]
    Timeout(#[source] BoxError),
    /// The connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connect(#[source] BoxError),
    /// The request could not be built, e.g. an invalid URL. Nothing was sent.
    #[error("request failed: {0}")]
    Request(#[source] BoxError),
}

impl TransportError {
    /// Builds a timeout error from any error or message.
    pub fn timeout(err: impl Into<BoxError>) -> Self {
        Self::Timeout(err.into())
    }

    /// Builds a connection error from any error or message.
    pub fn connect(err: impl Into<BoxError>) -> Self {
        Self::Connect(err.into())
    }

    /// Builds a generic request error from any error or message.
    pub fn request(err: impl Into<BoxError>) -> Self {
        Self::Request(err.into())
    }

    /// Returns `true` when the failure is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }
}

/// Error raised while resolving an [`ExecutorConfig`](crate::ExecutorConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting was neither supplied nor found in the source.
    #[error("{key} is required")]
    Missing { key: &'static str },
    /// `API_TIMEOUT` did not parse as a positive number of seconds.
    #[error("API_TIMEOUT must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { value: String },
    /// The credential contains bytes that cannot appear in a header.
    #[error("API_KEY contains characters not allowed in an HTTP header")]
    InvalidApiKey,
}
