/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum EfetchError {
    /// Connection-level failure from `reqwest` (DNS, TCP, TLS, timeout, body read).
    #[error("connection error: {0}")]
    Connection(reqwest::Error),
    /// HTTP 404 that persisted through every retry.
    #[error("not found: {url}: {body}")]
    NotFound { url: String, body: String },
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body is not valid JSON or does not match the requested type.
    #[error("deserialize error: {message}; body: {body}")]
    Deserialize { message: String, body: String },
    /// Request body could not be encoded as JSON.
    #[error("serialize error: {0}")]
    Serialize(String),
    /// Composed URL could not be parsed.
    #[error("invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    /// Header name or value rejected by the HTTP layer.
    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },
    /// The caller's cancellation token fired before the call completed.
    #[error("request cancelled")]
    Cancelled,
    /// The underlying transport could not be constructed.
    #[error("client construction error: {0}")]
    Client(reqwest::Error),
}

impl EfetchError {
    /// HTTP status carried by the error, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for the error kinds the default retry policy retries.
    pub fn is_retryable_kind(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::NotFound { .. })
    }

    /// Returns `true` when the caller's cancellation token stopped the request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
