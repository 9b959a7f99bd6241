use thiserror::Error;

/// Hardlink client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request errors (connection refused, timeouts, body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Push subscription failures
    #[error("Stream error: {0}")]
    Stream(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid server URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Error classification for determining retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// Client errors (400-499) - invalid input or unknown job, don't retry
    Client,
    /// Server errors (500-599) - temporary issues, retry with backoff
    Server,
    /// Network errors - connection issues, retry with backoff
    Network,
}

impl ClientError {
    /// Classify this error for retry decisions
    pub fn error_type(&self) -> ErrorType {
        match self {
            ClientError::Status { status, .. } => classify_status(*status),
            ClientError::Http(e) => match e.status() {
                Some(status) => classify_status(status.as_u16()),
                None => ErrorType::Network,
            },
            ClientError::Stream(_) | ClientError::Io(_) => ErrorType::Network,
            ClientError::Config(_) | ClientError::Json(_) | ClientError::Url(_) => {
                ErrorType::Client
            }
            ClientError::Other(msg) => classify_error(msg),
        }
    }

    /// Whether an operation failing with this error may be attempted again
    pub fn is_retryable(&self) -> bool {
        self.error_type() != ErrorType::Client
    }
}

fn classify_status(status: u16) -> ErrorType {
    match status {
        400..=499 => ErrorType::Client,
        500..=599 => ErrorType::Server,
        _ => ErrorType::Network,
    }
}

/// Classify a free-form error message into an ErrorType
pub fn classify_error(error: &str) -> ErrorType {
    if error.contains("status 4")
        || error.contains("Bad Request")
        || error.contains("Unauthorized")
        || error.contains("Forbidden")
        || error.contains("Not Found")
        || error.contains("Invalid request")
    {
        return ErrorType::Client;
    }

    if error.contains("status 5")
        || error.contains("Internal Server Error")
        || error.contains("Service Unavailable")
        || error.contains("Gateway Timeout")
    {
        return ErrorType::Server;
    }

    // Default to network error (connection issues, timeouts, etc.)
    ErrorType::Network
}

/// Convert ClientError to String for display surfaces that only carry text
impl From<ClientError> for String {
    fn from(err: ClientError) -> String {
        err.to_string()
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<ClientError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            ClientError::Other(s) => ClientError::Other(format!("{}: {}", msg, s)),
            ClientError::Config(s) => ClientError::Config(format!("{}: {}", msg, s)),
            ClientError::Stream(s) => ClientError::Stream(format!("{}: {}", msg, s)),
            ClientError::Status { status, message } => ClientError::Status {
                status,
                message: format!("{}: {}", msg, message),
            },
            other => other,
        })
    }
}
