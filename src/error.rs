//! Error handling for SafeSight Console

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing, invalid or expired credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Action rejected because another one is still in flight
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Camera is offline or its stream failed
    #[error("Camera {camera_id} unavailable: {message}")]
    Unavailable { camera_id: String, message: String },

    /// Request exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Frame capture failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the backend rejected the caller's credentials
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            Error::Unauthorized(_) => true,
            Error::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        Error::Timeout(e.to_string())
    }
}
