//! Error types for Scriptgate

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for the Scriptgate server.
///
/// Every per-request failure is converted into a [`crate::ResponseEnvelope`]
/// at the dispatcher boundary; the variant decides the status code via
/// [`Error::to_status_code`]. The `Display` text of a variant is what a
/// client sees in the envelope body, so client-facing variants keep their
/// messages bare.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or incomplete request body
    #[error("{0}")]
    InvalidRequest(String),

    /// Requested namespace is not registered
    #[error("Namespace doesn't exist: {0}")]
    NamespaceNotFound(String),

    /// Script failed to compile or faulted at runtime
    #[error("{0}")]
    Script(String),

    /// Script execution exceeded the configured deadline
    #[error("Script execution timed out after {0}ms")]
    Timeout(u64),

    /// Bootstrap or startup initialization failure
    #[error("Setup error: {0}")]
    Setup(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert error to HTTP status code
    pub fn to_status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::InvalidRequest(_) | Error::Script(_) | Error::Timeout(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NamespaceNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
