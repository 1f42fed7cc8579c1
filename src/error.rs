//! Vordr error types

/// Vordr error types
#[derive(Debug, thiserror::Error)]
pub enum VordrError {
    // Network errors
    #[error("transport error: {0}")]
    Transport(String),

    #[error("non-ok response ({status}) for {url}")]
    Status { status: u16, url: String },

    // Store errors
    /// The store refused the entry (non-GET request, partial content,
    /// `Vary: *`, opaque response, or a backend write failure).
    #[error("store write rejected: {0}")]
    StoreWrite(String),

    #[error("store error: {0}")]
    Store(String),

    // Lifecycle errors
    /// Precaching the mandatory asset list failed; the install must not
    /// be considered successful.
    #[error("install failed: {reason}")]
    InstallFailed { reason: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for VordrError {
    fn from(err: reqwest::Error) -> Self {
        VordrError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for VordrError {
    fn from(err: url::ParseError) -> Self {
        VordrError::InvalidRequest(err.to_string())
    }
}

impl VordrError {
    /// Whether this error came from the network layer (transport failure
    /// or a non-ok status), as opposed to local store or config trouble.
    pub fn is_network(&self) -> bool {
        matches!(self, VordrError::Transport(_) | VordrError::Status { .. })
    }
}

/// Result type alias for Vordr operations
pub type Result<T> = std::result::Result<T, VordrError>;
