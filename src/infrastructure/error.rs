use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Overlap(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Background task failed: {0}")]
    Task(String),
    #[error("API error: http {status}; {}", .message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },
}

impl InfraError {
    /// Message the server attached to a failed response, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }
}
