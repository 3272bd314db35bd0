/// Shared error type used across all Homework Helper crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("AI backend: {0}")]
    AiBackend(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
