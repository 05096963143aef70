use std::path::PathBuf;

/// Core error type for the archivist.
///
/// Adapter crates map their specific errors into this type so the engine can
/// treat every failure the same way: log it and keep polling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no bot token supplied")]
    MissingToken,

    #[error("config error: {0}")]
    Config(String),

    #[error("identity check failed: {0}")]
    Auth(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive not found for chat {chat_id} at {path}")]
    ArchiveMissing { chat_id: i64, path: PathBuf },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
