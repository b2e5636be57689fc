use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to start player: {0}")]
    Spawn(String),

    #[error("player IPC failed: {0}")]
    Ipc(String),

    #[error("player rejected command: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PreviewError>;
