use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Clip not found: {0}")]
    ClipNotFound(uuid::Uuid),

    #[error("Asset not found: {0}")]
    AssetNotFound(uuid::Uuid),

    #[error("Could not resolve duration of {media_ref}: {reason}")]
    DurationResolution { media_ref: String, reason: String },

    #[error("Malformed drop payload: {0}")]
    MalformedDropPayload(String),

    #[error("Asset generation failed: {0}")]
    Generation(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
