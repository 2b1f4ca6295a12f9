use crate::id::ShapeId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("shape not found: {0}")]
    MissingShape(ShapeId),
    #[error("structural encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("structural decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("clipboard text is not valid: {0}")]
    Json(#[from] serde_json::Error),
}
