use thiserror::Error;

/// Errors returned by voiceprint operations.
#[derive(Debug, Error)]
pub enum VoiceprintError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("reference set is empty")]
    EmptyReferenceSet,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoder error: {0}")]
    Encoder(String),
}

impl VoiceprintError {
    /// Reports whether the error stems from caller-supplied data rather
    /// than from I/O or a collaborator.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            VoiceprintError::InvalidInput(_)
                | VoiceprintError::DimensionMismatch { .. }
                | VoiceprintError::EmptyReferenceSet
        )
    }
}
