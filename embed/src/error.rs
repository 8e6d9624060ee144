use thiserror::Error;
use voxclone_voiceprint::VoiceprintError;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("encoder: command failed: {0}")]
    Command(String),

    #[error("encoder: API error: {0}")]
    Api(String),

    #[error("encoder: invalid output: {0}")]
    InvalidOutput(String),

    #[error("encoder: expected dimension {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("encoder: missing {0}")]
    MissingConfig(&'static str),

    #[error("encoder: io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EncoderError> for VoiceprintError {
    fn from(e: EncoderError) -> Self {
        match e {
            EncoderError::DimensionMismatch { expected, got } => {
                VoiceprintError::DimensionMismatch { expected, got }
            }
            other => VoiceprintError::Encoder(other.to_string()),
        }
    }
}
