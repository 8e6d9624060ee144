use thiserror::Error;
use voxclone_voiceprint::VoiceprintError;

use crate::Stage;

/// Errors raised while building or validating a voice.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed job, vectors, thresholds or weights.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An external collaborator (fetcher, normalizer, encoder, synthesizer)
    /// failed.
    #[error("{stage}: {}{message}", source_label(.source_index))]
    Collaborator {
        stage: Stage,
        source_index: Option<usize>,
        message: String,
    },

    /// Failure while computing a post-synthesis verdict.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn source_label(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!("source {i}: "),
        None => String::new(),
    }
}

impl PipelineError {
    pub(crate) fn collaborator(
        stage: Stage,
        source_index: Option<usize>,
        err: impl std::fmt::Display,
    ) -> Self {
        PipelineError::Collaborator {
            stage,
            source_index,
            message: err.to_string(),
        }
    }

    /// Maps a voiceprint error raised during `stage`: caller data problems
    /// stay `InvalidInput`, everything else is a collaborator failure.
    pub(crate) fn from_voiceprint(stage: Stage, source_index: Option<usize>, err: VoiceprintError) -> Self {
        if err.is_invalid_input() {
            PipelineError::InvalidInput(err.to_string())
        } else {
            PipelineError::collaborator(stage, source_index, err)
        }
    }

    /// The stage a collaborator failure happened in.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Collaborator { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_display() {
        let e = PipelineError::collaborator(Stage::Preprocessing, Some(1), "decoder exploded");
        assert_eq!(e.to_string(), "preprocessing: source 1: decoder exploded");
        assert_eq!(e.stage(), Some(Stage::Preprocessing));

        let e = PipelineError::collaborator(Stage::EmbeddingExtraction, None, "combine");
        assert_eq!(e.to_string(), "embedding_extraction: combine");
    }

    #[test]
    fn voiceprint_mapping() {
        let e = PipelineError::from_voiceprint(
            Stage::EmbeddingExtraction,
            None,
            VoiceprintError::DimensionMismatch { expected: 2, got: 3 },
        );
        assert!(matches!(e, PipelineError::InvalidInput(_)));

        let e = PipelineError::from_voiceprint(
            Stage::EmbeddingExtraction,
            Some(0),
            VoiceprintError::Encoder("oom".into()),
        );
        assert!(matches!(e, PipelineError::Collaborator { source_index: Some(0), .. }));
    }
}
