use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use voxclone_voiceprint::{CombineMethod, DEFAULT_CONSISTENCY_THRESHOLD, Thresholds};

use crate::{PipelineError, SynthesisBackend};

/// Configuration for [`crate::VoiceCloningPipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How per-reference embeddings are combined (default: weighted_average).
    pub combine_method: CombineMethod,
    /// Acceptance thresholds for generated audio.
    pub thresholds: Thresholds,
    /// Minimum pairwise similarity between references (default: 0.6).
    pub consistency_threshold: f32,
    pub backend: SynthesisBackend,
    /// Keep job artifacts under `<dir>/<job_id>` instead of a temporary
    /// directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            combine_method: CombineMethod::WeightedAverage,
            thresholds: Thresholds::default(),
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
            backend: SynthesisBackend::HostedApi,
            artifacts_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_combine_method(mut self, method: CombineMethod) -> Self {
        self.combine_method = method;
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_consistency_threshold(mut self, threshold: f32) -> Self {
        self.consistency_threshold = threshold;
        self
    }

    pub fn with_backend(mut self, backend: SynthesisBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        Thresholds::new(self.thresholds.ok, self.thresholds.reject_floor)
            .map_err(|e| PipelineError::InvalidInput(e.to_string()))?;
        if !(-1.0..=1.0).contains(&self.consistency_threshold) {
            return Err(PipelineError::InvalidInput(format!(
                "consistency threshold {} outside [-1, 1]",
                self.consistency_threshold
            )));
        }
        Ok(())
    }
}
