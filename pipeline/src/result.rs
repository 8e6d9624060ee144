use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use voxclone_audio::NormalizedAudio;
use voxclone_voiceprint::{ConsistencyReport, EmbeddingVector};

use crate::{HandoffPayload, SynthesisBackend};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preprocessing,
    EmbeddingExtraction,
    ConsistencyValidation,
    GenerationHandoff,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Preprocessing,
        Stage::EmbeddingExtraction,
        Stage::ConsistencyValidation,
        Stage::GenerationHandoff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Preprocessing => "preprocessing",
            Stage::EmbeddingExtraction => "embedding_extraction",
            Stage::ConsistencyValidation => "consistency_validation",
            Stage::GenerationHandoff => "generation_handoff",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Completed,
    /// Prepared for an external step (generation handoff).
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub state: StageState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Progress of one reference source through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceResult {
    pub index: usize,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedAudio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_shape: Option<Vec<usize>>,
    #[serde(skip)]
    pub embedding: Option<EmbeddingVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceResult {
    pub(crate) fn new(index: usize, source: &str) -> Self {
        Self {
            index,
            source: source.to_string(),
            raw_path: None,
            normalized: None,
            embedding_path: None,
            embedding_shape: None,
            embedding: None,
            error: None,
        }
    }
}

/// Everything a pipeline run produced, including partial progress of a
/// failed run.
///
/// Paths point into the job workspace and stay valid only as long as it.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub job_id: String,
    pub status: JobStatus,
    pub stages: Vec<StageReport>,
    pub sources: Vec<SourceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combine_method: Option<String>,
    #[serde(skip)]
    pub combined: Option<EmbeddingVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency: Option<ConsistencyReport>,
    pub backend: SynthesisBackend,
    #[serde(skip)]
    pub handoff: Option<HandoffPayload>,
}

impl PipelineResult {
    pub(crate) fn new(job_id: &str, backend: SynthesisBackend) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Failed,
            stages: Vec::new(),
            sources: Vec::new(),
            failed_stage: None,
            error: None,
            combine_method: None,
            combined: None,
            combined_path: None,
            consistency: None,
            backend,
            handoff: None,
        }
    }

    pub(crate) fn mark(&mut self, stage: Stage, state: StageState) {
        self.stages.push(StageReport {
            stage,
            state,
            error: None,
        });
    }

    pub(crate) fn fail(&mut self, stage: Stage, error: String) {
        self.stages.push(StageReport {
            stage,
            state: StageState::Error,
            error: Some(error.clone()),
        });
        self.status = JobStatus::Failed;
        self.failed_stage = Some(stage);
        self.error = Some(error);
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// State of `stage`, `None` if it never ran.
    pub fn stage_state(&self, stage: Stage) -> Option<StageState> {
        self.stages.iter().find(|r| r.stage == stage).map(|r| r.state)
    }

    pub fn embeddings_count(&self) -> usize {
        self.sources.iter().filter(|s| s.embedding.is_some()).count()
    }

    /// Per-source embeddings extracted so far, in source order.
    pub fn embeddings(&self) -> Vec<EmbeddingVector> {
        self.sources
            .iter()
            .filter_map(|s| s.embedding.clone())
            .collect()
    }

    /// Normalized reference files, in source order.
    pub fn reference_audio(&self) -> Vec<PathBuf> {
        self.sources
            .iter()
            .filter_map(|s| s.normalized.as_ref().map(|n| n.path.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_records_stage() {
        let mut r = PipelineResult::new("j", SynthesisBackend::HostedApi);
        r.mark(Stage::Preprocessing, StageState::Completed);
        r.fail(Stage::EmbeddingExtraction, "boom".into());

        assert!(!r.is_completed());
        assert_eq!(r.failed_stage, Some(Stage::EmbeddingExtraction));
        assert_eq!(r.stage_state(Stage::Preprocessing), Some(StageState::Completed));
        assert_eq!(r.stage_state(Stage::EmbeddingExtraction), Some(StageState::Error));
        assert_eq!(r.stage_state(Stage::GenerationHandoff), None);
    }

    #[test]
    fn serializes_snake_case() {
        let mut r = PipelineResult::new("j", SynthesisBackend::LocalEngine);
        r.mark(Stage::GenerationHandoff, StageState::Ready);
        r.status = JobStatus::Completed;
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "completed");
        assert_eq!(v["backend"], "local_engine");
        assert_eq!(v["stages"][0]["stage"], "generation_handoff");
        assert_eq!(v["stages"][0]["state"], "ready");
        assert!(v.get("error").is_none());
    }
}
