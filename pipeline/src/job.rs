use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{JobStatus, PipelineError, PipelineResult};

fn default_name() -> String {
    "Unnamed Voice".to_string()
}

/// One voice build request.
///
/// Wire format: `{id, name, urls[], transcripts[]?, userId?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceJob {
    pub id: String,
    #[serde(default = "default_name")]
    pub name: String,
    /// Reference audio sources: HTTP(S) URLs, `file://` URLs or local paths.
    #[serde(rename = "urls")]
    pub sources: Vec<String>,
    /// Transcripts aligned with `sources`; may be shorter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transcripts: Vec<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl VoiceJob {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sources,
            transcripts: Vec::new(),
            user_id: None,
        }
    }

    pub fn with_transcripts(mut self, transcripts: Vec<String>) -> Self {
        self.transcripts = transcripts;
        self
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.id.trim().is_empty() {
            return Err(PipelineError::InvalidInput("job id is empty".into()));
        }
        if self.sources.is_empty() {
            return Err(PipelineError::InvalidInput(format!(
                "job {} has no reference audio",
                self.id
            )));
        }
        if let Some(i) = self.sources.iter().position(|s| s.trim().is_empty()) {
            return Err(PipelineError::InvalidInput(format!(
                "job {}: source {i} is empty",
                self.id
            )));
        }
        if self.transcripts.len() > self.sources.len() {
            return Err(PipelineError::InvalidInput(format!(
                "job {}: {} transcripts for {} sources",
                self.id,
                self.transcripts.len(),
                self.sources.len()
            )));
        }
        Ok(())
    }

    /// Transcript of source `index`, if one was given and is not blank.
    pub fn transcript(&self, index: usize) -> Option<&str> {
        self.transcripts
            .get(index)
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
    }
}

/// Per-source entry of a [`JobOutput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub original_url: String,
    pub processed_path: PathBuf,
    pub embedding_path: PathBuf,
    pub embedding_shape: Vec<usize>,
}

/// Result record of a build job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutput {
    pub model_id: Option<String>,
    pub status: JobStatus,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub embeddings_count: usize,
    #[serde(default)]
    pub processed_files: Vec<ProcessedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobOutput {
    /// Summarizes a pipeline run. `model_id` is only kept for completed
    /// jobs.
    pub fn from_result(job: &VoiceJob, result: &PipelineResult, model_id: Option<String>) -> Self {
        let completed = result.status == JobStatus::Completed;
        let processed_files = result
            .sources
            .iter()
            .filter_map(|s| {
                Some(ProcessedFile {
                    original_url: s.source.clone(),
                    processed_path: s.normalized.as_ref()?.path.clone(),
                    embedding_path: s.embedding_path.clone()?,
                    embedding_shape: s.embedding_shape.clone()?,
                })
            })
            .collect();

        Self {
            model_id: if completed { model_id } else { None },
            status: result.status,
            job_id: job.id.clone(),
            name: Some(job.name.clone()),
            embeddings_count: result.embeddings_count(),
            processed_files,
            error: result.error.clone(),
        }
    }
}
