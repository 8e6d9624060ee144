use std::io;
use std::path::Path;

use tracing::{error, info, warn};
use voxclone_audio::Normalizer;
use voxclone_voiceprint::{
    EmbeddingRecord, EmbeddingVector, ReferenceSet, SpeakerEncoder, VoiceprintError,
    check_consistency, combine,
};

use crate::fetch::{DefaultFetcher, SourceFetcher, source_extension};
use crate::handoff;
use crate::validate::{VerdictRecord, validate_generated};
use crate::{
    JobStatus, JobWorkspace, PipelineConfig, PipelineError, PipelineResult, SourceResult, Stage,
    StageReport, StageState, VoiceJob,
};

/// Builds a reference voice from a [`VoiceJob`].
///
/// Stages run in order:
///
/// 1. `Preprocessing`: fetch and normalize every source. One failure fails
///    the job.
/// 2. `EmbeddingExtraction`: embed every normalized file and combine.
/// 3. `ConsistencyValidation`: pairwise check of the references. Advisory
///    only.
/// 4. `GenerationHandoff`: prepare the payload for the configured
///    synthesis backend.
///
/// A failure stops the run; the returned [`PipelineResult`] keeps
/// everything produced before it.
///
/// The pipeline owns its collaborators. The encoder in particular is
/// expensive to construct; build the pipeline once and reuse it for
/// every job.
pub struct VoiceCloningPipeline {
    fetcher: Box<dyn SourceFetcher>,
    normalizer: Box<dyn Normalizer>,
    encoder: Box<dyn SpeakerEncoder>,
    config: PipelineConfig,
}

impl VoiceCloningPipeline {
    pub fn new(normalizer: Box<dyn Normalizer>, encoder: Box<dyn SpeakerEncoder>) -> Self {
        Self {
            fetcher: Box::new(DefaultFetcher::new()),
            normalizer,
            encoder,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn SourceFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &dyn Normalizer {
        self.normalizer.as_ref()
    }

    pub fn encoder(&self) -> &dyn SpeakerEncoder {
        self.encoder.as_ref()
    }

    /// Workspace for `job` as configured: persistent under
    /// `artifacts_dir`, temporary otherwise.
    pub fn workspace_for(&self, job: &VoiceJob) -> io::Result<JobWorkspace> {
        match &self.config.artifacts_dir {
            Some(dir) => JobWorkspace::persistent(dir, &job.id),
            None => JobWorkspace::temporary(&job.id),
        }
    }

    /// Runs the job in its own workspace.
    ///
    /// A temporary workspace is removed before returning, so paths in the
    /// result are only meaningful with `artifacts_dir` set. Use
    /// [`Self::process_in`] to control the workspace lifetime.
    pub fn process(&self, job: &VoiceJob) -> Result<PipelineResult, PipelineError> {
        let workspace = self.workspace_for(job)?;
        let result = self.process_in(job, &workspace);
        if let Err(e) = workspace.close() {
            warn!(job_id = %job.id, error = %e, "failed to remove workspace");
        }
        result
    }

    /// Runs the job inside `workspace`.
    ///
    /// Returns `Err` only for an invalid job or configuration. Stage
    /// failures are reported through [`PipelineResult::status`].
    pub fn process_in(
        &self,
        job: &VoiceJob,
        workspace: &JobWorkspace,
    ) -> Result<PipelineResult, PipelineError> {
        job.validate()?;
        self.config.validate()?;

        info!(
            job_id = %job.id,
            name = %job.name,
            sources = job.sources.len(),
            transcripts = job.transcripts.len(),
            "starting voice build"
        );
        let mut result = PipelineResult::new(&job.id, self.config.backend);

        if let Err(e) = self.preprocess(job, workspace, &mut result) {
            return Ok(failed(result, Stage::Preprocessing, e));
        }
        result.mark(Stage::Preprocessing, StageState::Completed);

        let references = match self.extract(workspace, &mut result) {
            Ok(set) => set,
            Err(e) => return Ok(failed(result, Stage::EmbeddingExtraction, e)),
        };
        result.mark(Stage::EmbeddingExtraction, StageState::Completed);

        self.check(&references, &mut result);

        match handoff::prepare(
            self.config.backend,
            job,
            &result.sources,
            result.combined_path.clone(),
        ) {
            Ok(payload) => {
                info!(backend = self.config.backend.as_str(), "ready for synthesis");
                result.handoff = Some(payload);
                result.mark(Stage::GenerationHandoff, StageState::Ready);
            }
            Err(e) => return Ok(failed(result, Stage::GenerationHandoff, e)),
        }

        result.status = JobStatus::Completed;
        info!(job_id = %job.id, embeddings = result.embeddings_count(), "voice build complete");
        Ok(result)
    }

    fn preprocess(
        &self,
        job: &VoiceJob,
        workspace: &JobWorkspace,
        result: &mut PipelineResult,
    ) -> Result<(), PipelineError> {
        let total = job.sources.len();
        for (i, source) in job.sources.iter().enumerate() {
            info!(source = i + 1, total, "preprocessing reference audio");
            let mut entry = SourceResult::new(i, source);
            let outcome = self.preprocess_source(i, source, workspace, &mut entry);
            if let Err(e) = &outcome {
                entry.error = Some(e.to_string());
            }
            result.sources.push(entry);
            outcome?;
        }
        Ok(())
    }

    fn preprocess_source(
        &self,
        index: usize,
        source: &str,
        workspace: &JobWorkspace,
        entry: &mut SourceResult,
    ) -> Result<(), PipelineError> {
        let dest = workspace.raw_path(index, &source_extension(source));
        let raw = self
            .fetcher
            .fetch(source, &dest)
            .map_err(|e| PipelineError::collaborator(Stage::Preprocessing, Some(index), e))?;
        entry.raw_path = Some(raw.clone());

        let normalized = self
            .normalizer
            .normalize(&raw, &workspace.processed_path(index))
            .map_err(|e| PipelineError::collaborator(Stage::Preprocessing, Some(index), e))?;
        info!(
            source = index + 1,
            duration = normalized.duration_secs,
            sample_rate = normalized.sample_rate,
            "reference audio normalized"
        );
        entry.normalized = Some(normalized);
        Ok(())
    }

    fn extract(
        &self,
        workspace: &JobWorkspace,
        result: &mut PipelineResult,
    ) -> Result<ReferenceSet, PipelineError> {
        let mut vectors = Vec::with_capacity(result.sources.len());
        for entry in result.sources.iter_mut() {
            match self.embed_source(workspace, entry) {
                Ok(embedding) => vectors.push(embedding),
                Err(e) => {
                    entry.error = Some(e.to_string());
                    return Err(e);
                }
            }
        }

        let stage = Stage::EmbeddingExtraction;
        let set = ReferenceSet::new(vectors)
            .map_err(|e| PipelineError::from_voiceprint(stage, None, e))?;
        let method = &self.config.combine_method;
        let combined =
            combine(&set, method).map_err(|e| PipelineError::from_voiceprint(stage, None, e))?;

        let path = workspace.combined_embedding_path();
        EmbeddingRecord::combined(&combined, method, set.len())
            .save(&path)
            .map_err(|e| persist_error(stage, None, e))?;
        info!(
            method = %method,
            count = set.len(),
            dimension = set.dimension(),
            "embeddings combined"
        );

        result.combine_method = Some(method.to_string());
        result.combined = Some(combined);
        result.combined_path = Some(path);
        Ok(set)
    }

    fn embed_source(
        &self,
        workspace: &JobWorkspace,
        entry: &mut SourceResult,
    ) -> Result<EmbeddingVector, PipelineError> {
        let stage = Stage::EmbeddingExtraction;
        let index = entry.index;
        let audio = entry.normalized.as_ref().ok_or_else(|| {
            PipelineError::collaborator(stage, Some(index), "source was not normalized")
        })?;

        let embedding = self
            .encoder
            .embed(audio)
            .and_then(|v| EmbeddingVector::try_new(v.into_inner()))
            .map_err(|e| PipelineError::from_voiceprint(stage, Some(index), e))?;
        let expected = self.encoder.dimension();
        if expected > 0 && embedding.dimension() != expected {
            return Err(PipelineError::collaborator(
                stage,
                Some(index),
                format!("expected {expected} values, got {}", embedding.dimension()),
            ));
        }

        let path = workspace.embedding_path(index);
        EmbeddingRecord::new(&embedding)
            .save(&path)
            .map_err(|e| persist_error(stage, Some(index), e))?;
        info!(source = index + 1, dimension = embedding.dimension(), "embedding extracted");

        entry.embedding_path = Some(path);
        entry.embedding_shape = Some(vec![embedding.dimension()]);
        entry.embedding = Some(embedding.clone());
        Ok(embedding)
    }

    fn check(&self, references: &ReferenceSet, result: &mut PipelineResult) {
        match check_consistency(references, self.config.consistency_threshold) {
            Ok(report) => {
                if let Some(min) = report.minimum_similarity() {
                    info!(
                        minimum = min,
                        consistent = report.is_consistent().unwrap_or(true),
                        "reference consistency checked"
                    );
                }
                result.consistency = Some(report);
                result.mark(Stage::ConsistencyValidation, StageState::Completed);
            }
            Err(e) => {
                warn!(error = %e, "consistency check failed; continuing");
                result.stages.push(StageReport {
                    stage: Stage::ConsistencyValidation,
                    state: StageState::Error,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    /// Scores generated audio against `reference` with this pipeline's
    /// normalizer, encoder and thresholds.
    pub fn validate_generated(&self, reference: &EmbeddingVector, generated: &Path) -> VerdictRecord {
        validate_generated(
            reference,
            generated,
            self.normalizer.as_ref(),
            self.encoder.as_ref(),
            &self.config.thresholds,
        )
    }
}

fn failed(mut result: PipelineResult, stage: Stage, err: PipelineError) -> PipelineResult {
    error!(job_id = %result.job_id, %stage, error = %err, "voice build failed");
    result.fail(stage, err.to_string());
    result
}

fn persist_error(stage: Stage, index: Option<usize>, err: VoiceprintError) -> PipelineError {
    match err {
        VoiceprintError::Io(e) => PipelineError::Io(e),
        other => PipelineError::collaborator(stage, index, other),
    }
}
