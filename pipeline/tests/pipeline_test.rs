use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use voxclone_audio::{AudioError, NormalizedAudio, Normalizer};
use voxclone_pipeline::{
    HandoffPayload, JobOutput, JobStatus, PipelineConfig, PipelineError, Stage, StageState,
    SynthesisBackend, VoiceCloningPipeline, VoiceJob,
};
use voxclone_voiceprint::{EmbeddingVector, SpeakerEncoder, Verdict, VoiceprintError, load_embedding};

/// Copies the input; files containing `corrupt` fail to decode.
struct CopyNormalizer;

impl Normalizer for CopyNormalizer {
    fn normalize(&self, input: &Path, output: &Path) -> Result<NormalizedAudio, AudioError> {
        let data = fs::read(input)?;
        if data == b"corrupt" {
            return Err(AudioError::Unsupported("not a wav file".into()));
        }
        fs::write(output, &data)?;
        Ok(NormalizedAudio {
            path: output.to_path_buf(),
            sample_rate: 24000,
            samples: 24000,
            duration_secs: 1.0,
            original_sample_rate: Some(44100),
        })
    }

    fn target_sample_rate(&self) -> u32 {
        24000
    }
}

/// Maps file content to a fixed speaker.
struct SpeakerByContent;

impl SpeakerEncoder for SpeakerByContent {
    fn embed(&self, audio: &NormalizedAudio) -> Result<EmbeddingVector, VoiceprintError> {
        match fs::read(&audio.path)?.as_slice() {
            b"alice" => Ok(EmbeddingVector::new(vec![1.0, 0.0])),
            b"bob" => Ok(EmbeddingVector::new(vec![0.0, 1.0])),
            b"glitch" => Ok(EmbeddingVector::new(vec![f32::NAN, 0.0])),
            other => Err(VoiceprintError::Encoder(format!(
                "unknown speaker: {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    fn dimension(&self) -> usize {
        2
    }
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn source(&self, name: &str, content: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn artifacts(&self) -> PathBuf {
        self.dir.path().join("artifacts")
    }

    fn pipeline(&self, backend: SynthesisBackend) -> VoiceCloningPipeline {
        VoiceCloningPipeline::new(Box::new(CopyNormalizer), Box::new(SpeakerByContent)).with_config(
            PipelineConfig::default()
                .with_backend(backend)
                .with_artifacts_dir(self.artifacts()),
        )
    }
}

#[test]
fn t_e2e_build_same_speaker() {
    let fx = Fixture::new();
    let job = VoiceJob::new(
        "job-1",
        "Narrador",
        vec![fx.source("a.wav", "alice"), fx.source("b.wav", "alice")],
    )
    .with_transcripts(vec!["Olá, tudo bem?".into()]);

    let result = fx.pipeline(SynthesisBackend::HostedApi).process(&job).unwrap();

    assert!(result.is_completed());
    let stages: Vec<_> = result.stages.iter().map(|r| (r.stage, r.state)).collect();
    assert_eq!(
        stages,
        vec![
            (Stage::Preprocessing, StageState::Completed),
            (Stage::EmbeddingExtraction, StageState::Completed),
            (Stage::ConsistencyValidation, StageState::Completed),
            (Stage::GenerationHandoff, StageState::Ready),
        ]
    );

    let combined = result.combined.as_ref().unwrap();
    assert!((combined[0] - 1.0).abs() < 1e-6);
    assert!(combined[1].abs() < 1e-6);
    let consistency = result.consistency.as_ref().unwrap();
    assert_eq!(consistency.is_consistent(), Some(true));
    assert!((consistency.minimum_similarity().unwrap() - 1.0).abs() < 1e-6);

    let ws = fx.artifacts().join("job-1");
    assert!(ws.join("audio_0.proc.wav").is_file());
    assert!(ws.join("audio_1.proc.wav.emb.json").is_file());
    let stored = load_embedding(&ws.join("voice_embedding.json")).unwrap();
    assert_eq!(&stored, combined);

    match result.handoff.as_ref().unwrap() {
        HandoffPayload::HostedApi(req) => {
            assert_eq!(req.name, "Narrador");
            let names: Vec<_> = req.audios.iter().map(|a| a.filename.as_str()).collect();
            assert_eq!(names, vec!["audio_0.wav", "audio_1.wav"]);
            assert_eq!(req.audios[0].transcript.as_deref(), Some("Olá, tudo bem?"));
            assert_eq!(req.audios[1].transcript, None);
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    let output = JobOutput::from_result(&job, &result, Some("model-42".into()));
    let value = serde_json::to_value(&output).unwrap();
    let expected = json!({
        "model_id": "model-42",
        "status": "completed",
        "job_id": "job-1",
        "name": "Narrador",
        "embeddings_count": 2,
    });
    for (key, want) in expected.as_object().unwrap() {
        assert_eq!(&value[key], want, "field {key}");
    }
    assert_eq!(value["processed_files"][1]["embedding_shape"], json!([2]));
}

#[test]
fn t_e2e_mixed_speakers_is_advisory() {
    let fx = Fixture::new();
    let job = VoiceJob::new(
        "job-2",
        "Mixed",
        vec![fx.source("a.wav", "alice"), fx.source("b.wav", "bob")],
    );

    let result = fx.pipeline(SynthesisBackend::HostedApi).process(&job).unwrap();

    assert_eq!(result.status, JobStatus::Completed);
    let consistency = result.consistency.as_ref().unwrap();
    assert_eq!(consistency.is_consistent(), Some(false));
    assert!(consistency.minimum_similarity().unwrap().abs() < 1e-6);
}

#[test]
fn t_e2e_missing_source_fails_preprocessing() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("gone.wav").to_string_lossy().into_owned();
    let job = VoiceJob::new("job-3", "Broken", vec![fx.source("a.wav", "alice"), missing]);

    let result = fx.pipeline(SynthesisBackend::HostedApi).process(&job).unwrap();

    assert_eq!(result.status, JobStatus::Failed);
    assert_eq!(result.failed_stage, Some(Stage::Preprocessing));
    assert_eq!(result.sources.len(), 2);
    assert!(result.sources[0].normalized.is_some());
    assert!(result.sources[1].error.as_ref().unwrap().contains("source 1"));
    assert!(result.combined.is_none());
    assert_eq!(result.stage_state(Stage::EmbeddingExtraction), None);

    let output = JobOutput::from_result(&job, &result, Some("ignored".into()));
    assert_eq!(output.model_id, None);
    assert_eq!(output.embeddings_count, 0);
    assert!(output.error.is_some());
}

#[test]
fn t_e2e_decode_failure_fails_preprocessing() {
    let fx = Fixture::new();
    let job = VoiceJob::new("job-4", "Corrupt", vec![fx.source("a.wav", "corrupt")]);

    let result = fx.pipeline(SynthesisBackend::HostedApi).process(&job).unwrap();

    assert_eq!(result.failed_stage, Some(Stage::Preprocessing));
    assert!(result.error.as_ref().unwrap().contains("not a wav file"));
}

#[test]
fn t_e2e_normalizer_failure_on_second_source() {
    let fx = Fixture::new();
    let job = VoiceJob::new(
        "job-4b",
        "Half",
        vec![fx.source("a.wav", "alice"), fx.source("b.wav", "corrupt")],
    );

    let result = fx.pipeline(SynthesisBackend::HostedApi).process(&job).unwrap();

    assert_eq!(result.status, JobStatus::Failed);
    assert_eq!(result.failed_stage, Some(Stage::Preprocessing));
    assert_eq!(result.sources.len(), 2);
    let first = result.sources[0].normalized.as_ref().unwrap();
    assert!(first.path.is_file());
    assert!(result.sources[0].error.is_none());
    assert!(result.sources[1].raw_path.is_some());
    assert!(result.sources[1].normalized.is_none());
    assert!(result.sources[1].error.as_ref().unwrap().contains("not a wav file"));
    assert_eq!(result.embeddings_count(), 0);
    assert!(result.combined.is_none());
}

#[test]
fn t_e2e_non_finite_embedding_fails_extraction() {
    let fx = Fixture::new();
    let job = VoiceJob::new(
        "job-5b",
        "Glitch",
        vec![
            fx.source("a.wav", "glitch"),
            fx.source("b.wav", "alice"),
            fx.source("c.wav", "alice"),
        ],
    );

    let result = fx.pipeline(SynthesisBackend::HostedApi).process(&job).unwrap();

    assert_eq!(result.failed_stage, Some(Stage::EmbeddingExtraction));
    assert!(result.sources[0].error.as_ref().unwrap().contains("not finite"));
    assert!(result.consistency.is_none());
    assert!(result.handoff.is_none());
}

#[test]
fn t_e2e_encoder_failure_keeps_partial_embeddings() {
    let fx = Fixture::new();
    let job = VoiceJob::new(
        "job-5",
        "Unknown",
        vec![fx.source("a.wav", "alice"), fx.source("b.wav", "carol")],
    );

    let result = fx.pipeline(SynthesisBackend::HostedApi).process(&job).unwrap();

    assert_eq!(result.failed_stage, Some(Stage::EmbeddingExtraction));
    assert_eq!(result.stage_state(Stage::Preprocessing), Some(StageState::Completed));
    assert_eq!(result.embeddings_count(), 1);
    assert!(result.sources[1].error.as_ref().unwrap().contains("unknown speaker"));
    assert!(result.handoff.is_none());
}

#[test]
fn t_e2e_local_engine_handoff() {
    let fx = Fixture::new();
    let job = VoiceJob::new(
        "job-6",
        "Local",
        vec![fx.source("a.wav", "alice"), fx.source("b.wav", "alice")],
    );

    let result = fx.pipeline(SynthesisBackend::LocalEngine).process(&job).unwrap();

    match result.handoff.as_ref().unwrap() {
        HandoffPayload::LocalEngine {
            reference_audio,
            embedding_path,
        } => {
            assert_eq!(reference_audio.len(), 2);
            assert!(reference_audio.iter().all(|p| p.is_file()));
            assert!(embedding_path.as_ref().unwrap().ends_with("voice_embedding.json"));
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn t_e2e_temporary_workspace_is_removed() {
    let fx = Fixture::new();
    let job = VoiceJob::new("job-7", "Temp", vec![fx.source("a.wav", "alice")]);
    let pipeline = VoiceCloningPipeline::new(Box::new(CopyNormalizer), Box::new(SpeakerByContent));

    let result = pipeline.process(&job).unwrap();

    assert!(result.is_completed());
    let combined_path = result.combined_path.clone().unwrap();
    assert!(!combined_path.exists());
    // the embedding itself survives in memory
    assert_eq!(result.combined.unwrap().dimension(), 2);
}

#[test]
fn t_e2e_temporary_workspace_is_removed_on_failure() {
    let fx = Fixture::new();
    let job = VoiceJob::new(
        "job-7b",
        "TempFail",
        vec![fx.source("a.wav", "alice"), fx.source("b.wav", "corrupt")],
    );
    let pipeline = VoiceCloningPipeline::new(Box::new(CopyNormalizer), Box::new(SpeakerByContent));

    let result = pipeline.process(&job).unwrap();

    assert_eq!(result.status, JobStatus::Failed);
    let raw = result.sources[0].raw_path.clone().unwrap();
    let root = raw.parent().unwrap();
    assert!(!root.starts_with(fx.dir.path()));
    assert!(root.file_name().unwrap().to_string_lossy().starts_with("voxclone-job-7b-"));
    assert!(!raw.exists());
    assert!(!root.exists());
}

#[test]
fn t_e2e_process_in_caller_workspace() {
    let fx = Fixture::new();
    let job = VoiceJob::new("job-8", "Scoped", vec![fx.source("a.wav", "alice")]);
    let pipeline = VoiceCloningPipeline::new(Box::new(CopyNormalizer), Box::new(SpeakerByContent));

    let ws = pipeline.workspace_for(&job).unwrap();
    assert!(ws.is_temporary());
    let result = pipeline.process_in(&job, &ws).unwrap();
    let combined_path = result.combined_path.clone().unwrap();
    assert!(combined_path.is_file());

    ws.close().unwrap();
    assert!(!combined_path.exists());
}

#[test]
fn t_e2e_invalid_job() {
    let fx = Fixture::new();
    let job = VoiceJob::new("job-9", "Empty", Vec::new());
    let err = fx.pipeline(SynthesisBackend::HostedApi).process(&job).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[test]
fn t_e2e_generation_gate() {
    let fx = Fixture::new();
    let pipeline = fx.pipeline(SynthesisBackend::HostedApi);
    let reference = EmbeddingVector::new(vec![1.0, 0.0]);

    let same = pipeline.validate_generated(&reference, Path::new(&fx.source("gen_a.wav", "alice")));
    assert_eq!(same.status, Verdict::Ok);
    assert!(same.ok);
    assert!(same.reprocess_hint().is_none());

    let other = pipeline.validate_generated(&reference, Path::new(&fx.source("gen_b.wav", "bob")));
    assert_eq!(other.status, Verdict::Reject);
    assert!(other.should_reject);
    let hint = other.reprocess_hint().unwrap();
    assert!((hint.temperature - 0.7).abs() < 1e-6);

    let broken = pipeline.validate_generated(&reference, &fx.dir.path().join("nope.wav"));
    assert_eq!(broken.status, Verdict::Error);
    assert_eq!(broken.similarity, 0.0);

    let value = serde_json::to_value(&other).unwrap();
    assert_eq!(value["status"], "reject");
    assert_eq!(value["threshold"], json!(0.82f32));
    assert!(value.get("error").is_none());
}
