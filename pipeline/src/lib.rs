//! Voice build pipeline and post-synthesis quality gate.
//!
//! A [`VoiceJob`] names a handful of reference recordings. The
//! [`VoiceCloningPipeline`] fetches and normalizes them, extracts one
//! speaker embedding per recording, combines them into a reference voice
//! and prepares a [`HandoffPayload`] for the synthesis backend.
//!
//! After synthesis, [`validate_generated`] compares the generated audio to
//! the reference voice and produces a [`VerdictRecord`].
//!
//! # Example
//!
//! ```no_run
//! use voxclone_audio::{NormalizeConfig, PcmNormalizer};
//! use voxclone_pipeline::{VoiceCloningPipeline, VoiceJob};
//! # fn encoder() -> Box<dyn voxclone_voiceprint::SpeakerEncoder> { unimplemented!() }
//!
//! let pipeline = VoiceCloningPipeline::new(
//!     Box::new(PcmNormalizer::new(NormalizeConfig::default())),
//!     encoder(),
//! );
//! let job = VoiceJob::new("job-1", "Narrador", vec!["ref_0.wav".into(), "ref_1.wav".into()]);
//! let result = pipeline.process(&job)?;
//! println!("{:?}", result.status);
//! # Ok::<(), voxclone_pipeline::PipelineError>(())
//! ```

mod config;
mod error;
mod fetch;
mod handoff;
mod job;
mod orchestrator;
mod result;
mod synth;
mod validate;
mod workspace;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use fetch::{DEFAULT_DOWNLOAD_TIMEOUT, DefaultFetcher, FetchError, SourceFetcher, source_extension};
pub use handoff::{HandoffPayload, SynthesisBackend};
pub use job::{JobOutput, ProcessedFile, VoiceJob};
pub use orchestrator::VoiceCloningPipeline;
pub use result::{JobStatus, PipelineResult, SourceResult, Stage, StageReport, StageState};
pub use synth::{CommandSynthesizer, DEFAULT_LOCAL_MODEL, SynthesisRequest, Synthesizer};
pub use validate::{ReprocessHint, VerdictRecord, validate_generated};
pub use workspace::JobWorkspace;
