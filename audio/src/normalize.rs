//! Reference audio normalization.
//!
//! A [`Normalizer`] turns raw reference audio into the canonical form the
//! speaker encoder expects: mono, a fixed sample rate, leading/trailing
//! silence removed and loudness pinned to a target RMS.
//!
//! [`PcmNormalizer`] does this in-process for WAV input. Denoising and
//! compressed formats are left to [`CommandNormalizer`], which delegates
//! the whole step to an external preprocessor.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::vad::{VadMode, VoiceActivityDetector, trim_silence, DEFAULT_TOP_DB};
use crate::{AudioClip, AudioError, read_wav, resample, write_wav};

/// Metadata of a normalized audio file on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAudio {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub samples: usize,
    pub duration_secs: f64,
    /// Sample rate of the source, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_sample_rate: Option<u32>,
}

impl NormalizedAudio {
    /// Describes an existing WAV file.
    pub fn inspect(path: impl Into<PathBuf>) -> Result<Self, AudioError> {
        let path = path.into();
        let clip = read_wav(&path)?;
        Ok(Self {
            sample_rate: clip.sample_rate(),
            samples: clip.len(),
            duration_secs: clip.duration_secs(),
            original_sample_rate: None,
            path,
        })
    }
}

/// Canonicalizes raw reference audio.
///
/// Implementations are blocking and must be safe for concurrent use.
pub trait Normalizer: Send + Sync {
    /// Reads `input`, writes the normalized WAV to `output`.
    fn normalize(&self, input: &Path, output: &Path) -> Result<NormalizedAudio, AudioError>;

    /// Sample rate of the produced audio.
    fn target_sample_rate(&self) -> u32;
}

/// Configuration for [`PcmNormalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Output sample rate (default: 24000).
    pub target_sample_rate: u32,
    /// Target RMS level (default: 0.07).
    pub target_rms: f32,
    /// Trim threshold below the loudest frame, in dB (default: 25).
    pub top_db: f32,
    /// VAD frame length in milliseconds (default: 30).
    pub frame_ms: u32,
    pub vad: VadMode,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 24000,
            target_rms: 0.07,
            top_db: DEFAULT_TOP_DB,
            frame_ms: 30,
            vad: VadMode::Energy,
        }
    }
}

impl NormalizeConfig {
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.target_sample_rate = rate;
        self
    }

    pub fn with_target_rms(mut self, rms: f32) -> Self {
        self.target_rms = rms;
        self
    }

    pub fn with_top_db(mut self, top_db: f32) -> Self {
        self.top_db = top_db;
        self
    }

    pub fn with_vad(mut self, vad: VadMode) -> Self {
        self.vad = vad;
        self
    }

    fn frame_len(&self) -> usize {
        (self.target_sample_rate as usize * self.frame_ms.max(1) as usize / 1000).max(1)
    }
}

/// In-process normalizer for WAV input: downmix, resample, trim, RMS.
pub struct PcmNormalizer {
    config: NormalizeConfig,
    detector: Box<dyn VoiceActivityDetector>,
}

impl PcmNormalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        let detector = config.vad.build(config.top_db);
        Self { config, detector }
    }

    /// Uses a caller-supplied detector instead of the configured mode.
    pub fn with_detector(config: NormalizeConfig, detector: Box<dyn VoiceActivityDetector>) -> Self {
        Self { config, detector }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Runs the normalization chain on an in-memory clip.
    pub fn process(&self, clip: &AudioClip) -> Result<AudioClip, AudioError> {
        if clip.is_empty() {
            return Err(AudioError::Empty);
        }

        let resampled = resample(clip, self.config.target_sample_rate)?;
        if resampled.sample_rate() != clip.sample_rate() {
            debug!(
                from = clip.sample_rate(),
                to = resampled.sample_rate(),
                "resampled"
            );
        }

        let mut trimmed = trim_silence(&resampled, self.detector.as_ref(), self.config.frame_len());
        if trimmed.len() < resampled.len() {
            debug!(
                before = resampled.len(),
                after = trimmed.len(),
                vad = self.detector.name(),
                "trimmed silence"
            );
        }

        if let Some(before) = trimmed.normalize_rms(self.config.target_rms) {
            debug!(before, after = self.config.target_rms, "normalized rms");
        }
        Ok(trimmed)
    }
}

impl Normalizer for PcmNormalizer {
    fn normalize(&self, input: &Path, output: &Path) -> Result<NormalizedAudio, AudioError> {
        let clip = read_wav(input)?;
        let original_rate = clip.sample_rate();
        let processed = self.process(&clip)?;
        write_wav(output, &processed)?;

        info!(
            input = %input.display(),
            duration = processed.duration_secs(),
            "normalized reference audio"
        );

        Ok(NormalizedAudio {
            path: output.to_path_buf(),
            sample_rate: processed.sample_rate(),
            samples: processed.len(),
            duration_secs: processed.duration_secs(),
            original_sample_rate: Some(original_rate),
        })
    }

    fn target_sample_rate(&self) -> u32 {
        self.config.target_sample_rate
    }
}

/// Delegates normalization to an external preprocessor.
///
/// The program is invoked as
/// `<program> [args..] --input <in> --output <out> --target-sr <rate>`
/// and must write a WAV file to `<out>`.
pub struct CommandNormalizer {
    program: PathBuf,
    args: Vec<String>,
    target_sample_rate: u32,
}

impl CommandNormalizer {
    pub fn new(program: impl Into<PathBuf>, target_sample_rate: u32) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            target_sample_rate,
        }
    }

    /// Leading arguments, e.g. the script path when `program` is an interpreter.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl Normalizer for CommandNormalizer {
    fn normalize(&self, input: &Path, output: &Path) -> Result<NormalizedAudio, AudioError> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!(program = %self.program.display(), input = %input.display(), "running normalizer");
        let out = Command::new(&self.program)
            .args(&self.args)
            .arg("--input")
            .arg(input)
            .arg("--output")
            .arg(output)
            .arg("--target-sr")
            .arg(self.target_sample_rate.to_string())
            .output()?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(AudioError::Command(format!(
                "{} exited with {}: {}",
                self.program.display(),
                out.status,
                stderr.trim()
            )));
        }

        let audio = NormalizedAudio::inspect(output)?;
        if audio.samples == 0 {
            return Err(AudioError::Empty);
        }
        info!(
            input = %input.display(),
            duration = audio.duration_secs,
            "normalized reference audio"
        );
        Ok(audio)
    }

    fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }
}
