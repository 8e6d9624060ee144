//! Collaborator selection stored in a context.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use voxclone_audio::{CommandNormalizer, NormalizeConfig, Normalizer, PcmNormalizer};
use voxclone_pipeline::{CommandSynthesizer, DEFAULT_LOCAL_MODEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerKind {
    /// In-process WAV normalizer.
    #[default]
    Pcm,
    /// External preprocessing program.
    Command,
}

/// How reference and generated audio is normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    pub kind: NormalizerKind,
    /// Program for [`NormalizerKind::Command`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(flatten)]
    pub audio: NormalizeConfig,
}

impl NormalizerSettings {
    pub fn build(&self) -> anyhow::Result<Box<dyn Normalizer>> {
        match self.kind {
            NormalizerKind::Pcm => Ok(Box::new(PcmNormalizer::new(self.audio.clone()))),
            NormalizerKind::Command => {
                let program = self
                    .program
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("normalizer program is required for kind 'command'"))?;
                Ok(Box::new(
                    CommandNormalizer::new(program, self.audio.target_sample_rate)
                        .with_args(self.args.clone()),
                ))
            }
        }
    }
}

/// Local synthesis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerSettings {
    pub program: PathBuf,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    pub model: String,
    pub language: String,
}

impl Default for SynthesizerSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tts"),
            args: Vec::new(),
            model: DEFAULT_LOCAL_MODEL.to_string(),
            language: "pt".to_string(),
        }
    }
}

impl SynthesizerSettings {
    pub fn build(&self) -> CommandSynthesizer {
        CommandSynthesizer::new(self.program.clone())
            .with_args(self.args.clone())
            .with_model(self.model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxclone_audio::VadMode;

    #[test]
    fn test_defaults() {
        let s: NormalizerSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(s.kind, NormalizerKind::Pcm);
        assert_eq!(s.audio, NormalizeConfig::default());
        assert_eq!(s.build().unwrap().target_sample_rate(), 24000);

        let synth: SynthesizerSettings = serde_yaml::from_str("language: en").unwrap();
        assert_eq!(synth.model, DEFAULT_LOCAL_MODEL);
        assert_eq!(synth.language, "en");
    }

    #[test]
    fn test_command_requires_program() {
        let s: NormalizerSettings = serde_yaml::from_str("kind: command").unwrap();
        assert!(s.build().is_err());

        let s: NormalizerSettings =
            serde_yaml::from_str("kind: command\nprogram: python3\nargs: [prep.py]\ntarget_sample_rate: 16000")
                .unwrap();
        assert_eq!(s.build().unwrap().target_sample_rate(), 16000);
    }

    #[test]
    fn test_vad_mode() {
        let s: NormalizerSettings = serde_yaml::from_str("vad: always_active\ntop_db: 30").unwrap();
        assert_eq!(s.audio.vad, VadMode::AlwaysActive);
        assert_eq!(s.audio.top_db, 30.0);
    }
}
