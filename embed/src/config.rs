use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use voxclone_voiceprint::SpeakerEncoder;

use crate::error::EncoderError;
use crate::{CommandEncoder, HttpEncoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    #[default]
    Command,
    Http,
}

/// Builder-style configuration for speaker encoders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub kind: EncoderKind,
    /// Program for [`EncoderKind::Command`].
    pub program: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Endpoint for [`EncoderKind::Http`].
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Expected embedding size; 0 accepts whatever the encoder returns.
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            kind: EncoderKind::Command,
            program: None,
            args: Vec::new(),
            url: None,
            api_key: None,
            dimension: 256,
            timeout_secs: 60,
        }
    }
}

impl EncoderConfig {
    pub fn command(program: impl Into<PathBuf>) -> Self {
        Self {
            kind: EncoderKind::Command,
            program: Some(program.into()),
            ..Default::default()
        }
    }

    pub fn http(url: &str) -> Self {
        Self {
            kind: EncoderKind::Http,
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_dimension(mut self, dim: usize) -> Self {
        self.dimension = dim;
        self
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Constructs the encoder. This is where any one-time setup happens;
    /// keep the result for the lifetime of the process.
    pub fn build(&self) -> Result<Box<dyn SpeakerEncoder>, EncoderError> {
        match self.kind {
            EncoderKind::Command => {
                let program = self
                    .program
                    .clone()
                    .ok_or(EncoderError::MissingConfig("encoder program"))?;
                Ok(Box::new(
                    CommandEncoder::new(program, self.dimension).with_args(self.args.clone()),
                ))
            }
            EncoderKind::Http => {
                let url = self
                    .url
                    .clone()
                    .ok_or(EncoderError::MissingConfig("encoder url"))?;
                let timeout = Duration::from_secs(self.timeout_secs.max(1));
                let mut enc = HttpEncoder::with_timeout(url, self.dimension, timeout);
                if let Some(key) = &self.api_key {
                    enc = enc.with_api_key(key.clone());
                }
                Ok(Box::new(enc))
            }
        }
    }
}
