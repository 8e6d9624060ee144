use std::time::Duration;

use tracing::debug;
use voxclone_audio::NormalizedAudio;
use voxclone_voiceprint::{EmbeddingVector, SpeakerEncoder, VoiceprintError};

use crate::error::EncoderError;
use crate::response::parse_embedding;

/// Default request timeout for embedding services.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Posts WAV files to a long-running embedding service.
///
/// The request body is the raw WAV file (`Content-Type: audio/wav`); the
/// response must be an embedding record or a bare JSON array. The service
/// keeps its model loaded, so per-call cost is inference only.
pub struct HttpEncoder {
    agent: ureq::Agent,
    url: String,
    api_key: Option<String>,
    dimension: usize,
}

impl HttpEncoder {
    pub fn new(url: impl Into<String>, dimension: usize) -> Self {
        Self::with_timeout(url, dimension, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, dimension: usize, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            url: url.into(),
            api_key: None,
            dimension,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn request(&self, audio: &NormalizedAudio) -> Result<EmbeddingVector, EncoderError> {
        let body = std::fs::read(&audio.path)?;
        debug!(url = %self.url, bytes = body.len(), "posting audio to encoder");

        let mut req = self.agent.post(&self.url).header("Content-Type", "audio/wav");
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }
        let mut resp = req
            .send(&body[..])
            .map_err(|e| EncoderError::Api(e.to_string()))?;
        let text = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| EncoderError::Api(e.to_string()))?;
        parse_embedding(text.as_bytes(), self.dimension)
    }
}

impl SpeakerEncoder for HttpEncoder {
    fn embed(&self, audio: &NormalizedAudio) -> Result<EmbeddingVector, VoiceprintError> {
        Ok(self.request(audio)?)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn missing_file_fails_before_request() {
        let enc = HttpEncoder::new("http://127.0.0.1:9/embed", 256).with_api_key("k");
        let audio = NormalizedAudio {
            path: PathBuf::from("/nonexistent/ref.wav"),
            sample_rate: 16000,
            samples: 0,
            duration_secs: 0.0,
            original_sample_rate: None,
        };
        assert!(matches!(enc.request(&audio), Err(EncoderError::Io(_))));
        assert_eq!(enc.dimension(), 256);
    }

    #[test]
    #[ignore = "requires a running embedding service on localhost:8765"]
    fn live_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let clip = voxclone_audio::AudioClip::new(
            (0..16000).map(|i| (i as f32 * 0.05).sin() * 0.3).collect(),
            16000,
        );
        voxclone_audio::write_wav(&path, &clip).unwrap();
        let audio = voxclone_audio::NormalizedAudio::inspect(&path).unwrap();
        let enc = HttpEncoder::new("http://127.0.0.1:8765/embed", 0);
        let v = enc.embed(&audio).unwrap();
        assert!(v.dimension() > 0);
    }
}
