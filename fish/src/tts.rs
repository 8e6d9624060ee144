//! Speech synthesis with a cloned voice.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    error::{Error, Result},
    http::HttpClient,
};

/// Speech synthesis service.
pub struct TtsService {
    http: Arc<HttpClient>,
}

/// Request body for `POST /v1/tts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    /// Model id of the voice to speak with.
    pub reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl TtsRequest {
    pub fn new(text: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference_id: reference_id.into(),
            ..Default::default()
        }
    }
}

impl TtsService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Synthesizes `request.text` and returns the encoded audio.
    pub async fn synthesize(&self, request: &TtsRequest) -> Result<Vec<u8>> {
        if request.text.trim().is_empty() {
            return Err(Error::Config("text must be non-empty".into()));
        }
        if request.reference_id.is_empty() {
            return Err(Error::Config("reference_id must be non-empty".into()));
        }

        let audio = self.http.post_bytes("/v1/tts", request).await?;
        if audio.is_empty() {
            return Err(Error::Response("empty audio".into()));
        }
        info!(
            reference_id = %request.reference_id,
            bytes = audio.len(),
            "fish synthesis complete"
        );
        Ok(audio.to_vec())
    }
}
