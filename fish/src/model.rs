//! Voice model management.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    error::{Error, Result},
    http::HttpClient,
};

/// Voice model service.
pub struct ModelService {
    http: Arc<HttpClient>,
}

/// One reference recording sent with a model creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceAudio {
    pub filename: String,
    pub content_base64: String,
    /// What is said in the recording, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl ReferenceAudio {
    pub fn from_bytes(filename: impl Into<String>, data: &[u8], transcript: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            content_base64: STANDARD.encode(data),
            transcript,
        }
    }

    /// Reads and encodes a file; the filename is taken from the path.
    pub fn from_file(path: &Path, transcript: Option<String>) -> Result<Self> {
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());
        Ok(Self::from_bytes(filename, &data, transcript))
    }
}

/// Request body for `POST /v1/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModelRequest {
    pub name: String,
    pub audios: Vec<ReferenceAudio>,
}

/// Response of a model creation.
#[derive(Debug, Clone)]
pub struct CreateModelResponse {
    /// Model id, when the API returned one.
    pub model_id: Option<String>,
    /// The full response body.
    pub raw: serde_json::Value,
}

impl ModelService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Creates a cloned voice model from reference recordings.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::path::Path;
    /// use voxclone_fish::{Client, CreateModelRequest, ReferenceAudio};
    ///
    /// # async fn run(client: &Client) -> voxclone_fish::Result<()> {
    /// let audio = ReferenceAudio::from_file(Path::new("ref_0.proc.wav"), None)?;
    /// let request = CreateModelRequest { name: "narrator".into(), audios: vec![audio] };
    /// let response = client.model().create(&request).await?;
    /// # let _ = response;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(&self, request: &CreateModelRequest) -> Result<CreateModelResponse> {
        if request.audios.is_empty() {
            return Err(Error::Config("at least one reference audio is required".into()));
        }
        info!(name = %request.name, audios = request.audios.len(), "creating fish model");

        let raw: serde_json::Value = self.http.post_json("/v1/models", request).await?;
        let model_id = extract_model_id(&raw);
        if let Some(id) = &model_id {
            info!(model_id = %id, "fish model created");
        }
        Ok(CreateModelResponse { model_id, raw })
    }
}

/// Finds the model id in a creation response: `id`, `model_id` or
/// `result.id`, in that order.
pub fn extract_model_id(value: &serde_json::Value) -> Option<String> {
    let candidates = [
        value.get("id"),
        value.get("model_id"),
        value.get("result").and_then(|r| r.get("id")),
    ];
    candidates.into_iter().flatten().find_map(|v| match v {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn model_id_lookup_order() {
        assert_eq!(extract_model_id(&json!({"id": "a", "model_id": "b"})).as_deref(), Some("a"));
        assert_eq!(extract_model_id(&json!({"model_id": "b"})).as_deref(), Some("b"));
        assert_eq!(extract_model_id(&json!({"result": {"id": 42}})).as_deref(), Some("42"));
        assert_eq!(extract_model_id(&json!({"id": "", "model_id": "b"})).as_deref(), Some("b"));
        assert_eq!(extract_model_id(&json!({"status": "queued"})), None);
    }

    #[test]
    fn request_wire_format() {
        let req = CreateModelRequest {
            name: "narrator".into(),
            audios: vec![
                ReferenceAudio::from_bytes("a.wav", b"RIFF", Some("ola".into())),
                ReferenceAudio::from_bytes("b.wav", b"RIFF", None),
            ],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["name"], "narrator");
        assert_eq!(v["audios"][0]["filename"], "a.wav");
        assert_eq!(v["audios"][0]["content_base64"], "UklGRg==");
        assert_eq!(v["audios"][0]["transcript"], "ola");
        assert!(v["audios"][1].get("transcript").is_none());
    }
}
