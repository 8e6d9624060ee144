//! Persisted embedding records.
//!
//! On disk an embedding is a JSON object:
//!
//! ```json
//! {"embedding": [0.12, -0.03, ...], "shape": [256], "dtype": "float32"}
//! ```
//!
//! Combined embeddings additionally carry `method` and `count`.

use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CombineMethod, EmbeddingVector, VoiceprintError};

pub const DTYPE_FLOAT32: &str = "float32";

fn default_dtype() -> String {
    DTYPE_FLOAT32.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub shape: Vec<usize>,
    #[serde(default = "default_dtype")]
    pub dtype: String,
    /// Combination method, for combined records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Number of references combined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl EmbeddingRecord {
    pub fn new(embedding: &EmbeddingVector) -> Self {
        Self {
            shape: vec![embedding.dimension()],
            embedding: embedding.as_slice().to_vec(),
            dtype: default_dtype(),
            method: None,
            count: None,
        }
    }

    /// Record for a combined embedding.
    pub fn combined(embedding: &EmbeddingVector, method: &CombineMethod, count: usize) -> Self {
        Self {
            method: Some(method.name().to_string()),
            count: Some(count),
            ..Self::new(embedding)
        }
    }

    /// Validates the record and returns its vector.
    ///
    /// A missing shape is inferred from the data; a present one must match
    /// the number of values.
    pub fn to_vector(&self) -> Result<EmbeddingVector, VoiceprintError> {
        if self.dtype != DTYPE_FLOAT32 && self.dtype != "float64" {
            return Err(VoiceprintError::InvalidInput(format!(
                "unsupported dtype: {}",
                self.dtype
            )));
        }
        if !self.shape.is_empty() {
            let n: usize = self.shape.iter().product();
            if n != self.embedding.len() {
                return Err(VoiceprintError::InvalidInput(format!(
                    "shape {:?} does not match {} values",
                    self.shape,
                    self.embedding.len()
                )));
            }
        }
        EmbeddingVector::try_new(self.embedding.clone())
    }

    pub fn from_json(data: &[u8]) -> Result<Self, VoiceprintError> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), VoiceprintError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec(self)?;
        fs::write(path, data)?;
        debug!(path = %path.display(), dim = self.embedding.len(), "saved embedding");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, VoiceprintError> {
        let data = fs::read(path)?;
        Self::from_json(&data)
    }
}

/// Writes `embedding` as a plain record.
pub fn save_embedding(path: &Path, embedding: &EmbeddingVector) -> Result<(), VoiceprintError> {
    EmbeddingRecord::new(embedding).save(path)
}

/// Loads and validates a record file.
pub fn load_embedding(path: &Path) -> Result<EmbeddingVector, VoiceprintError> {
    EmbeddingRecord::load(path)?.to_vector()
}

/// Encodes an embedding as base64 of its little-endian f32 bytes.
pub fn encode_base64(embedding: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for v in embedding {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    STANDARD.encode(bytes)
}

/// Decodes [`encode_base64`] output.
pub fn decode_base64(data: &str) -> Result<EmbeddingVector, VoiceprintError> {
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| VoiceprintError::InvalidInput(format!("base64: {e}")))?;
    if bytes.len() % 4 != 0 {
        return Err(VoiceprintError::InvalidInput(format!(
            "{} bytes is not a whole number of f32 values",
            bytes.len()
        )));
    }
    let values = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    EmbeddingVector::try_new(values)
}
