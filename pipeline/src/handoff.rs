use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use voxclone_fish::{CreateModelRequest, ReferenceAudio};

use crate::{PipelineError, SourceResult, VoiceJob};

/// Where synthesis happens after a voice is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisBackend {
    /// Fish Audio model built from the reference recordings.
    #[default]
    HostedApi,
    /// Local zero-shot engine conditioned on the reference recordings.
    LocalEngine,
}

impl SynthesisBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisBackend::HostedApi => "hosted_api",
            SynthesisBackend::LocalEngine => "local_engine",
        }
    }
}

impl FromStr for SynthesisBackend {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hosted_api" | "hosted" | "fish" => Ok(SynthesisBackend::HostedApi),
            "local_engine" | "local" => Ok(SynthesisBackend::LocalEngine),
            other => Err(PipelineError::InvalidInput(format!(
                "unknown synthesis backend: {other}"
            ))),
        }
    }
}

/// What the external synthesis system needs to use the built voice.
#[derive(Debug, Clone)]
pub enum HandoffPayload {
    /// Model creation request, audio inlined as base64.
    HostedApi(CreateModelRequest),
    /// Reference recordings on disk plus the combined embedding.
    LocalEngine {
        reference_audio: Vec<PathBuf>,
        embedding_path: Option<PathBuf>,
    },
}

impl HandoffPayload {
    pub fn backend(&self) -> SynthesisBackend {
        match self {
            HandoffPayload::HostedApi(_) => SynthesisBackend::HostedApi,
            HandoffPayload::LocalEngine { .. } => SynthesisBackend::LocalEngine,
        }
    }
}

/// Builds the payload for `backend` from the normalized sources.
pub(crate) fn prepare(
    backend: SynthesisBackend,
    job: &VoiceJob,
    sources: &[SourceResult],
    embedding_path: Option<PathBuf>,
) -> Result<HandoffPayload, PipelineError> {
    let normalized: Vec<(usize, PathBuf)> = sources
        .iter()
        .filter_map(|s| s.normalized.as_ref().map(|n| (s.index, n.path.clone())))
        .collect();
    if normalized.is_empty() {
        return Err(PipelineError::InvalidInput(
            "no normalized reference audio to hand off".into(),
        ));
    }

    match backend {
        SynthesisBackend::HostedApi => {
            let mut audios = Vec::with_capacity(normalized.len());
            for (index, path) in normalized {
                let data = std::fs::read(&path)?;
                audios.push(ReferenceAudio::from_bytes(
                    format!("audio_{index}.wav"),
                    &data,
                    job.transcript(index).map(str::to_string),
                ));
            }
            Ok(HandoffPayload::HostedApi(CreateModelRequest {
                name: job.name.clone(),
                audios,
            }))
        }
        SynthesisBackend::LocalEngine => Ok(HandoffPayload::LocalEngine {
            reference_audio: normalized.into_iter().map(|(_, p)| p).collect(),
            embedding_path,
        }),
    }
}
