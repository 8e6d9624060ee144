//! Speech synthesis command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tracing::info;
use voxclone_cli::config::Context;
use voxclone_fish::TtsRequest;
use voxclone_pipeline::{
    ReprocessHint, SynthesisBackend, SynthesisRequest, Synthesizer, VerdictRecord,
    VoiceCloningPipeline,
};
use voxclone_voiceprint::{EmbeddingVector, load_embedding};

use super::{
    create_client, create_encoder, create_normalizer, default_output_path, format_bytes,
    get_context, output_result, print_success, print_verbose, print_warning,
};
use crate::Cli;

/// Synthesize speech with a built voice.
///
/// The hosted backend speaks with a Fish Audio model id; the local engine
/// is conditioned on reference recordings. With `--reference`, each
/// generation is validated and, on a review or reject verdict, retried
/// with more conservative sampling up to `--retries` times.
#[derive(Args)]
pub struct SynthesizeCommand {
    /// Text to speak
    #[arg(long)]
    text: String,

    /// Hosted model id
    #[arg(long)]
    model_id: Option<String>,

    /// Reference recordings for the local engine
    #[arg(long = "reference-audio")]
    reference_audio: Vec<PathBuf>,

    /// Backend override (hosted_api, local_engine)
    #[arg(long)]
    backend: Option<SynthesisBackend>,

    /// Audio file to write (default: ~/.voxclone/voxclone/outputs/<uuid>.<format>)
    #[arg(long)]
    save: Option<PathBuf>,

    /// Audio format for the hosted backend
    #[arg(long, default_value = "wav")]
    format: String,

    /// Language for the local engine
    #[arg(long)]
    language: Option<String>,

    /// Reference embedding record to validate against
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Regenerations allowed after a failed validation
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

#[derive(Serialize)]
struct SynthesizeResult {
    output: PathBuf,
    bytes: usize,
    backend: SynthesisBackend,
    attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    verdict: Option<VerdictRecord>,
}

struct Gate {
    pipeline: Arc<VoiceCloningPipeline>,
    reference: Arc<EmbeddingVector>,
}

impl SynthesizeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let backend = self.backend.unwrap_or(ctx.backend());
        self.check_args(backend)?;

        let output = match &self.save {
            Some(path) => path.clone(),
            None => default_output_path(&self.format)?,
        };
        let gate = self.gate(&ctx)?;

        print_verbose(cli, &format!("Using context: {}", ctx.name));
        print_verbose(cli, &format!("Backend: {}", backend.as_str()));

        let mut hint: Option<ReprocessHint> = None;
        let mut attempts = 0;
        let (bytes, verdict) = loop {
            attempts += 1;
            let bytes = match backend {
                SynthesisBackend::HostedApi => self.hosted(&ctx, &output, hint).await?,
                SynthesisBackend::LocalEngine => self.local(&ctx, &output, hint).await?,
            };
            info!(attempt = attempts, bytes = bytes, "generation written");

            let Some(gate) = &gate else {
                break (bytes, None);
            };
            let record = gate.check(output.clone()).await?;
            match record.reprocess_hint() {
                Some(next) if attempts <= self.retries => {
                    print_warning(&format!(
                        "Similarity {:.4} ({}), retrying with temperature {:.2}",
                        record.similarity, record.status, next.temperature
                    ));
                    hint = Some(next);
                }
                _ => break (bytes, Some(record)),
            }
        };

        print_success(&format!(
            "Audio saved to {} ({})",
            output.display(),
            format_bytes(bytes)
        ));
        output_result(
            &SynthesizeResult {
                output,
                bytes,
                backend,
                attempts,
                verdict,
            },
            cli,
        )
    }

    fn check_args(&self, backend: SynthesisBackend) -> anyhow::Result<()> {
        if self.text.trim().is_empty() {
            anyhow::bail!("--text must not be empty");
        }
        match backend {
            SynthesisBackend::HostedApi if self.model_id.is_none() => {
                anyhow::bail!("--model-id is required for the hosted backend")
            }
            SynthesisBackend::LocalEngine if self.reference_audio.is_empty() => {
                anyhow::bail!("--reference-audio is required for the local engine")
            }
            _ => Ok(()),
        }
    }

    fn gate(&self, ctx: &Context) -> anyhow::Result<Option<Gate>> {
        let Some(path) = &self.reference else {
            return Ok(None);
        };
        let reference = load_embedding(path)?;
        let pipeline = VoiceCloningPipeline::new(create_normalizer(ctx)?, create_encoder(ctx)?)
            .with_config(ctx.pipeline_config());
        Ok(Some(Gate {
            pipeline: Arc::new(pipeline),
            reference: Arc::new(reference),
        }))
    }

    async fn hosted(
        &self,
        ctx: &Context,
        output: &Path,
        hint: Option<ReprocessHint>,
    ) -> anyhow::Result<usize> {
        let model_id = self.model_id.clone().unwrap_or_default();
        let mut request = TtsRequest::new(self.text.clone(), model_id);
        request.format = Some(self.format.clone());
        if let Some(h) = hint {
            request.temperature = Some(h.temperature);
            request.top_p = Some(h.top_p);
        }

        let client = create_client(ctx)?;
        let audio = client.tts().synthesize(&request).await?;
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(output, &audio)?;
        Ok(audio.len())
    }

    async fn local(
        &self,
        ctx: &Context,
        output: &Path,
        hint: Option<ReprocessHint>,
    ) -> anyhow::Result<usize> {
        let settings = ctx.synthesizer.clone().unwrap_or_default();
        let language = self
            .language
            .clone()
            .unwrap_or_else(|| settings.language.clone());
        let mut request = SynthesisRequest::new(
            self.text.clone(),
            self.reference_audio.clone(),
            output.to_path_buf(),
        )
        .with_language(language);
        if let Some(h) = hint {
            request = request.with_hint(h);
        }

        let audio = tokio::task::spawn_blocking(move || settings.build().synthesize(&request)).await??;
        Ok(audio.len())
    }
}

impl Gate {
    async fn check(&self, generated: PathBuf) -> anyhow::Result<VerdictRecord> {
        let pipeline = Arc::clone(&self.pipeline);
        let reference = Arc::clone(&self.reference);
        let record =
            tokio::task::spawn_blocking(move || pipeline.validate_generated(&reference, &generated))
                .await?;
        Ok(record)
    }
}
