//! Embedding extraction command.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use voxclone_voiceprint::EmbeddingRecord;

use super::{
    create_encoder, create_normalizer, get_context, output_result, print_success, print_verbose,
};
use crate::Cli;

/// Extract a speaker embedding from one audio file.
///
/// The audio is normalized the same way reference recordings are, embedded,
/// and saved as an embedding record.
#[derive(Args)]
pub struct EmbedCommand {
    /// Audio file
    #[arg(long)]
    input: PathBuf,

    /// Embedding record to write (default: <input>.emb.json)
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Serialize)]
struct EmbedResult {
    input: PathBuf,
    embedding_path: PathBuf,
    shape: Vec<usize>,
    duration_secs: f64,
}

impl EmbedCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let normalizer = create_normalizer(&ctx)?;
        let encoder = create_encoder(&ctx)?;

        let input = self.input.clone();
        let save = self.save.clone().unwrap_or_else(|| {
            let mut name = input.as_os_str().to_owned();
            name.push(".emb.json");
            PathBuf::from(name)
        });
        print_verbose(cli, &format!("Encoder: {}", encoder.name()));

        let result = tokio::task::spawn_blocking(move || -> anyhow::Result<EmbedResult> {
            let scratch = tempfile::tempdir()?;
            let normalized = normalizer.normalize(&input, &scratch.path().join("input.proc.wav"))?;
            let embedding = encoder.embed(&normalized)?;
            let record = EmbeddingRecord::new(&embedding);
            record.save(&save)?;
            Ok(EmbedResult {
                input,
                embedding_path: save,
                shape: record.shape,
                duration_secs: normalized.duration_secs,
            })
        })
        .await??;

        print_success(&format!("Embedding saved to {}", result.embedding_path.display()));
        output_result(&result, cli)
    }
}
