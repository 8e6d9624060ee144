//! Embedding similarity command.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use voxclone_voiceprint::{Verdict, cosine_similarity, load_embedding};

use super::{get_context, output_result};
use crate::Cli;

/// Cosine similarity between two embedding records.
#[derive(Args)]
pub struct SimilarityCommand {
    /// First embedding record
    a: PathBuf,
    /// Second embedding record
    b: PathBuf,
}

#[derive(Serialize)]
struct SimilarityResult {
    similarity: f32,
    status: Verdict,
}

impl SimilarityCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let thresholds = get_context(cli)?.thresholds();
        let a = load_embedding(&self.a)?;
        let b = load_embedding(&self.b)?;

        let similarity = cosine_similarity(&a, &b)?;
        output_result(
            &SimilarityResult {
                similarity,
                status: thresholds.classify(similarity),
            },
            cli,
        )
    }
}
