//! Generation validation command.

use std::path::{Path, PathBuf};

use clap::Args;
use voxclone_cli::config::Context;
use voxclone_cli::{Output, OutputFormat};
use voxclone_pipeline::{PipelineError, VerdictRecord, validate_generated};
use voxclone_voiceprint::{Thresholds, Verdict, load_embedding};

use super::{create_encoder, create_normalizer, get_context, print_error, print_success, print_warning};
use crate::Cli;

/// Validate generated audio against a reference embedding.
///
/// Prints one JSON line `{similarity, ok, threshold, status, needs_review,
/// should_reject}` on stdout before anything else. A `reject` verdict is a
/// successful run; the exit code is non-zero only when the check itself
/// could not be set up.
#[derive(Args)]
pub struct ValidateCommand {
    /// Reference embedding record (JSON)
    #[arg(long)]
    reference: PathBuf,

    /// Generated audio file
    #[arg(long)]
    generated: PathBuf,

    /// Similarity required to accept (default: 0.82 or the context's)
    #[arg(long)]
    threshold: Option<f32>,
}

impl ValidateCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let out = Output::new(OutputFormat::JsonLine, cli.output.clone());

        let (ctx, thresholds) = match self.setup(cli) {
            Ok(v) => v,
            Err(e) => {
                let fallback = self
                    .threshold
                    .and_then(|t| Thresholds::with_ok(t).ok())
                    .unwrap_or_default();
                let record = VerdictRecord::from_error(
                    &PipelineError::Validation(e.to_string()),
                    &fallback,
                );
                out.write(&record)?;
                return Err(e);
            }
        };

        let reference = self.reference.clone();
        let generated = self.generated.clone();
        let record = tokio::task::spawn_blocking(move || {
            run_check(&ctx, &reference, &generated, &thresholds)
        })
        .await?;

        out.write(&record)?;
        report(&record);
        Ok(())
    }

    fn setup(&self, cli: &Cli) -> anyhow::Result<(Context, Thresholds)> {
        let ctx = get_context(cli)?;
        let thresholds = match self.threshold {
            Some(t) => Thresholds::with_ok(t)?,
            None => ctx.thresholds(),
        };
        Ok((ctx, thresholds))
    }
}

/// Loads collaborators and scores the clip. Every failure past argument
/// parsing becomes an error record.
fn run_check(ctx: &Context, reference: &Path, generated: &Path, thresholds: &Thresholds) -> VerdictRecord {
    let as_record = |e: anyhow::Error| {
        VerdictRecord::from_error(&PipelineError::Validation(e.to_string()), thresholds)
    };

    let reference = match load_embedding(reference) {
        Ok(v) => v,
        Err(e) => return as_record(e.into()),
    };
    let normalizer = match create_normalizer(ctx) {
        Ok(n) => n,
        Err(e) => return as_record(e),
    };
    let encoder = match create_encoder(ctx) {
        Ok(enc) => enc,
        Err(e) => return as_record(e),
    };

    validate_generated(
        &reference,
        generated,
        normalizer.as_ref(),
        encoder.as_ref(),
        thresholds,
    )
}

fn report(record: &VerdictRecord) {
    let msg = format!(
        "Similarity: {:.4}, Status: {}",
        record.similarity, record.status
    );
    match record.status {
        Verdict::Ok => print_success(&msg),
        Verdict::NeedsReview => print_warning(&msg),
        Verdict::Reject | Verdict::Error => print_error(&msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxclone_voiceprint::{EmbeddingVector, save_embedding};

    #[test]
    fn test_missing_encoder_is_error_record() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("ref.json");
        save_embedding(&reference, &EmbeddingVector::new(vec![1.0, 0.0])).unwrap();

        let record = run_check(
            &Context::default(),
            &reference,
            &dir.path().join("gen.wav"),
            &Thresholds::default(),
        );
        assert_eq!(record.status, Verdict::Error);
        assert_eq!(record.similarity, 0.0);
        assert!(record.error.unwrap().contains("no speaker encoder"));
    }

    #[test]
    fn test_bad_reference_is_error_record() {
        let dir = tempfile::tempdir().unwrap();
        let record = run_check(
            &Context::default(),
            &dir.path().join("missing.json"),
            &dir.path().join("gen.wav"),
            &Thresholds::default(),
        );
        assert_eq!(record.status, Verdict::Error);
        assert!(!record.ok);
    }
}
