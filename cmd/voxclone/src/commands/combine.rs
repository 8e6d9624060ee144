//! Embedding combination command.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use voxclone_voiceprint::{
    CombineMethod, ConsistencyReport, DEFAULT_CONSISTENCY_THRESHOLD, EmbeddingRecord,
    ReferenceSet, check_consistency, combine, load_embedding,
};

use super::{output_result, print_success, print_verbose, print_warning};
use crate::Cli;

/// Combine embedding records into one reference voice.
#[derive(Args)]
pub struct CombineCommand {
    /// Embedding record files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Combination method (average, weighted_average, max)
    #[arg(long, default_value = "weighted_average")]
    method: CombineMethod,

    /// Per-input weights for weighted_average, comma separated
    #[arg(long, value_delimiter = ',')]
    weights: Vec<f32>,

    /// Combined record to write
    #[arg(long)]
    save: PathBuf,

    /// Minimum pairwise similarity for a consistent set
    #[arg(long, default_value_t = DEFAULT_CONSISTENCY_THRESHOLD)]
    consistency_threshold: f32,
}

#[derive(Serialize)]
struct CombineResult {
    embedding_path: PathBuf,
    method: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    weights: Vec<f32>,
    count: usize,
    dimension: usize,
    consistency: ConsistencyReport,
}

impl CombineCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let vectors = self
            .inputs
            .iter()
            .map(|p| {
                print_verbose(cli, &format!("Loading {}", p.display()));
                load_embedding(p)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let set = ReferenceSet::new(vectors)?;
        let method = self.method()?;

        let consistency = check_consistency(&set, self.consistency_threshold)?;
        if consistency.is_consistent() == Some(false) {
            print_warning("Embeddings may not come from one speaker");
        }

        let combined = combine(&set, &method)?;
        EmbeddingRecord::combined(&combined, &method, set.len()).save(&self.save)?;
        print_success(&format!(
            "Combined {} embedding(s) with {}",
            set.len(),
            method
        ));

        output_result(
            &CombineResult {
                embedding_path: self.save.clone(),
                method: method.to_string(),
                weights: self.weights.clone(),
                count: set.len(),
                dimension: set.dimension(),
                consistency,
            },
            cli,
        )
    }

    fn method(&self) -> anyhow::Result<CombineMethod> {
        if self.weights.is_empty() {
            return Ok(self.method.clone());
        }
        match &self.method {
            CombineMethod::WeightedAverage => Ok(CombineMethod::Weighted(self.weights.clone())),
            other => anyhow::bail!("--weights only applies to weighted_average, not {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: CombineCommand,
    }

    #[test]
    fn test_weights_select_explicit_method() {
        let h = Harness::parse_from(["combine", "a.json", "b.json", "--save", "out.json", "--weights", "3,1"]);
        assert_eq!(h.args.method().unwrap(), CombineMethod::Weighted(vec![3.0, 1.0]));

        let h = Harness::parse_from(["combine", "a.json", "--save", "out.json"]);
        assert_eq!(h.args.method().unwrap(), CombineMethod::WeightedAverage);
    }

    #[test]
    fn test_weights_rejected_for_other_methods() {
        let h = Harness::parse_from([
            "combine", "a.json", "--save", "out.json", "--method", "max", "--weights", "1",
        ]);
        assert!(h.args.method().is_err());
    }
}
