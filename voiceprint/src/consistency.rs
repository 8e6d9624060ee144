//! Cross-reference consistency: do all references sound like one speaker?

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{ReferenceSet, VoiceprintError, cosine_similarity};

/// Minimum pairwise similarity for a reference set to count as consistent.
pub const DEFAULT_CONSISTENCY_THRESHOLD: f32 = 0.6;

/// Pairwise similarity summary over a reference set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsistencyReport {
    /// Fewer than two references; nothing to compare.
    NotApplicable,
    Checked {
        average_similarity: f32,
        minimum_similarity: f32,
        is_consistent: bool,
        pair_count: usize,
    },
}

impl ConsistencyReport {
    /// `None` when the check did not apply.
    pub fn is_consistent(&self) -> Option<bool> {
        match self {
            ConsistencyReport::NotApplicable => None,
            ConsistencyReport::Checked { is_consistent, .. } => Some(*is_consistent),
        }
    }

    pub fn minimum_similarity(&self) -> Option<f32> {
        match self {
            ConsistencyReport::NotApplicable => None,
            ConsistencyReport::Checked {
                minimum_similarity, ..
            } => Some(*minimum_similarity),
        }
    }
}

/// Compares every pair of references.
///
/// A low minimum is logged but never an error: callers decide what to do
/// with an inconsistent set. A pair that scores NaN is `InvalidInput`.
pub fn check_consistency(
    set: &ReferenceSet,
    threshold: f32,
) -> Result<ConsistencyReport, VoiceprintError> {
    let vectors = set.vectors();
    if vectors.len() < 2 {
        return Ok(ConsistencyReport::NotApplicable);
    }

    let mut sum = 0.0f64;
    let mut min = f32::INFINITY;
    let mut pairs = 0usize;
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            let s = cosine_similarity(&vectors[i], &vectors[j])?;
            if s.is_nan() {
                return Err(VoiceprintError::InvalidInput(format!(
                    "similarity of references {i} and {j} is not a number"
                )));
            }
            sum += s as f64;
            min = min.min(s);
            pairs += 1;
        }
    }

    let average = (sum / pairs as f64) as f32;
    let is_consistent = min >= threshold;
    if !is_consistent {
        warn!(
            minimum = min,
            average,
            threshold,
            "reference recordings may not share one speaker"
        );
    }

    Ok(ConsistencyReport::Checked {
        average_similarity: average,
        minimum_similarity: min,
        is_consistent,
        pair_count: pairs,
    })
}
