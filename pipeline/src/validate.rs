//! Post-synthesis acceptance gate.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use voxclone_audio::Normalizer;
use voxclone_voiceprint::{EmbeddingVector, SpeakerEncoder, Thresholds, Verdict, cosine_similarity};

use crate::PipelineError;

/// Outcome of validating one generated clip.
///
/// Serialized as a single JSON object:
/// `{similarity, ok, threshold, reject_floor, status, needs_review, should_reject, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub similarity: f32,
    pub ok: bool,
    /// The `ok` threshold that was applied.
    pub threshold: f32,
    pub reject_floor: f32,
    pub status: Verdict,
    pub needs_review: bool,
    pub should_reject: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerdictRecord {
    pub fn from_score(similarity: f32, thresholds: &Thresholds) -> Self {
        let status = thresholds.classify(similarity);
        Self {
            similarity,
            ok: status == Verdict::Ok,
            threshold: thresholds.ok,
            reject_floor: thresholds.reject_floor,
            status,
            needs_review: status == Verdict::NeedsReview,
            should_reject: status == Verdict::Reject,
            error: None,
        }
    }

    pub fn from_error(err: &PipelineError, thresholds: &Thresholds) -> Self {
        Self {
            similarity: 0.0,
            ok: false,
            threshold: thresholds.ok,
            reject_floor: thresholds.reject_floor,
            status: Verdict::Error,
            needs_review: false,
            should_reject: false,
            error: Some(err.to_string()),
        }
    }

    /// Sampling adjustment to try when regenerating, if any.
    pub fn reprocess_hint(&self) -> Option<ReprocessHint> {
        ReprocessHint::for_record(self)
    }
}

/// Lower sampling parameters to retry a generation that did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReprocessHint {
    pub temperature: f32,
    pub top_p: f32,
}

impl ReprocessHint {
    /// The lower the similarity, the more conservative the sampling, down
    /// to 0.7.
    pub fn for_similarity(similarity: f32) -> Self {
        let v = (0.9 - (1.0 - similarity) * 0.2).max(0.7);
        Self {
            temperature: v,
            top_p: v,
        }
    }

    /// `Some` for review and reject verdicts.
    pub fn for_record(record: &VerdictRecord) -> Option<Self> {
        match record.status {
            Verdict::NeedsReview | Verdict::Reject => Some(Self::for_similarity(record.similarity)),
            Verdict::Ok | Verdict::Error => None,
        }
    }
}

/// Scores generated audio against a reference embedding.
///
/// The audio is re-normalized into a temporary file that is removed before
/// returning. Failures never escape: they come back as a record with
/// `status = error`.
pub fn validate_generated(
    reference: &EmbeddingVector,
    generated: &Path,
    normalizer: &dyn Normalizer,
    encoder: &dyn SpeakerEncoder,
    thresholds: &Thresholds,
) -> VerdictRecord {
    info!(generated = %generated.display(), threshold = thresholds.ok, "validating generation");

    let record = match score(reference, generated, normalizer, encoder) {
        Ok(similarity) => VerdictRecord::from_score(similarity, thresholds),
        Err(e) => {
            error!(error = %e, "validation failed");
            return VerdictRecord::from_error(&e, thresholds);
        }
    };

    match record.status {
        Verdict::Ok => info!(similarity = record.similarity, "generation accepted"),
        Verdict::NeedsReview => warn!(similarity = record.similarity, "generation needs review"),
        Verdict::Reject => error!(similarity = record.similarity, "generation rejected"),
        Verdict::Error => error!("similarity is not a number"),
    }
    record
}

fn score(
    reference: &EmbeddingVector,
    generated: &Path,
    normalizer: &dyn Normalizer,
    encoder: &dyn SpeakerEncoder,
) -> Result<f32, PipelineError> {
    if !generated.is_file() {
        return Err(PipelineError::Validation(format!(
            "generated audio not found: {}",
            generated.display()
        )));
    }

    let scratch = tempfile::tempdir()?;
    let normalized = normalizer
        .normalize(generated, &scratch.path().join("generated.proc.wav"))
        .map_err(|e| PipelineError::Validation(format!("normalize: {e}")))?;
    let embedding = encoder
        .embed(&normalized)
        .map_err(|e| PipelineError::Validation(format!("embed: {e}")))?;
    let similarity = cosine_similarity(reference, &embedding)
        .map_err(|e| PipelineError::Validation(e.to_string()))?;
    scratch.close()?;
    Ok(similarity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_fields_follow_verdict() {
        let t = Thresholds::default();

        let ok = VerdictRecord::from_score(0.9, &t);
        assert!(ok.ok && !ok.needs_review && !ok.should_reject);

        let review = VerdictRecord::from_score(0.8, &t);
        assert_eq!(review.status, Verdict::NeedsReview);
        assert!(!review.ok && review.needs_review);

        let reject = VerdictRecord::from_score(0.6, &t);
        assert!(reject.should_reject);

        let nan = VerdictRecord::from_score(f32::NAN, &t);
        assert_eq!(nan.status, Verdict::Error);
    }

    #[test]
    fn error_record_json() {
        let rec = VerdictRecord::from_error(
            &PipelineError::Validation("embed: model missing".into()),
            &Thresholds::default(),
        );
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["similarity"], 0.0);
        assert_eq!(v["ok"], false);
        assert!(v["error"].as_str().unwrap().contains("model missing"));
    }

    #[test]
    fn ok_record_has_no_error_field() {
        let v = serde_json::to_value(VerdictRecord::from_score(0.95, &Thresholds::default())).unwrap();
        assert!(v.get("error").is_none());
        assert_eq!(v["status"], "ok");
    }

    #[test]
    fn reprocess_hint_curve() {
        let h = ReprocessHint::for_similarity(0.8);
        assert!((h.temperature - 0.86).abs() < 1e-6);
        assert_eq!(h.temperature, h.top_p);
        assert_eq!(ReprocessHint::for_similarity(-0.5).temperature, 0.7);

        let t = Thresholds::default();
        assert!(VerdictRecord::from_score(0.95, &t).reprocess_hint().is_none());
        assert!(VerdictRecord::from_score(0.5, &t).reprocess_hint().is_some());
    }
}
