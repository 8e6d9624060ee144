//! Cosine similarity and threshold classification.

use serde::{Deserialize, Serialize};

use crate::VoiceprintError;

/// Default score at or above which a generated voice is accepted.
pub const DEFAULT_OK_THRESHOLD: f32 = 0.82;

/// Default score below which a generated voice is rejected.
pub const DEFAULT_REJECT_FLOOR: f32 = 0.75;

/// Cosine similarity of two embeddings, in [-1, 1].
///
/// If either vector has zero norm the similarity is `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, VoiceprintError> {
    if a.len() != b.len() {
        return Err(VoiceprintError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }

    let mut dot: f64 = 0.0;
    let mut norm_a: f64 = 0.0;
    let mut norm_b: f64 = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    // Clamp to [-1, 1] to absorb rounding.
    Ok(sim.clamp(-1.0, 1.0) as f32)
}

/// Acceptance thresholds for a similarity score.
///
/// Deserialization goes through [`Thresholds::new`], or
/// [`Thresholds::with_ok`] when `reject_floor` is absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds")]
pub struct Thresholds {
    /// Scores at or above this are accepted.
    pub ok: f32,
    /// Scores below this are rejected; between the two needs review.
    pub reject_floor: f32,
}

#[derive(Deserialize)]
struct RawThresholds {
    ok: f32,
    #[serde(default)]
    reject_floor: Option<f32>,
}

impl TryFrom<RawThresholds> for Thresholds {
    type Error = VoiceprintError;

    fn try_from(raw: RawThresholds) -> Result<Self, Self::Error> {
        match raw.reject_floor {
            Some(floor) => Self::new(raw.ok, floor),
            None => Self::with_ok(raw.ok),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ok: DEFAULT_OK_THRESHOLD,
            reject_floor: DEFAULT_REJECT_FLOOR,
        }
    }
}

impl Thresholds {
    pub fn new(ok: f32, reject_floor: f32) -> Result<Self, VoiceprintError> {
        if !ok.is_finite() || !reject_floor.is_finite() {
            return Err(VoiceprintError::InvalidInput(
                "thresholds must be finite".into(),
            ));
        }
        if reject_floor > ok {
            return Err(VoiceprintError::InvalidInput(format!(
                "reject floor {reject_floor} is above ok threshold {ok}"
            )));
        }
        Ok(Self { ok, reject_floor })
    }

    /// Default floor with a custom `ok` threshold.
    ///
    /// An `ok` below the default floor pulls the floor down with it, which
    /// leaves no review band.
    pub fn with_ok(ok: f32) -> Result<Self, VoiceprintError> {
        Self::new(ok, DEFAULT_REJECT_FLOOR.min(ok))
    }

    pub fn classify(&self, score: f32) -> Verdict {
        classify(score, self)
    }
}

/// Outcome of a similarity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ok,
    #[serde(rename = "review")]
    NeedsReview,
    Reject,
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ok => "ok",
            Verdict::NeedsReview => "review",
            Verdict::Reject => "reject",
            Verdict::Error => "error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Ok)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a score to a verdict. NaN maps to [`Verdict::Error`].
pub fn classify(score: f32, thresholds: &Thresholds) -> Verdict {
    if score.is_nan() {
        Verdict::Error
    } else if score >= thresholds.ok {
        Verdict::Ok
    } else if score >= thresholds.reject_floor {
        Verdict::NeedsReview
    } else {
        Verdict::Reject
    }
}
