//! Aggregation of several reference embeddings into one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{EmbeddingVector, ReferenceSet, VoiceprintError};

/// How a [`ReferenceSet`] is reduced to a single embedding.
///
/// Serializes as the method name, or as `{method, weights}` when explicit
/// weights are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "MethodRepr", into = "MethodRepr")]
pub enum CombineMethod {
    /// Element-wise arithmetic mean.
    Average,
    /// Weighted mean with uniform weights, identical to
    /// [`CombineMethod::Average`].
    #[default]
    WeightedAverage,
    /// Weighted mean with explicit weights, one per reference.
    Weighted(Vec<f32>),
    /// Element-wise maximum.
    ///
    /// Not distance preserving: the result does not lie on the segment
    /// between the references, so cosine scores against it are not
    /// comparable with the mean-based methods.
    Max,
}

impl CombineMethod {
    pub fn name(&self) -> &'static str {
        match self {
            CombineMethod::Average => "average",
            CombineMethod::WeightedAverage | CombineMethod::Weighted(_) => "weighted_average",
            CombineMethod::Max => "max",
        }
    }
}

impl fmt::Display for CombineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CombineMethod {
    type Err = VoiceprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "average" | "mean" => Ok(CombineMethod::Average),
            "weighted_average" => Ok(CombineMethod::WeightedAverage),
            "max" => Ok(CombineMethod::Max),
            other => Err(VoiceprintError::InvalidInput(format!(
                "unknown combine method: {other}"
            ))),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum MethodRepr {
    Name(String),
    Weighted { method: String, weights: Vec<f32> },
}

impl TryFrom<MethodRepr> for CombineMethod {
    type Error = VoiceprintError;

    fn try_from(repr: MethodRepr) -> Result<Self, Self::Error> {
        match repr {
            MethodRepr::Name(name) => name.parse(),
            MethodRepr::Weighted { method, weights } => match method.parse()? {
                CombineMethod::WeightedAverage => Ok(CombineMethod::Weighted(weights)),
                other => Err(VoiceprintError::InvalidInput(format!(
                    "{other} does not take weights"
                ))),
            },
        }
    }
}

impl From<CombineMethod> for MethodRepr {
    fn from(m: CombineMethod) -> Self {
        let method = m.name().to_string();
        match m {
            CombineMethod::Weighted(weights) => MethodRepr::Weighted { method, weights },
            _ => MethodRepr::Name(method),
        }
    }
}

/// Combines a reference set into one embedding.
///
/// A single reference is returned unchanged. Otherwise the combination is
/// scaled to unit L2 norm; an all-zero combination stays zero.
pub fn combine(
    set: &ReferenceSet,
    method: &CombineMethod,
) -> Result<EmbeddingVector, VoiceprintError> {
    let weights = match method {
        CombineMethod::Weighted(w) => Some(validate_weights(w, set.len())?),
        _ => None,
    };

    if set.len() == 1 {
        return Ok(set.vectors()[0].clone());
    }

    let dim = set.dimension();
    let mut out = match method {
        CombineMethod::Max => {
            let mut acc = vec![f32::NEG_INFINITY; dim];
            for v in set.iter() {
                for (a, &x) in acc.iter_mut().zip(v.as_slice()) {
                    *a = a.max(x);
                }
            }
            acc
        }
        _ => {
            let uniform = 1.0 / set.len() as f64;
            let mut acc = vec![0.0f64; dim];
            for (i, v) in set.iter().enumerate() {
                let w = weights.as_ref().map_or(uniform, |w| w[i]);
                for (a, &x) in acc.iter_mut().zip(v.as_slice()) {
                    *a += w * x as f64;
                }
            }
            acc.into_iter().map(|x| x as f32).collect()
        }
    };

    l2_normalize(&mut out);
    Ok(EmbeddingVector::new(out))
}

/// Checks explicit weights and returns them scaled to sum to one.
fn validate_weights(weights: &[f32], expected: usize) -> Result<Vec<f64>, VoiceprintError> {
    if weights.len() != expected {
        return Err(VoiceprintError::InvalidInput(format!(
            "got {} weights for {expected} references",
            weights.len()
        )));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(VoiceprintError::InvalidInput(
            "weights must be finite and non-negative".into(),
        ));
    }
    let sum: f64 = weights.iter().map(|&w| w as f64).sum();
    if sum <= 0.0 {
        return Err(VoiceprintError::InvalidInput("weights sum to zero".into()));
    }
    Ok(weights.iter().map(|&w| w as f64 / sum).collect())
}

/// Scales `v` to unit L2 norm in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let mut norm: f64 = 0.0;
    for &x in v.iter() {
        norm += (x as f64) * (x as f64);
    }
    norm = norm.sqrt();
    if norm > 0.0 {
        let scale = 1.0 / norm;
        for x in v.iter_mut() {
            *x = (*x as f64 * scale) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(vectors: &[&[f32]]) -> ReferenceSet {
        ReferenceSet::new(
            vectors
                .iter()
                .map(|v| EmbeddingVector::new(v.to_vec()))
                .collect(),
        )
        .unwrap()
    }

    fn norm(v: &[f32]) -> f64 {
        v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
    }

    #[test]
    fn single_vector_passthrough() {
        let s = set(&[&[3.0, 4.0]]);
        for method in [CombineMethod::Average, CombineMethod::Max] {
            assert_eq!(combine(&s, &method).unwrap().as_slice(), &[3.0, 4.0]);
        }
    }

    #[test]
    fn average_matches_uniform_weights() {
        let s = set(&[&[0.2, 0.9, -0.1], &[0.5, 0.1, 0.3], &[-0.4, 0.6, 0.8]]);
        let avg = combine(&s, &CombineMethod::Average).unwrap();
        let wavg = combine(&s, &CombineMethod::WeightedAverage).unwrap();
        let explicit = combine(&s, &CombineMethod::Weighted(vec![2.0, 2.0, 2.0])).unwrap();
        assert_eq!(avg, wavg);
        for (a, b) in avg.iter().zip(explicit.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn result_is_unit_norm() {
        let s = set(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        for method in [
            CombineMethod::Average,
            CombineMethod::WeightedAverage,
            CombineMethod::Weighted(vec![0.3, 0.7]),
            CombineMethod::Max,
        ] {
            let out = combine(&s, &method).unwrap();
            assert!((norm(&out) - 1.0).abs() < 1e-6, "{method}: {}", norm(&out));
        }
    }

    #[test]
    fn opposite_vectors_give_zero() {
        let s = set(&[&[1.0, -2.0], &[-1.0, 2.0]]);
        let out = combine(&s, &CombineMethod::Average).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn identical_unit_vectors() {
        let s = set(&[&[1.0, 0.0], &[1.0, 0.0]]);
        let out = combine(&s, &CombineMethod::WeightedAverage).unwrap();
        assert_eq!(out.as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn max_is_elementwise_and_order_independent() {
        let a = set(&[&[1.0, -3.0], &[-2.0, 0.0]]);
        let b = set(&[&[-2.0, 0.0], &[1.0, -3.0]]);
        let out = combine(&a, &CombineMethod::Max).unwrap();
        assert_eq!(out, combine(&b, &CombineMethod::Max).unwrap());
        assert_eq!(out.as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn weights_skew_result() {
        let s = set(&[&[1.0, 0.0], &[0.0, 1.0]]);
        let out = combine(&s, &CombineMethod::Weighted(vec![3.0, 1.0])).unwrap();
        assert!(out[0] > out[1]);
    }

    #[test]
    fn bad_weights_rejected() {
        let s = set(&[&[1.0, 0.0], &[0.0, 1.0]]);
        for w in [vec![1.0], vec![1.0, -1.0], vec![0.0, 0.0], vec![f32::NAN, 1.0]] {
            let err = combine(&s, &CombineMethod::Weighted(w)).unwrap_err();
            assert!(matches!(err, VoiceprintError::InvalidInput(_)));
        }
    }

    #[test]
    fn parse_methods() {
        assert_eq!("average".parse::<CombineMethod>().unwrap(), CombineMethod::Average);
        assert_eq!(
            "weighted_average".parse::<CombineMethod>().unwrap(),
            CombineMethod::WeightedAverage
        );
        assert_eq!("max".parse::<CombineMethod>().unwrap(), CombineMethod::Max);
        assert!("median".parse::<CombineMethod>().is_err());
        assert_eq!(CombineMethod::Weighted(vec![1.0]).to_string(), "weighted_average");
    }

    #[test]
    fn serde_as_name() {
        let json = serde_json::to_string(&CombineMethod::Max).unwrap();
        assert_eq!(json, "\"max\"");
        let back: CombineMethod = serde_json::from_str("\"average\"").unwrap();
        assert_eq!(back, CombineMethod::Average);
        assert!(serde_json::from_str::<CombineMethod>("\"sum\"").is_err());
    }

    #[test]
    fn serde_keeps_explicit_weights() {
        let method = CombineMethod::Weighted(vec![3.0, 1.0]);
        let json = serde_json::to_value(&method).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"method": "weighted_average", "weights": [3.0, 1.0]})
        );
        let back: CombineMethod = serde_json::from_value(json).unwrap();
        assert_eq!(back, method);

        let max_with_weights = serde_json::json!({"method": "max", "weights": [1.0]});
        assert!(serde_json::from_value::<CombineMethod>(max_with_weights).is_err());
    }

    #[test]
    fn l2_normalize_zero() {
        let mut v = vec![0.0f32; 3];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
