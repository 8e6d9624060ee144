use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::VoiceprintError;

/// A speaker embedding produced by an encoder.
///
/// The values are fixed at construction; consumers borrow them through
/// [`EmbeddingVector::as_slice`] or `Deref<Target = [f32]>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Builds a vector, rejecting empty input and non-finite values.
    pub fn try_new(values: Vec<f32>) -> Result<Self, VoiceprintError> {
        if values.is_empty() {
            return Err(VoiceprintError::InvalidInput(
                "embedding has zero dimension".into(),
            ));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(VoiceprintError::InvalidInput(format!(
                "embedding value at index {i} is not finite"
            )));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// L2 norm, accumulated in f64.
    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|&x| (x as f64) * (x as f64))
            .sum::<f64>()
            .sqrt()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl Deref for EmbeddingVector {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Embeddings of every reference recording for one target voice.
///
/// Never empty; every member has the same positive dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSet {
    vectors: Vec<EmbeddingVector>,
    dimension: usize,
}

impl ReferenceSet {
    pub fn new(vectors: Vec<EmbeddingVector>) -> Result<Self, VoiceprintError> {
        let dimension = match vectors.first() {
            Some(v) => v.dimension(),
            None => return Err(VoiceprintError::EmptyReferenceSet),
        };
        if dimension == 0 {
            return Err(VoiceprintError::InvalidInput(
                "embedding has zero dimension".into(),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.dimension() != dimension) {
            return Err(VoiceprintError::DimensionMismatch {
                expected: dimension,
                got: bad.dimension(),
            });
        }
        Ok(Self { vectors, dimension })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[EmbeddingVector] {
        &self.vectors
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmbeddingVector> {
        self.vectors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_rejected() {
        assert!(matches!(
            ReferenceSet::new(Vec::new()),
            Err(VoiceprintError::EmptyReferenceSet)
        ));
    }

    #[test]
    fn mismatched_dimensions_rejected() {
        let err = ReferenceSet::new(vec![
            EmbeddingVector::new(vec![1.0, 0.0]),
            EmbeddingVector::new(vec![1.0, 0.0, 0.0]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            VoiceprintError::DimensionMismatch { expected: 2, got: 3 }
        ));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn zero_dimension_rejected() {
        let err = ReferenceSet::new(vec![EmbeddingVector::new(Vec::new())]).unwrap_err();
        assert!(matches!(err, VoiceprintError::InvalidInput(_)));
    }

    #[test]
    fn try_new_rejects_nan() {
        assert!(EmbeddingVector::try_new(vec![0.1, f32::NAN]).is_err());
        assert!(EmbeddingVector::try_new(vec![0.1, 0.2]).is_ok());
    }

    #[test]
    fn norm_of_three_four() {
        let v = EmbeddingVector::new(vec![3.0, 4.0]);
        assert!((v.norm() - 5.0).abs() < 1e-12);
        assert_eq!(v.dimension(), 2);
        assert_eq!(&v[..], &[3.0, 4.0]);
    }
}
