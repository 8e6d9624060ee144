use serde::Deserialize;
use voxclone_voiceprint::{EmbeddingRecord, EmbeddingVector};

use crate::error::EncoderError;

/// Accepted encoder outputs: a full embedding record or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum EncoderOutput {
    Record(EmbeddingRecord),
    Bare(Vec<f32>),
}

/// Parses encoder output and checks its dimension when `expected` is
/// non-zero.
pub(crate) fn parse_embedding(
    body: &[u8],
    expected: usize,
) -> Result<EmbeddingVector, EncoderError> {
    let output: EncoderOutput = serde_json::from_slice(body)
        .map_err(|e| EncoderError::InvalidOutput(e.to_string()))?;
    let vector = match output {
        EncoderOutput::Record(rec) => rec.to_vector(),
        EncoderOutput::Bare(values) => EmbeddingVector::try_new(values),
    }
    .map_err(|e| EncoderError::InvalidOutput(e.to_string()))?;

    if expected > 0 && vector.dimension() != expected {
        return Err(EncoderError::DimensionMismatch {
            expected,
            got: vector.dimension(),
        });
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_output() {
        let v = parse_embedding(br#"{"embedding":[0.6,0.8],"shape":[2],"dtype":"float32"}"#, 2)
            .unwrap();
        assert_eq!(v.as_slice(), &[0.6, 0.8]);
    }

    #[test]
    fn bare_array_output() {
        let v = parse_embedding(b"[1.0, 0.0, 0.0]", 0).unwrap();
        assert_eq!(v.dimension(), 3);
    }

    #[test]
    fn wrong_dimension() {
        let err = parse_embedding(b"[1.0, 0.0]", 256).unwrap_err();
        assert!(matches!(
            err,
            EncoderError::DimensionMismatch { expected: 256, got: 2 }
        ));
    }

    #[test]
    fn garbage_output() {
        assert!(matches!(
            parse_embedding(b"loading model...", 0),
            Err(EncoderError::InvalidOutput(_))
        ));
        assert!(parse_embedding(b"[]", 0).is_err());
    }
}
