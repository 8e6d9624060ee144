use voxclone_audio::NormalizedAudio;

use crate::{EmbeddingVector, VoiceprintError};

/// Extracts a speaker embedding from normalized audio.
///
/// The input must come from a [`voxclone_audio::Normalizer`] configured for
/// the rate the encoder was trained on. The output dimension is fixed for a
/// given encoder and reported by [`SpeakerEncoder::dimension`].
///
/// # Lifetime
///
/// Encoders usually wrap a neural model whose loading dominates the cost of
/// a single call. Construct one at startup, pass it to whatever needs it and
/// reuse it for every job.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait SpeakerEncoder: Send + Sync {
    /// Computes the embedding of one audio file.
    fn embed(&self, audio: &NormalizedAudio) -> Result<EmbeddingVector, VoiceprintError>;

    /// Dimensionality of the produced vectors (e.g. 256).
    fn dimension(&self) -> usize;

    /// Short identifier used in logs.
    fn name(&self) -> &str {
        "encoder"
    }
}

impl<T: SpeakerEncoder + ?Sized> SpeakerEncoder for Box<T> {
    fn embed(&self, audio: &NormalizedAudio) -> Result<EmbeddingVector, VoiceprintError> {
        (**self).embed(audio)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
