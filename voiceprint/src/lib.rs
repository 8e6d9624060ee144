//! Speaker embedding math for voice cloning quality gates.
//!
//! # Overview
//!
//! 1. A [`SpeakerEncoder`] turns normalized audio into an [`EmbeddingVector`].
//! 2. [`combine`] reduces the embeddings of all reference recordings
//!    ([`ReferenceSet`]) to one unit-norm reference.
//! 3. [`check_consistency`] compares references pairwise to catch mixed
//!    speakers before a voice is built.
//! 4. [`cosine_similarity`] and [`classify`] score generated speech against
//!    the reference and map the score to a [`Verdict`].
//!
//! # Thresholds
//!
//! ```text
//! score >= ok (0.82)              -> ok
//! reject_floor (0.75) <= score    -> review
//! score < reject_floor            -> reject
//! ```
//!
//! Embeddings are persisted as [`EmbeddingRecord`] JSON files.

mod combine;
mod consistency;
mod embedding;
mod encoder;
mod error;
mod record;
mod similarity;

pub use combine::{CombineMethod, combine, l2_normalize};
pub use consistency::{ConsistencyReport, DEFAULT_CONSISTENCY_THRESHOLD, check_consistency};
pub use embedding::{EmbeddingVector, ReferenceSet};
pub use encoder::SpeakerEncoder;
pub use error::VoiceprintError;
pub use record::{
    DTYPE_FLOAT32, EmbeddingRecord, decode_base64, encode_base64, load_embedding, save_embedding,
};
pub use similarity::{
    DEFAULT_OK_THRESHOLD, DEFAULT_REJECT_FLOOR, Thresholds, Verdict, classify, cosine_similarity,
};
