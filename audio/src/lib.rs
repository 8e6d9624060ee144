//! Reference audio handling for voice cloning.
//!
//! - [`AudioClip`]: mono f32 samples at a known rate
//! - [`read_wav`] / [`write_wav`]: WAV decoding and PCM16 output
//! - [`resample`]: sample rate conversion (rubato)
//! - [`vad`]: voice activity detection used for silence trimming
//! - [`Normalizer`]: raw audio -> canonical reference audio
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use voxclone_audio::{NormalizeConfig, Normalizer, PcmNormalizer};
//!
//! let normalizer = PcmNormalizer::new(NormalizeConfig::default());
//! let audio = normalizer.normalize(Path::new("ref.wav"), Path::new("ref.proc.wav"))?;
//! println!("{:.2}s at {}Hz", audio.duration_secs, audio.sample_rate);
//! # Ok::<(), voxclone_audio::AudioError>(())
//! ```

mod clip;
mod error;
mod normalize;
mod resample;
pub mod vad;
mod wav;

pub use clip::AudioClip;
pub use error::AudioError;
pub use normalize::{CommandNormalizer, NormalizeConfig, NormalizedAudio, Normalizer, PcmNormalizer};
pub use resample::resample;
pub use vad::{AlwaysActiveDetector, RealVoiceActivityDetector, VadMode, VoiceActivityDetector};
pub use wav::{encode_wav, read_wav, read_wav_from, write_wav};
