//! Speaker encoders for voxclone.
//!
//! The embedding model itself lives outside this crate. Two adapters
//! implement [`voxclone_voiceprint::SpeakerEncoder`] on top of it:
//!
//! - [`CommandEncoder`]: runs an embedding program per file
//! - [`HttpEncoder`]: posts WAV bytes to a warm embedding service
//!
//! Use [`EncoderConfig::build`] to construct one from configuration.

mod command;
pub mod config;
pub mod error;
mod http;
mod response;

pub use command::CommandEncoder;
pub use config::{EncoderConfig, EncoderKind};
pub use error::EncoderError;
pub use http::{DEFAULT_TIMEOUT, HttpEncoder};
