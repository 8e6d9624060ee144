//! CLI commands module.

mod build;
mod combine;
mod config;
mod embed;
mod similarity;
mod synthesize;
mod util;
mod validate;

pub use build::BuildCommand;
pub use combine::CombineCommand;
pub use config::ConfigCommand;
pub use embed::EmbedCommand;
pub use similarity::SimilarityCommand;
pub use synthesize::SynthesizeCommand;
pub use validate::ValidateCommand;

pub(crate) use util::*;
