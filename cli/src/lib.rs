//! Shared plumbing for the voxclone command line.
//!
//! Contexts and collaborator settings ([`config`], [`settings`]), the
//! per-user directory layout ([`paths`]), request loading ([`request`]) and
//! result output ([`output`]).

pub mod config;
pub mod output;
pub mod paths;
pub mod request;
pub mod settings;

pub use config::{Config, Context, load_config, mask_api_key};
pub use output::{Output, OutputFormat, guess_extension, print_verbose};
pub use paths::Paths;
pub use request::{
    RequestError, load_request, load_request_from_stdin, load_request_or_stdin, parse_request,
    read_request,
};
pub use settings::{NormalizerKind, NormalizerSettings, SynthesizerSettings};
