//! Fish Audio API SDK.
//!
//! Covers the two calls voice cloning needs: creating a voice model from
//! reference recordings and synthesizing speech with it.

mod client;
mod error;
pub mod http;
mod model;
mod tts;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use model::{CreateModelRequest, CreateModelResponse, ModelService, ReferenceAudio, extract_model_id};
pub use tts::{TtsRequest, TtsService};
