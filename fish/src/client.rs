//! Fish Audio API client.

use std::sync::Arc;
use std::time::Duration;

use super::{
    error::{Error, Result},
    http::HttpClient,
    model::ModelService,
    tts::TtsService,
};

/// Default Fish Audio API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.fish.audio";

/// Default maximum number of retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-request timeout. Model creation uploads every reference
/// recording in one request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Fish Audio API client.
///
/// # Example
///
/// ```rust,no_run
/// use voxclone_fish::{Client, TtsRequest};
///
/// # async fn run() -> voxclone_fish::Result<()> {
/// let client = Client::new("your-api-key")?;
/// let audio = client.tts().synthesize(&TtsRequest::new("Hello", "model-id")).await?;
/// # let _ = audio;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    http: Arc<HttpClient>,
    base_url: String,
}

impl Client {
    /// Creates a client with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(api_key).build()
    }

    /// Creates a new client builder for more configuration options.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the voice model service.
    pub fn model(&self) -> ModelService {
        ModelService::new(self.http.clone())
    }

    /// Returns the speech synthesis service.
    pub fn tts(&self) -> TtsService {
        TtsService::new(self.http.clone())
    }
}

/// Builder for creating a Fish Audio API client.
pub struct ClientBuilder {
    api_key: String,
    base_url: String,
    max_retries: u32,
    timeout: Duration,
}

impl ClientBuilder {
    /// Creates a new client builder.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom base URL for the API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the maximum number of retries for transient errors.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.api_key.is_empty() {
            return Err(Error::Config("api_key must be non-empty".to_string()));
        }
        if self.base_url.is_empty() {
            return Err(Error::Config("base_url must be non-empty".to_string()));
        }

        let http = HttpClient::new(
            self.base_url.clone(),
            self.api_key,
            self.max_retries,
            self.timeout,
        )?;

        Ok(Client {
            http: Arc::new(http),
            base_url: self.base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_rejected() {
        assert!(matches!(Client::new(""), Err(Error::Config(_))));
    }

    #[test]
    fn builder_overrides() {
        let client = Client::builder("key")
            .base_url("http://localhost:8080")
            .max_retries(0)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn empty_text_fails_without_network() {
        let client = Client::new("key").unwrap();
        let err = tokio_test::block_on(client.tts().synthesize(&crate::TtsRequest::new("  ", "m")))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn empty_model_request_fails_without_network() {
        let client = Client::new("key").unwrap();
        let req = crate::CreateModelRequest {
            name: "x".into(),
            audios: Vec::new(),
        };
        let err = tokio_test::block_on(client.model().create(&req)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    #[ignore = "requires FISH_AUDIO_API_KEY and network access"]
    async fn live_tts() {
        let key = std::env::var("FISH_AUDIO_API_KEY").unwrap();
        let model = std::env::var("FISH_AUDIO_MODEL_ID").unwrap();
        let client = Client::new(key).unwrap();
        let audio = client
            .tts()
            .synthesize(&crate::TtsRequest::new("Teste de voz.", model))
            .await
            .unwrap();
        assert!(!audio.is_empty());
    }
}
