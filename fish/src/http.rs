//! HTTP client implementation for the Fish Audio API.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    Client as ReqwestClient, Response,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::error::{Error, Result};

const USER_AGENT_VALUE: &str = "voxclone-fish-rust/0.1";

/// HTTP client for the Fish Audio API.
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub fn new(base_url: String, api_key: String, max_retries: u32, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries,
        })
    }

    /// POSTs a JSON body and decodes a JSON response, retrying transient
    /// failures.
    pub async fn post_json<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = self.post_with_retry(path, body).await?;
        serde_json::from_slice(&body).map_err(Error::from)
    }

    /// POSTs a JSON body and returns the raw response bytes (e.g. audio).
    pub async fn post_bytes<T>(&self, path: &str, body: &T) -> Result<Bytes>
    where
        T: Serialize + ?Sized,
    {
        self.post_with_retry(path, body).await
    }

    async fn post_with_retry<T>(&self, path: &str, body: &T) -> Result<Bytes>
    where
        T: Serialize + ?Sized,
    {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, ...
                let backoff = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(backoff).await;
            }

            match self.do_post(path, body).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() => {
                    warn!(path, attempt, error = %e, "retrying fish request");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Response("max retries exceeded".to_string())))
    }

    /// Performs a single HTTP request.
    async fn do_post<T>(&self, path: &str, body: &T) -> Result<Bytes>
    where
        T: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "fish request");

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers()?)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Returns default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    async fn handle_response(&self, response: Response) -> Result<Bytes> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(parse_error(&body, status.as_u16()));
        }
        Ok(body)
    }
}

/// Extracts a readable message from an error body.
///
/// The API answers with `{"message": ...}` or `{"detail": ...}`; anything
/// else is returned verbatim.
pub(crate) fn parse_error(body: &[u8], http_status: u16) -> Error {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        detail: Option<serde_json::Value>,
    }

    if let Ok(err) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = err.message {
            return Error::api(http_status, message);
        }
        if let Some(detail) = err.detail {
            let message = match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            return Error::api(http_status, message);
        }
    }

    Error::api(http_status, String::from_utf8_lossy(body).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_message_field() {
        let e = parse_error(br#"{"message":"invalid api key"}"#, 401);
        assert_eq!(e.to_string(), "fish: invalid api key (http=401)");
    }

    #[test]
    fn parse_error_detail_field() {
        let e = parse_error(br#"{"detail":[{"loc":["body","audios"]}]}"#, 422);
        match e {
            Error::Api { http_status, message } => {
                assert_eq!(http_status, 422);
                assert!(message.contains("audios"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_error_plain_text() {
        let e = parse_error(b"Bad Gateway", 502);
        assert!(e.is_retryable());
        assert!(e.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn base_url_trailing_slash() {
        let c = HttpClient::new(
            "https://api.fish.audio/".into(),
            "k".into(),
            0,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(c.base_url, "https://api.fish.audio");
    }
}
