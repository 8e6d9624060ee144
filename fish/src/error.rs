//! Error types for the Fish Audio API client.

use thiserror::Error;

/// Result type alias for Fish Audio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Fish Audio API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Non-success HTTP response from the API.
    #[error("fish: {message} (http={http_status})")]
    Api { http_status: u16, message: String },

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The response was well-formed but unusable.
    #[error("unexpected response: {0}")]
    Response(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(http_status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            http_status,
            message: message.into(),
        }
    }

    fn http_status(&self) -> Option<u16> {
        match self {
            Error::Api { http_status, .. } => Some(*http_status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.http_status() == Some(429)
    }

    /// Returns true if the API key was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.http_status(), Some(401 | 403))
    }

    /// Returns true if the account has no credit left.
    pub fn is_payment_required(&self) -> bool {
        self.http_status() == Some(402)
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self.http_status(), Some(s) if s >= 500)
    }

    /// Returns true for connection failures and timeouts.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns true if the request can be retried.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limit() || self.is_server_error() || self.is_transport()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(Error::api(429, "slow down").is_retryable());
        assert!(Error::api(503, "unavailable").is_retryable());
        assert!(Error::api(500, "oops").is_server_error());

        let unauthorized = Error::api(401, "bad key");
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_retryable());

        let payment = Error::api(402, "no credit");
        assert!(payment.is_payment_required());
        assert!(!payment.is_retryable());

        assert!(!Error::api(422, "missing audios").is_retryable());
        assert!(!Error::Config("x".into()).is_retryable());
    }

    #[test]
    fn display() {
        let e = Error::api(404, "model not found");
        assert_eq!(e.to_string(), "fish: model not found (http=404)");
    }
}
