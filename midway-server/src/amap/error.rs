//! AMap client error types.

use crate::provider::ProviderError;

/// Errors from the AMap HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum AmapError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// AMap answered, but reported failure in its envelope
    #[error("AMap error {code}: {info}")]
    Status { code: String, info: String },

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Response decoded but carried unusable data
    #[error("invalid response: {0}")]
    Invalid(String),

    /// Rate limited by the API
    #[error("rate limited by AMap")]
    RateLimited,
}

impl From<AmapError> for ProviderError {
    fn from(err: AmapError) -> Self {
        ProviderError::Service(err.to_string())
    }
}
