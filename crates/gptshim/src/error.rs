//! Client error types.

use thiserror::Error;

/// Map an unsuccessful HTTP response to an [`LLMError`], consuming the body.
///
/// 2xx responses are passed through unchanged.
pub(crate) async fn check_response_error(
    response: reqwest::Response,
) -> Result<reqwest::Response, LLMError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        return Err(LLMError::RateLimit { retry_after });
    }
    let message = response.text().await.unwrap_or_default();
    Err(LLMError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Errors that can occur when making LLM API calls.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited (429)
    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimit { retry_after: Option<u64> },

    /// Response carried no choices
    #[error("empty response from provider")]
    EmptyResponse,

    /// Endpoint URL could not be built
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

/// Errors raised while validating configuration or constructing a client.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing api token (set OPENAI_API_KEY or pass a token)")]
    MissingToken,

    #[error("http proxy and socks5 proxy are mutually exclusive")]
    ConflictingProxy,

    #[error("invalid proxy url '{url}': {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("azure provider requires a base url")]
    MissingAzureEndpoint,

    #[error("temperature {0} is outside 0.0..=2.0")]
    InvalidTemperature(f32),

    #[error("unknown provider '{0}' (expected 'openai' or 'azure')")]
    InvalidProvider(String),

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("can't connect to the proxy: {0}")]
    Proxy(#[source] reqwest::Error),

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}
