//! HTTP client construction: timeout, TLS and proxy.

use reqwest::{Client, Proxy};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ConfigError;

/// Build the HTTP client used for every API call.
///
/// Configured headers are not set here; see [`HeaderTransport`](crate::headers::HeaderTransport).
pub fn build_http_client(config: &ClientConfig) -> Result<Client, ConfigError> {
    let mut builder = Client::builder().timeout(config.timeout());

    if config.skip_verify() {
        warn!("tls certificate verification is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(proxy_url) = config.proxy_url() {
        debug!(proxy = proxy_url, "using http proxy");
        builder = builder.proxy(Proxy::all(proxy_url).map_err(ConfigError::Proxy)?);
    } else if let Some(socks_url) = config.socks_url() {
        let socks_url = socks5_url(socks_url);
        debug!(proxy = %socks_url, "using socks5 proxy");
        builder = builder.proxy(Proxy::all(&socks_url).map_err(ConfigError::Proxy)?);
    }

    builder.build().map_err(ConfigError::HttpClient)
}

/// Bare `host:port` addresses get the `socks5://` scheme.
fn socks5_url(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("socks5://{address}")
    }
}
