use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tokio::fs;
use url::Url;

use crate::client::Client;
use crate::error::ConfigError;
use crate::headers::HeaderSet;
use crate::model::DEFAULT_MODEL;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Provider
// ============================================================================

/// Which flavor of the API the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAI,
    Azure,
}

impl Provider {
    pub const fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Azure => "azure",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "azure" => Ok(Provider::Azure),
            other => Err(ConfigError::InvalidProvider(other.to_string())),
        }
    }
}

// ============================================================================
// ClientConfig
// ============================================================================

/// Validated client configuration. Produced by [`ConfigBuilder::build`].
#[derive(Clone)]
pub struct ClientConfig {
    token: String,
    org_id: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
    proxy_url: Option<String>,
    socks_url: Option<String>,
    skip_verify: bool,
    model: String,
    max_tokens: u32,
    temperature: f32,
    provider: Provider,
    api_version: Option<String>,
    headers: HeaderSet,
    model_name: Option<String>,
}

impl ClientConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn org_id(&self) -> Option<&str> {
        self.org_id.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy_url.as_deref()
    }

    pub fn socks_url(&self) -> Option<&str> {
        self.socks_url.as_deref()
    }

    pub fn skip_verify(&self) -> bool {
        self.skip_verify
    }

    /// Model name as supplied, before registry resolution.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Azure deployment name.
    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("org_id", &self.org_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("proxy_url", &self.proxy_url)
            .field("socks_url", &self.socks_url)
            .field("skip_verify", &self.skip_verify)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("provider", &self.provider)
            .field("api_version", &self.api_version)
            .field("model_name", &self.model_name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ConfigBuilder
// ============================================================================

/// Mutable draft of a [`ClientConfig`].
///
/// Setters apply in call order; nothing is validated until [`ConfigBuilder::build`].
#[derive(Clone)]
pub struct ConfigBuilder {
    token: Option<String>,
    org_id: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
    proxy_url: Option<String>,
    socks_url: Option<String>,
    skip_verify: bool,
    model: String,
    max_tokens: u32,
    temperature: f32,
    provider: Provider,
    api_version: Option<String>,
    headers: HeaderSet,
    model_name: Option<String>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            token: None,
            org_id: None,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            proxy_url: None,
            socks_url: None,
            skip_verify: false,
            model: DEFAULT_MODEL.id().to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            provider: Provider::default(),
            api_version: None,
            headers: HeaderSet::default(),
            model_name: None,
        }
    }
}

impl fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("has_token", &self.token.is_some())
            .field("base_url", &self.base_url)
            .field("proxy_url", &self.proxy_url)
            .field("socks_url", &self.socks_url)
            .field("model", &self.model)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `OPENAI_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new().apply_env(|key| std::env::var(key).ok())
    }

    /// Layer variables returned by `lookup` onto the draft. Empty values are ignored.
    ///
    /// Setting either `OPENAI_PROXY` or `OPENAI_SOCKS` replaces any proxy from an
    /// earlier layer; setting both is still a conflict.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("OPENAI_API_KEY") {
            self = self.token(v);
        }
        if let Some(v) = var("OPENAI_ORG_ID") {
            self = self.org_id(v);
        }
        if let Some(v) = var("OPENAI_BASE_URL") {
            self = self.base_url(v);
        }
        if let Some(v) = var("OPENAI_MODEL") {
            self = self.model(v);
        }
        if let Some(v) = var("OPENAI_PROVIDER") {
            self = self.provider(v.parse()?);
        }
        if let Some(v) = var("OPENAI_API_VERSION") {
            self = self.api_version(v);
        }
        let (proxy, socks) = (var("OPENAI_PROXY"), var("OPENAI_SOCKS"));
        if proxy.is_some() || socks.is_some() {
            self = self.clear_proxy();
        }
        if let Some(v) = proxy {
            self = self.proxy_url(v);
        }
        if let Some(v) = socks {
            self = self.socks_url(v);
        }
        if let Some(v) = var("OPENAI_MODEL_NAME") {
            self = self.model_name(v);
        }
        Ok(self)
    }

    /// Layer the values present in a config file onto the draft.
    ///
    /// A proxy in the file replaces any proxy from an earlier layer.
    pub fn apply_file(mut self, file: FileConfig) -> Self {
        if let Some(v) = file.token {
            self = self.token(v);
        }
        if let Some(v) = file.org_id {
            self = self.org_id(v);
        }
        if let Some(v) = file.base_url {
            self = self.base_url(v);
        }
        if let Some(v) = file.timeout_seconds {
            self = self.timeout(Duration::from_secs(v));
        }
        if file.proxy_url.is_some() || file.socks_url.is_some() {
            self = self.clear_proxy();
        }
        if let Some(v) = file.proxy_url {
            self = self.proxy_url(v);
        }
        if let Some(v) = file.socks_url {
            self = self.socks_url(v);
        }
        if let Some(v) = file.skip_verify {
            self = self.skip_verify(v);
        }
        if let Some(v) = file.model {
            self = self.model(v);
        }
        if let Some(v) = file.max_tokens {
            self = self.max_tokens(v);
        }
        if let Some(v) = file.temperature {
            self = self.temperature(v);
        }
        if let Some(v) = file.provider {
            self = self.provider(v);
        }
        if let Some(v) = file.api_version {
            self = self.api_version(v);
        }
        if let Some(v) = file.model_name {
            self = self.model_name(v);
        }
        self.headers(HeaderSet::parse(file.headers))
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// HTTP(S) proxy URL.
    pub fn proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// SOCKS5 proxy address, `host:port` or `socks5://host:port`.
    pub fn socks_url(mut self, socks_url: impl Into<String>) -> Self {
        self.socks_url = Some(socks_url.into());
        self
    }

    /// Drop both proxy settings, so the next layer can pick either kind.
    pub fn clear_proxy(mut self) -> Self {
        self.proxy_url = None;
        self.socks_url = None;
        self
    }

    pub fn skip_verify(mut self, skip_verify: bool) -> Self {
        self.skip_verify = skip_verify;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Append headers sent with every request.
    pub fn headers(mut self, headers: HeaderSet) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Azure deployment name.
    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Validate the draft.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let token = non_empty(self.token).ok_or(ConfigError::MissingToken)?;
        let proxy_url = non_empty(self.proxy_url);
        let socks_url = non_empty(self.socks_url);
        let base_url = non_empty(self.base_url);

        if proxy_url.is_some() && socks_url.is_some() {
            return Err(ConfigError::ConflictingProxy);
        }
        if let Some(url) = &proxy_url {
            Url::parse(url).map_err(|source| ConfigError::InvalidProxy {
                url: url.clone(),
                source,
            })?;
        }
        if let Some(url) = &base_url {
            Url::parse(url).map_err(|source| ConfigError::InvalidBaseUrl {
                url: url.clone(),
                source,
            })?;
        }
        if self.provider == Provider::Azure && base_url.is_none() {
            return Err(ConfigError::MissingAzureEndpoint);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        Ok(ClientConfig {
            token,
            org_id: non_empty(self.org_id),
            base_url,
            timeout: self.timeout,
            proxy_url,
            socks_url,
            skip_verify: self.skip_verify,
            model: self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            provider: self.provider,
            api_version: non_empty(self.api_version),
            headers: self.headers,
            model_name: non_empty(self.model_name),
        })
    }

    /// Validate the draft and construct a [`Client`].
    pub fn connect(self) -> Result<Client, ConfigError> {
        Client::new(self.build()?)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// FileConfig
// ============================================================================

/// Optional on-disk configuration (YAML). Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub socks_url: Option<String>,
    #[serde(default)]
    pub skip_verify: Option<bool>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    /// `key=value` entries.
    #[serde(default)]
    pub headers: Vec<String>,
}

impl FileConfig {
    /// Load from `path`. A missing file yields an empty config.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::new().token("sk-test").build().unwrap();
        assert_eq!(config.token(), "sk-test");
        assert_eq!(config.model(), "gpt-3.5-turbo");
        assert_eq!(config.max_tokens(), 300);
        assert_eq!(config.temperature(), 1.0);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.provider(), Provider::OpenAI);
        assert!(config.base_url().is_none());
        assert!(config.api_version().is_none());
        assert!(config.headers().is_empty());
        assert!(!config.skip_verify());
    }

    #[test]
    fn test_missing_token() {
        let err = ConfigBuilder::new().build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));

        let err = ConfigBuilder::new().token("   ").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_options_apply_in_order() {
        let config = ConfigBuilder::new()
            .token("first")
            .model("gpt-4")
            .token("second")
            .model("davinci")
            .build()
            .unwrap();
        assert_eq!(config.token(), "second");
        assert_eq!(config.model(), "davinci");
    }

    #[test]
    fn test_conflicting_proxies() {
        let err = ConfigBuilder::new()
            .token("sk")
            .proxy_url("http://127.0.0.1:8080")
            .socks_url("127.0.0.1:1080")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingProxy));
    }

    #[test]
    fn test_later_layer_replaces_proxy_kind() {
        let file = FileConfig {
            proxy_url: Some("http://127.0.0.1:3128".to_string()),
            ..FileConfig::default()
        };
        let config = ConfigBuilder::new()
            .token("sk")
            .apply_file(file)
            .apply_env(|key| (key == "OPENAI_SOCKS").then(|| "127.0.0.1:1080".to_string()))
            .unwrap()
            .build()
            .unwrap();
        assert!(config.proxy_url().is_none());
        assert_eq!(config.socks_url(), Some("127.0.0.1:1080"));

        let config = ConfigBuilder::new()
            .token("sk")
            .socks_url("127.0.0.1:1080")
            .clear_proxy()
            .proxy_url("http://127.0.0.1:3128")
            .build()
            .unwrap();
        assert_eq!(config.proxy_url(), Some("http://127.0.0.1:3128"));
        assert!(config.socks_url().is_none());
    }

    #[test]
    fn test_both_proxies_in_one_layer_conflict() {
        let result = ConfigBuilder::new()
            .token("sk")
            .apply_env(|key| match key {
                "OPENAI_PROXY" => Some("http://127.0.0.1:3128".to_string()),
                "OPENAI_SOCKS" => Some("127.0.0.1:1080".to_string()),
                _ => None,
            })
            .unwrap()
            .build();
        assert!(matches!(result, Err(ConfigError::ConflictingProxy)));
    }

    #[test]
    fn test_debug_hides_token() {
        let builder = ConfigBuilder::new().token("sk-secret");
        assert!(!format!("{builder:?}").contains("sk-secret"));
        let config = builder.build().unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("gpt-3.5-turbo"));
    }

    #[test]
    fn test_empty_proxy_is_unset() {
        let config = ConfigBuilder::new()
            .token("sk")
            .proxy_url("")
            .socks_url("127.0.0.1:1080")
            .build()
            .unwrap();
        assert!(config.proxy_url().is_none());
        assert_eq!(config.socks_url(), Some("127.0.0.1:1080"));
    }

    #[test]
    fn test_invalid_proxy_url() {
        let err = ConfigBuilder::new()
            .token("sk")
            .proxy_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProxy { .. }));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ConfigBuilder::new()
            .token("sk")
            .base_url("::nope")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_azure_requires_base_url() {
        let err = ConfigBuilder::new()
            .token("sk")
            .provider(Provider::Azure)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingAzureEndpoint));

        let config = ConfigBuilder::new()
            .token("sk")
            .provider(Provider::Azure)
            .base_url("https://example.openai.azure.com")
            .model_name("gpt35")
            .build()
            .unwrap();
        assert_eq!(config.provider(), Provider::Azure);
        assert_eq!(config.model_name(), Some("gpt35"));
    }

    #[test]
    fn test_temperature_range() {
        let err = ConfigBuilder::new()
            .token("sk")
            .temperature(2.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemperature(t) if t == 2.5));
        assert!(
            ConfigBuilder::new()
                .token("sk")
                .temperature(0.0)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert_eq!(" Azure ".parse::<Provider>().unwrap(), Provider::Azure);
        assert!(matches!(
            "bedrock".parse::<Provider>(),
            Err(ConfigError::InvalidProvider(p)) if p == "bedrock"
        ));
    }

    #[test]
    fn test_apply_env() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-env"),
            ("OPENAI_MODEL", "gpt-4"),
            ("OPENAI_PROVIDER", "azure"),
            ("OPENAI_BASE_URL", "https://example.openai.azure.com"),
            ("OPENAI_ORG_ID", ""),
        ]);
        let config = ConfigBuilder::new()
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.token(), "sk-env");
        assert_eq!(config.model(), "gpt-4");
        assert_eq!(config.provider(), Provider::Azure);
        assert!(config.org_id().is_none());
    }

    #[test]
    fn test_apply_env_rejects_unknown_provider() {
        let result = ConfigBuilder::new().apply_env(|key| {
            (key == "OPENAI_PROVIDER").then(|| "mystery".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidProvider(_))));
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let file = FileConfig::load(tmp_dir.path().join("missing.yaml"))
            .await
            .unwrap();
        assert!(file.token.is_none());
        assert!(file.headers.is_empty());
    }

    #[tokio::test]
    async fn test_load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
token: "sk-file"
model: "gpt-4-0613"
max_tokens: 512
temperature: 0.2
timeout_seconds: 30
provider: azure
base_url: "https://example.openai.azure.com"
api_version: "2023-07-01-preview"
model_name: "gpt4-deploy"
headers:
  - "X-Team=infra"
  - "X-Env=dev"
"#
        )
        .unwrap();

        let file_config = FileConfig::load(file.path()).await.unwrap();
        let config = ConfigBuilder::new()
            .apply_file(file_config)
            .build()
            .unwrap();
        assert_eq!(config.token(), "sk-file");
        assert_eq!(config.model(), "gpt-4-0613");
        assert_eq!(config.max_tokens(), 512);
        assert_eq!(config.temperature(), 0.2);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.provider(), Provider::Azure);
        assert_eq!(config.api_version(), Some("2023-07-01-preview"));
        assert_eq!(config.model_name(), Some("gpt4-deploy"));
        assert_eq!(config.headers().len(), 2);
    }

    #[tokio::test]
    async fn test_load_partial_yaml_keeps_builder_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_tokens: 64").unwrap();

        let file_config = FileConfig::load(file.path()).await.unwrap();
        let config = ConfigBuilder::new()
            .token("sk-builder")
            .model("gpt-4")
            .apply_file(file_config)
            .build()
            .unwrap();
        assert_eq!(config.token(), "sk-builder");
        assert_eq!(config.model(), "gpt-4");
        assert_eq!(config.max_tokens(), 64);
        assert_eq!(config.temperature(), DEFAULT_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = FileConfig::load(file.path()).await;
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }
}
