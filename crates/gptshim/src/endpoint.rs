//! URL layout and authentication for the standard and Azure-hosted APIs.

use reqwest::RequestBuilder;
use url::Url;

use crate::config::{ClientConfig, DEFAULT_BASE_URL, Provider};
use crate::model::Model;

/// API version used for Azure when none is configured.
pub const DEFAULT_AZURE_API_VERSION: &str = "2023-05-15";

/// First Azure API version that accepts `functions` for every deployment.
pub const AZURE_FUNCTION_CALL_API_VERSION: &str = "2023-07-01-preview";

/// Remote operation, relative to the endpoint root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ChatCompletions,
    Completions,
}

impl Operation {
    pub const fn path(self) -> &'static str {
        match self {
            Operation::ChatCompletions => "chat/completions",
            Operation::Completions => "completions",
        }
    }
}

/// Where requests go and how they authenticate.
#[derive(Clone)]
pub enum Endpoint {
    Standard {
        base_url: String,
        token: String,
        org_id: Option<String>,
        api_version: Option<String>,
    },
    Azure {
        base_url: String,
        token: String,
        deployment: String,
        api_version: String,
    },
}

impl Endpoint {
    pub fn from_config(config: &ClientConfig, model: Model) -> Self {
        match config.provider() {
            Provider::Azure => Endpoint::Azure {
                base_url: trim_base(config.base_url().unwrap_or_default()),
                token: config.token().to_string(),
                deployment: config
                    .model_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| azure_deployment(model)),
                api_version: config
                    .api_version()
                    .unwrap_or(DEFAULT_AZURE_API_VERSION)
                    .to_string(),
            },
            Provider::OpenAI => Endpoint::Standard {
                base_url: trim_base(config.base_url().unwrap_or(DEFAULT_BASE_URL)),
                token: config.token().to_string(),
                org_id: config.org_id().map(str::to_string),
                api_version: config.api_version().map(str::to_string),
            },
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Endpoint::Standard { .. } => Provider::OpenAI,
            Endpoint::Azure { .. } => Provider::Azure,
        }
    }

    pub fn api_version(&self) -> Option<&str> {
        match self {
            Endpoint::Standard { api_version, .. } => api_version.as_deref(),
            Endpoint::Azure { api_version, .. } => Some(api_version),
        }
    }

    /// Full URL of `operation`.
    pub fn url(&self, operation: Operation) -> Result<Url, url::ParseError> {
        let mut url = match self {
            Endpoint::Standard { base_url, .. } => {
                Url::parse(&format!("{}/{}", base_url, operation.path()))?
            }
            Endpoint::Azure {
                base_url,
                deployment,
                ..
            } => Url::parse(&format!(
                "{}/openai/deployments/{}/{}",
                base_url,
                deployment,
                operation.path()
            ))?,
        };
        if let Some(version) = self.api_version() {
            url.query_pairs_mut().append_pair("api-version", version);
        }
        Ok(url)
    }

    /// Attach authentication headers.
    pub fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Endpoint::Standard { token, org_id, .. } => {
                let builder = builder.bearer_auth(token);
                match org_id {
                    Some(org) => builder.header("OpenAI-Organization", org),
                    None => builder,
                }
            }
            Endpoint::Azure { token, .. } => builder.header("api-key", token),
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Standard {
                base_url,
                org_id,
                api_version,
                ..
            } => f
                .debug_struct("Standard")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .field("api_version", api_version)
                .finish_non_exhaustive(),
            Endpoint::Azure {
                base_url,
                deployment,
                api_version,
                ..
            } => f
                .debug_struct("Azure")
                .field("base_url", base_url)
                .field("deployment", deployment)
                .field("api_version", api_version)
                .finish_non_exhaustive(),
        }
    }
}

fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Azure deployment names cannot contain `.` or `:`.
fn azure_deployment(model: Model) -> String {
    model.id().replace(['.', ':'], "")
}
