//! Completion client: model resolution, endpoint selection and dispatch.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{ClientConfig, ConfigBuilder, Provider};
use crate::endpoint::{AZURE_FUNCTION_CALL_API_VERSION, Endpoint, Operation};
use crate::error::{ConfigError, LLMError, check_response_error};
use crate::headers::HeaderTransport;
use crate::http::build_http_client;
use crate::model::Model;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, CompletionRequest,
    CompletionResponse, FunctionDefinition, Response,
};

/// Client for chat and legacy completions.
///
/// Immutable after construction; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    headers: HeaderTransport,
    endpoint: Endpoint,
    model: Model,
    max_tokens: u32,
    temperature: f32,
    is_func_call: bool,
}

impl Client {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Construct a client from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let model = match Model::lookup(config.model()) {
            Some(model) => model,
            None => {
                let fallback = Model::default();
                warn!(
                    requested = config.model(),
                    model = %fallback,
                    "unknown model, using default"
                );
                fallback
            }
        };

        let headers = HeaderTransport::new(config.headers())?;
        let http = build_http_client(&config)?;
        let endpoint = Endpoint::from_config(&config, model);
        let is_func_call = allow_func_call(config.provider(), config.api_version(), model);

        debug!(
            provider = %config.provider(),
            model = %model,
            function_call = is_func_call,
            "client ready"
        );

        Ok(Self {
            http,
            headers,
            endpoint,
            model,
            max_tokens: config.max_tokens(),
            temperature: config.temperature(),
            is_func_call,
        })
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn provider(&self) -> Provider {
        self.endpoint.provider()
    }

    /// Whether the resolved model and provider accept function-call requests.
    pub fn allow_func_call(&self) -> bool {
        self.is_func_call
    }

    /// Create a chat completion for a single user message.
    pub async fn create_chat_completion(
        &self,
        content: &str,
    ) -> Result<ChatCompletionResponse, LLMError> {
        let request = self.chat_request(content, Vec::new());
        self.post(Operation::ChatCompletions, &request).await
    }

    /// Create a legacy text completion.
    pub async fn create_completion(&self, content: &str) -> Result<CompletionResponse, LLMError> {
        let request = CompletionRequest {
            model: self.model.id().to_string(),
            prompt: content.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: 1.0,
        };
        self.post(Operation::Completions, &request).await
    }

    /// Create a chat completion that may answer with a call to one of `functions`.
    pub async fn create_function_call(
        &self,
        content: &str,
        functions: Vec<FunctionDefinition>,
    ) -> Result<ChatCompletionResponse, LLMError> {
        if !self.is_func_call {
            warn!(
                model = %self.model,
                provider = %self.provider(),
                "function calls may not be supported by this model"
            );
        }
        let request = self.chat_request(content, functions);
        self.post(Operation::ChatCompletions, &request).await
    }

    /// Complete `content`, using the chat endpoint for chat models and the
    /// legacy endpoint otherwise.
    pub async fn completion(&self, content: &str) -> Result<Response, LLMError> {
        if self.model.is_chat() {
            let response = self.create_chat_completion(content).await?;
            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or(LLMError::EmptyResponse)?;
            Ok(Response {
                content: choice.message.content,
                usage: response.usage,
            })
        } else {
            let response = self.create_completion(content).await?;
            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or(LLMError::EmptyResponse)?;
            Ok(Response {
                content: choice.text,
                usage: response.usage,
            })
        }
    }

    fn chat_request(
        &self,
        content: &str,
        functions: Vec<FunctionDefinition>,
    ) -> ChatCompletionRequest {
        let function_call = (!functions.is_empty()).then(|| "auto".to_string());
        ChatCompletionRequest {
            model: self.model.id().to_string(),
            messages: vec![ChatMessage::user(content)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: 1.0,
            functions,
            function_call,
        }
    }

    async fn post<B, R>(&self, operation: Operation, body: &B) -> Result<R, LLMError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint.url(operation)?;
        debug!(operation = operation.path(), %url, "sending request");

        let mut request = self
            .endpoint
            .authorize(self.http.post(url))
            .json(body)
            .build()?;
        self.headers.apply(&mut request);
        let response = check_response_error(self.http.execute(request).await?).await?;

        Ok(response.json().await?)
    }
}

/// Function calling is available on Azure from `2023-07-01-preview` and on
/// the `0613` model snapshots.
fn allow_func_call(provider: Provider, api_version: Option<&str>, model: Model) -> bool {
    if provider == Provider::Azure && api_version == Some(AZURE_FUNCTION_CALL_API_VERSION) {
        return true;
    }
    model.supports_function_call()
}
