//! gptshim - a thin configuration and dispatch layer over OpenAI-compatible
//! completion APIs, standard or Azure-hosted.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod headers;
pub mod http;
pub mod model;
pub mod types;

pub use client::Client;
pub use config::{ClientConfig, ConfigBuilder, FileConfig, Provider};
pub use error::{ConfigError, LLMError};
pub use headers::HeaderSet;
pub use model::{DEFAULT_MODEL, Model, resolve_model};
pub use types::{
    ChatCompletionResponse, ChatMessage, CompletionResponse, FunctionCall, FunctionDefinition,
    Response, Role, Usage,
};
