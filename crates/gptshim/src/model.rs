//! Model registry: friendly model names to provider model identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Model used when a name is not in the registry.
pub const DEFAULT_MODEL: Model = Model::Gpt35Turbo;

/// Known provider models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Model {
    Gpt432K0613,
    Gpt432K0314,
    Gpt432K,
    Gpt40613,
    Gpt40314,
    Gpt4,
    Gpt35Turbo0613,
    Gpt35Turbo0301,
    Gpt35Turbo16K,
    Gpt35Turbo16K0613,
    Gpt35Turbo,
    Gpt35TurboInstruct,
    Davinci,
    Davinci002,
    Curie,
    Curie002,
    Ada,
    Ada002,
    Babbage,
    Babbage002,
}

impl Model {
    /// Every model in the registry.
    pub const ALL: [Model; 20] = [
        Model::Gpt432K0613,
        Model::Gpt432K0314,
        Model::Gpt432K,
        Model::Gpt40613,
        Model::Gpt40314,
        Model::Gpt4,
        Model::Gpt35Turbo0613,
        Model::Gpt35Turbo0301,
        Model::Gpt35Turbo16K,
        Model::Gpt35Turbo16K0613,
        Model::Gpt35Turbo,
        Model::Gpt35TurboInstruct,
        Model::Davinci,
        Model::Davinci002,
        Model::Curie,
        Model::Curie002,
        Model::Ada,
        Model::Ada002,
        Model::Babbage,
        Model::Babbage002,
    ];

    /// Provider identifier sent in the `model` field of requests.
    pub const fn id(self) -> &'static str {
        match self {
            Model::Gpt432K0613 => "gpt-4-32k-0613",
            Model::Gpt432K0314 => "gpt-4-32k-0314",
            Model::Gpt432K => "gpt-4-32k",
            Model::Gpt40613 => "gpt-4-0613",
            Model::Gpt40314 => "gpt-4-0314",
            Model::Gpt4 => "gpt-4",
            Model::Gpt35Turbo0613 => "gpt-3.5-turbo-0613",
            Model::Gpt35Turbo0301 => "gpt-3.5-turbo-0301",
            Model::Gpt35Turbo16K => "gpt-3.5-turbo-16k",
            Model::Gpt35Turbo16K0613 => "gpt-3.5-turbo-16k-0613",
            Model::Gpt35Turbo => "gpt-3.5-turbo",
            Model::Gpt35TurboInstruct => "gpt-3.5-turbo-instruct",
            Model::Davinci => "davinci",
            Model::Davinci002 => "davinci-002",
            Model::Curie => "curie",
            Model::Curie002 => "curie-002",
            Model::Ada => "ada",
            Model::Ada002 => "ada-002",
            Model::Babbage => "babbage",
            Model::Babbage002 => "babbage-002",
        }
    }

    /// Look up a model by its friendly name.
    pub fn lookup(name: &str) -> Option<Model> {
        Self::ALL.into_iter().find(|model| model.id() == name)
    }

    /// Resolve a friendly name, falling back to [`DEFAULT_MODEL`].
    pub fn resolve(name: &str) -> Model {
        Self::lookup(name).unwrap_or(DEFAULT_MODEL)
    }

    /// Whether the model must be called through the chat-completion endpoint.
    pub const fn is_chat(self) -> bool {
        matches!(
            self,
            Model::Gpt35Turbo
                | Model::Gpt35Turbo0301
                | Model::Gpt35Turbo0613
                | Model::Gpt35Turbo16K
                | Model::Gpt35Turbo16K0613
                | Model::Gpt4
                | Model::Gpt40314
                | Model::Gpt40613
                | Model::Gpt432K
                | Model::Gpt432K0314
                | Model::Gpt432K0613
        )
    }

    /// Whether the model accepts `functions` in chat requests.
    pub const fn supports_function_call(self) -> bool {
        matches!(
            self,
            Model::Gpt432K0613 | Model::Gpt40613 | Model::Gpt35Turbo0613 | Model::Gpt35Turbo16K0613
        )
    }
}

impl Default for Model {
    fn default() -> Self {
        DEFAULT_MODEL
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        model.id().to_string()
    }
}

impl From<String> for Model {
    fn from(name: String) -> Self {
        Model::resolve(&name)
    }
}

/// Resolve a friendly model name to its provider identifier.
pub fn resolve_model(name: &str) -> &'static str {
    Model::resolve(name).id()
}
