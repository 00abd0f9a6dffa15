//! Global configuration models for `.sdlc-factory/config.toml`.
//!
//! This module defines the structure of the global configuration file that
//! selects the model provider and bounds how much prior-stage context is fed
//! into later prompts.

use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Which model backend the gateway talks to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// The hybrid HTTP backend exposing `POST /generate`.
    #[default]
    Backend,

    /// A local Ollama server (`/api/chat`).
    Ollama,

    /// OpenAI or any OpenAI-compatible chat completions endpoint.
    #[serde(rename = "openai", alias = "compatible")]
    OpenAi,

    /// Google Gemini `generateContent`.
    Gemini,

    /// Scripted offline gateway. Useful for demos and tests.
    Mock,
}

impl ProviderKind {
    /// Infer the provider kind from a name such as the `LLM_PROVIDER` value.
    ///
    /// # Examples
    ///
    /// ```
    /// use sf_protocol::config_models::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::from_name("Ollama"), Some(ProviderKind::Ollama));
    /// assert_eq!(ProviderKind::from_name("compatible"), Some(ProviderKind::OpenAi));
    /// assert_eq!(ProviderKind::from_name("carrier-pigeon"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "backend" | "hybrid" => Some(Self::Backend),
            "ollama" => Some(Self::Ollama),
            "openai" | "compatible" => Some(Self::OpenAi),
            "gemini" | "google" => Some(Self::Gemini),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Mock => "mock",
        }
    }

    /// Base URL used when neither the config file nor the environment sets one.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Backend => "http://localhost:8000",
            Self::Ollama => "http://localhost:11434",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Mock => "",
        }
    }

    /// Model used when no stage profile or config value names one.
    ///
    /// The hybrid backend picks its own model, so it has no default.
    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            Self::Backend | Self::Mock => None,
            Self::Ollama => Some("qwen2.5"),
            Self::OpenAi => Some("gpt-3.5-turbo"),
            Self::Gemini => Some("gemini-3-flash-preview"),
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Backend | Self::Mock => None,
            Self::Ollama => Some("OLLAMA_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Character budgets for prior-stage context embedded in prompts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ContextLimits {
    /// Prefix of the serialized requirements and of the serialized design
    /// given to the Development stage (each).
    pub development_context_chars: usize,

    /// Prefix of the generated code given to the Testing stage.
    pub testing_code_chars: usize,

    /// Prefix of the existing code given to the Modification stage.
    pub modification_code_chars: usize,

    /// Prefix of a raw response kept in a code placeholder for diagnosis.
    pub diagnostic_chars: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            development_context_chars: 1000,
            testing_code_chars: 2000,
            modification_code_chars: 5000,
            diagnostic_chars: 500,
        }
    }
}

/// Represents global settings from `.sdlc-factory/config.toml`.
///
/// # Example
///
/// ```toml
/// # .sdlc-factory/config.toml
/// provider = "ollama"
/// base_url = "http://localhost:11434"
/// model = "qwen2.5-coder"
///
/// [limits]
/// testing_code_chars = 4000
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    pub provider: ProviderKind,

    /// Endpoint root. Falls back to [`ProviderKind::default_base_url`].
    pub base_url: Option<String>,

    /// Default model for every stage that does not name its own.
    pub model: Option<String>,

    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,

    /// Whole-request timeout for one gateway call, in seconds.
    pub request_timeout_secs: u64,

    /// Maximum number of history snapshots kept on disk.
    pub history_limit: usize,

    pub limits: ContextLimits,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            model: None,
            api_key_env: None,
            request_timeout_secs: 300,
            history_limit: 100,
            limits: ContextLimits::default(),
        }
    }
}

impl GlobalConfig {
    /// The configured base URL, or the provider default.
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }

    /// The configured default model, or the provider default.
    pub fn effective_model(&self) -> Option<String> {
        self.model
            .clone()
            .or_else(|| self.provider.default_model().map(str::to_string))
    }
}
