//! Gateway factory for creating a gateway from the global configuration.

use crate::gateway::adapters::{BackendAdapter, GeminiAdapter, MockGateway, OllamaAdapter, OpenAiAdapter};
use crate::gateway::base::{GatewayError, LlmGateway};
use sf_protocol::config_models::{GlobalConfig, ProviderKind};
use std::sync::Arc;
use std::time::Duration;

/// Factory for creating gateway instances based on configuration.
pub struct GatewayFactory;

impl GatewayFactory {
    /// Create a gateway for the configured provider.
    ///
    /// The API key is read from the environment variable named by
    /// `api_key_env`, or the provider's conventional variable when unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use sf_core::gateway::GatewayFactory;
    /// use sf_protocol::config_models::{GlobalConfig, ProviderKind};
    ///
    /// let config = GlobalConfig {
    ///     provider: ProviderKind::Mock,
    ///     ..GlobalConfig::default()
    /// };
    /// let gateway = GatewayFactory::create(&config).unwrap();
    /// assert_eq!(gateway.name(), "mock");
    /// ```
    pub fn create(config: &GlobalConfig) -> Result<Arc<dyn LlmGateway>, GatewayError> {
        let api_key = Self::api_key(config);
        Self::create_with_key(config, api_key)
    }

    /// Like [`GatewayFactory::create`] with an explicit API key.
    pub fn create_with_key(
        config: &GlobalConfig,
        api_key: Option<String>,
    ) -> Result<Arc<dyn LlmGateway>, GatewayError> {
        let base_url = config.effective_base_url();
        let model = config.effective_model();
        tracing::debug!(provider = %config.provider, %base_url, ?model, "creating gateway");

        if config.provider == ProviderKind::Mock {
            return Ok(Arc::new(MockGateway::demo()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

        let gateway: Arc<dyn LlmGateway> = match config.provider {
            ProviderKind::Backend => Arc::new(BackendAdapter::new(client, base_url, model)),
            ProviderKind::Ollama => Arc::new(OllamaAdapter::new(client, base_url, model, api_key)),
            ProviderKind::OpenAi => Arc::new(OpenAiAdapter::new(client, base_url, model, api_key)),
            ProviderKind::Gemini => {
                if api_key.is_none() {
                    return Err(GatewayError::Config(format!(
                        "Gemini requires an API key in ${}",
                        Self::api_key_env(config).unwrap_or("GEMINI_API_KEY")
                    )));
                }
                Arc::new(GeminiAdapter::new(client, base_url, model, api_key))
            }
            ProviderKind::Mock => Arc::new(MockGateway::demo()),
        };
        Ok(gateway)
    }

    fn api_key_env(config: &GlobalConfig) -> Option<&str> {
        config
            .api_key_env
            .as_deref()
            .or_else(|| config.provider.default_api_key_env())
    }

    fn api_key(config: &GlobalConfig) -> Option<String> {
        Self::api_key_env(config)
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty())
    }
}
