//! Adapter for the hybrid HTTP backend.
//!
//! The backend exposes a single `POST {base}/generate` endpoint and proxies
//! to whichever model provider it is configured for. Streaming replies are
//! plain chunked text; non-streaming replies are `{"response": "..."}`.

use crate::gateway::base::{ChatMessage, GatewayError, GenerateRequest, LlmGateway, TextStream};
use crate::gateway::stream::{ensure_success, text_fragments};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sf_protocol::project_models::Stage;

pub struct BackendAdapter {
    client: reqwest::Client,
    base_url: String,
    model: Option<String>,
}

impl BackendAdapter {
    /// Create a backend adapter.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (carries the request timeout)
    /// * `base_url` - Backend root, e.g. `http://localhost:8000`
    /// * `model` - Default model, or `None` to let the backend choose
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct BackendRequest<'a> {
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: BackendOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct BackendOptions {
    temperature: f32,
}

/// Label the backend logs requests under.
fn role_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Naming => "Orchestrator",
        other => other.as_str(),
    }
}

/// Pull the text out of a non-streaming reply.
///
/// Replies without a string `response` field are returned as compact JSON.
fn reply_text(body: Value) -> String {
    match body {
        Value::Object(mut map) => match map.remove("response") {
            Some(Value::String(text)) => text,
            Some(other) => {
                map.insert("response".to_string(), other);
                Value::Object(map).to_string()
            }
            None => Value::Object(map).to_string(),
        },
        other => other.to_string(),
    }
}

#[async_trait]
impl LlmGateway for BackendAdapter {
    fn name(&self) -> &'static str {
        "backend"
    }

    async fn execute(&self, request: &GenerateRequest) -> Result<TextStream, GatewayError> {
        let body = BackendRequest {
            role: role_label(request.stage),
            model: request.model.as_deref().or(self.model.as_deref()),
            messages: request.messages(),
            stream: request.stream,
            options: BackendOptions {
                temperature: request.temperature,
            },
            format: request.wants_json().then_some("json"),
        };

        let response = self.client.post(self.endpoint()).json(&body).send().await?;
        let response = ensure_success(response).await?;

        if request.stream {
            return Ok(text_fragments(response));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Stream(format!("backend reply is not JSON: {e}")))?;
        Ok(Box::pin(tokio_stream::once(Ok(reply_text(body)))))
    }
}
