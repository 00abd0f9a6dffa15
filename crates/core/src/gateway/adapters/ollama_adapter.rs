//! Adapter for a local Ollama server (`POST /api/chat`).
//!
//! Streaming replies are newline-delimited JSON records of the form
//! `{"message": {"content": "..."}, "done": false}`.

use crate::gateway::base::{ChatMessage, GatewayError, GenerateRequest, LlmGateway, TextStream};
use crate::gateway::stream::{ensure_success, response_lines};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;

const CONTEXT_WINDOW: u32 = 32_768;

pub struct OllamaAdapter {
    client: reqwest::Client,
    base_url: String,
    model: Option<String>,
    api_key: Option<String>,
}

impl OllamaAdapter {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// What a single NDJSON line contributes to the reply.
#[derive(Debug, PartialEq)]
enum LineOutcome {
    Text(String),
    Done(String),
    Skip,
}

fn parse_line(line: &str) -> Result<LineOutcome, GatewayError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineOutcome::Skip);
    }

    let record: OllamaChatResponse = match serde_json::from_str(line) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed Ollama stream line");
            return Ok(LineOutcome::Skip);
        }
    };

    if let Some(error) = record.error {
        return Err(GatewayError::Stream(format!("Ollama error: {error}")));
    }

    let content = record.message.map(|m| m.content).unwrap_or_default();
    Ok(if record.done {
        LineOutcome::Done(content)
    } else {
        LineOutcome::Text(content)
    })
}

#[async_trait]
impl LlmGateway for OllamaAdapter {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn execute(&self, request: &GenerateRequest) -> Result<TextStream, GatewayError> {
        let model = request
            .model
            .as_deref()
            .or(self.model.as_deref())
            .ok_or_else(|| GatewayError::Config("no Ollama model configured".to_string()))?;

        let body = OllamaChatRequest {
            model,
            messages: request.messages(),
            stream: request.stream,
            options: OllamaOptions {
                temperature: request.temperature,
                num_ctx: CONTEXT_WINDOW,
            },
            format: request.wants_json().then_some("json"),
        };

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = ensure_success(builder.send().await?).await?;

        if !request.stream {
            let record: OllamaChatResponse = response
                .json()
                .await
                .map_err(|e| GatewayError::Stream(format!("Ollama reply is not JSON: {e}")))?;
            if let Some(error) = record.error {
                return Err(GatewayError::Stream(format!("Ollama error: {error}")));
            }
            let text = record.message.map(|m| m.content).unwrap_or_default();
            return Ok(Box::pin(tokio_stream::once(Ok(text))));
        }

        let mut lines = response_lines(response);
        let stream = async_stream::stream! {
            while let Some(line) = lines.next().await {
                match line.and_then(|line| parse_line(&line)) {
                    Ok(LineOutcome::Text(text)) => {
                        if !text.is_empty() {
                            yield Ok::<String, GatewayError>(text);
                        }
                    }
                    Ok(LineOutcome::Done(text)) => {
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                        break;
                    }
                    Ok(LineOutcome::Skip) => {}
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
