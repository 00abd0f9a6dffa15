//! Adapter for OpenAI and OpenAI-compatible chat completion endpoints.
//!
//! Streaming replies are Server-Sent Events whose `data` payloads carry
//! `choices[0].delta.content`, terminated by `[DONE]`. A payload that is not
//! a completion chunk ends the stream with `GatewayError::Stream`.

use crate::gateway::base::{ChatMessage, GatewayError, GenerateRequest, LlmGateway, TextStream};
use crate::gateway::stream::{ensure_success, sse_payloads};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;

const DONE_MARKER: &str = "[DONE]";

pub struct OpenAiAdapter {
    client: reqwest::Client,
    base_url: String,
    model: Option<String>,
    api_key: Option<String>,
}

impl OpenAiAdapter {
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

    /// Accepts either an API root (`.../v1`) or the full completions URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{base}/chat/completions")
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionContent>,
    #[serde(default)]
    delta: Option<CompletionContent>,
}

#[derive(Debug, Deserialize)]
struct CompletionContent {
    #[serde(default)]
    content: Option<String>,
}

/// Delta text of one streamed completion chunk.
fn delta_text(data: &str) -> Result<String, GatewayError> {
    let chunk: ChatCompletion = serde_json::from_str(data)
        .map_err(|e| GatewayError::Stream(format!("malformed completion chunk: {e}")))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .unwrap_or_default())
}

#[async_trait]
impl LlmGateway for OpenAiAdapter {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn execute(&self, request: &GenerateRequest) -> Result<TextStream, GatewayError> {
        let model = request
            .model
            .as_deref()
            .or(self.model.as_deref())
            .ok_or_else(|| GatewayError::Config("no chat completion model configured".to_string()))?;

        let body = ChatCompletionRequest {
            model,
            messages: request.messages(),
            stream: request.stream,
            temperature: request.temperature,
            response_format: request
                .wants_json()
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = ensure_success(builder.send().await?).await?;

        if !request.stream {
            let completion: ChatCompletion = response
                .json()
                .await
                .map_err(|e| GatewayError::Stream(format!("completion is not JSON: {e}")))?;
            let text = completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message)
                .and_then(|message| message.content)
                .unwrap_or_default();
            return Ok(Box::pin(tokio_stream::once(Ok(text))));
        }

        let mut payloads = sse_payloads(response);
        let stream = async_stream::stream! {
            while let Some(payload) = payloads.next().await {
                let data = match payload {
                    Ok(data) => data,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                };
                if data.trim() == DONE_MARKER {
                    break;
                }
                match delta_text(&data) {
                    Ok(text) => {
                        if !text.is_empty() {
                            yield Ok::<String, GatewayError>(text);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "completion stream aborted");
                        yield Err(err);
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_text() {
        let data = r#"{"id":"c1","choices":[{"index":0,"delta":{"content":"Hi"}}]}"#;
        assert_eq!(delta_text(data), Ok("Hi".to_string()));
    }

    #[test]
    fn test_role_only_delta_is_empty() {
        let data = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(delta_text(data), Ok(String::new()));
    }

    #[test]
    fn test_malformed_chunk_is_a_stream_error() {
        assert!(matches!(delta_text("{broken"), Err(GatewayError::Stream(_))));
    }

    #[test]
    fn test_endpoint_accepts_full_url() {
        let client = reqwest::Client::new();
        let root = OpenAiAdapter::new(client.clone(), "https://api.openai.com/v1/", None, None);
        assert_eq!(root.endpoint(), "https://api.openai.com/v1/chat/completions");

        let full = OpenAiAdapter::new(client, "http://lm:1234/v1/chat/completions", None, None);
        assert_eq!(full.endpoint(), "http://lm:1234/v1/chat/completions");
    }
}
