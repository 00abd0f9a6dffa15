//! Adapter for the Google Gemini `generateContent` REST API.
//!
//! Streaming uses `streamGenerateContent?alt=sse`; each event's `data` is a
//! partial `GenerateContentResponse`.

use crate::gateway::base::{GatewayError, GenerateRequest, LlmGateway, TextStream};
use crate::gateway::stream::{ensure_success, sse_payloads};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;

pub struct GeminiAdapter {
    client: reqwest::Client,
    base_url: String,
    model: Option<String>,
    api_key: Option<String>,
}

impl GeminiAdapter {
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

    fn endpoint(&self, model: &str, stream: bool) -> String {
        let base = self.base_url.trim_end_matches('/');
        if stream {
            format!("{base}/v1beta/models/{model}:streamGenerateContent?alt=sse")
        } else {
            format!("{base}/v1beta/models/{model}:generateContent")
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts concatenated.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default()
    }
}

fn request_body(request: &GenerateRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: request.full_system_instruction(),
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: request.prompt.clone(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            response_mime_type: request.wants_json().then_some("application/json"),
        },
    }
}

#[async_trait]
impl LlmGateway for GeminiAdapter {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn execute(&self, request: &GenerateRequest) -> Result<TextStream, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GatewayError::Config("Gemini API key is not set".to_string()))?;
        let model = request
            .model
            .as_deref()
            .or(self.model.as_deref())
            .ok_or_else(|| GatewayError::Config("no Gemini model configured".to_string()))?;

        let response = self
            .client
            .post(self.endpoint(model, request.stream))
            .header("x-goog-api-key", api_key)
            .json(&request_body(request))
            .send()
            .await?;
        let response = ensure_success(response).await?;

        if !request.stream {
            let reply: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| GatewayError::Stream(format!("Gemini reply is not JSON: {e}")))?;
            return Ok(Box::pin(tokio_stream::once(Ok(reply.text()))));
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
                match serde_json::from_str::<GenerateContentResponse>(&data) {
                    Ok(chunk) => {
                        let text = chunk.text();
                        if !text.is_empty() {
                            yield Ok::<String, GatewayError>(text);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Gemini stream aborted");
                        yield Err(GatewayError::Stream(format!("malformed Gemini chunk: {e}")));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
