//! Base gateway trait and supporting types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sf_protocol::project_models::Stage;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};

/// Ordered text fragments produced by one gateway call.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send>>;

/// Appended to the system instruction whenever a request carries a schema.
const SCHEMA_PREAMBLE: &str = "OUTPUT MUST BE STRICT JSON MATCHING THIS SCHEMA:";

/// Fatal failures of a gateway call. Any of these stops the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Stream parsing error: {0}")]
    Stream(String),
    #[error("Gateway not configured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Transport(format!("request timed out: {err}"))
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// One chat turn in provider wire format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A single model invocation, independent of the provider behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// The stage issuing the call. Some providers label requests with it.
    pub stage: Stage,

    pub system_instruction: String,

    pub prompt: String,

    /// Example document of the JSON shape the stage expects, if any.
    ///
    /// When present the provider is asked for JSON output and the schema
    /// is appended to the system instruction.
    pub schema: Option<Value>,

    /// Model override. `None` means the gateway's default model.
    pub model: Option<String>,

    pub temperature: f32,

    /// Request incremental delivery.
    pub stream: bool,
}

impl GenerateRequest {
    /// Create a non-streaming request with no schema and temperature 0.1.
    pub fn new(stage: Stage, system_instruction: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            stage,
            system_instruction: system_instruction.into(),
            prompt: prompt.into(),
            schema: None,
            model: None,
            temperature: 0.1,
            stream: false,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn wants_json(&self) -> bool {
        self.schema.is_some()
    }

    /// The system instruction with the schema block appended when present.
    pub fn full_system_instruction(&self) -> String {
        match &self.schema {
            Some(schema) => {
                let rendered =
                    serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
                format!(
                    "{}\n\n{}\n{}",
                    self.system_instruction, SCHEMA_PREAMBLE, rendered
                )
            }
            None => self.system_instruction.clone(),
        }
    }

    /// System and user messages, in that order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.full_system_instruction()),
            ChatMessage::user(self.prompt.clone()),
        ]
    }
}

#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Send the request and return its text fragments in arrival order.
    ///
    /// Non-streaming requests yield exactly one fragment holding the whole
    /// reply.
    async fn execute(&self, request: &GenerateRequest) -> Result<TextStream, GatewayError>;
}

/// Run a request to completion and return the concatenated reply.
///
/// When `on_chunk` is given the request is sent in streaming mode and every
/// fragment is forwarded to it before being appended. A closed receiver does
/// not interrupt the call.
pub async fn generate(
    gateway: &dyn LlmGateway,
    request: &GenerateRequest,
    on_chunk: Option<&mpsc::Sender<String>>,
) -> Result<String, GatewayError> {
    let request = request.clone().streaming(on_chunk.is_some());
    tracing::debug!(
        gateway = gateway.name(),
        stage = %request.stage,
        stream = request.stream,
        json = request.wants_json(),
        "sending generate request"
    );

    let mut stream = gateway.execute(&request).await?;
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        if fragment.is_empty() {
            continue;
        }
        if let Some(sink) = on_chunk {
            let _ = sink.send(fragment.clone()).await;
        }
        text.push_str(&fragment);
    }

    tracing::debug!(stage = %request.stage, chars = text.len(), "generate request finished");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FragmentGateway {
        fragments: Vec<Result<String, GatewayError>>,
    }

    #[async_trait]
    impl LlmGateway for FragmentGateway {
        fn name(&self) -> &'static str {
            "fragments"
        }

        async fn execute(&self, request: &GenerateRequest) -> Result<TextStream, GatewayError> {
            if !request.stream {
                let whole: String = self
                    .fragments
                    .iter()
                    .filter_map(|f| f.as_ref().ok().cloned())
                    .collect();
                return Ok(Box::pin(tokio_stream::once(Ok(whole))));
            }
            Ok(Box::pin(tokio_stream::iter(self.fragments.clone())))
        }
    }

    #[tokio::test]
    async fn test_generate_concatenates_and_forwards_in_order() {
        let gateway = FragmentGateway {
            fragments: vec![
                Ok("{\"a\":".to_string()),
                Ok(String::new()),
                Ok(" 1}".to_string()),
            ],
        };
        let request = GenerateRequest::new(Stage::Requirement, "sys", "prompt");
        let (tx, mut rx) = mpsc::channel(8);

        let text = generate(&gateway, &request, Some(&tx)).await.unwrap();
        drop(tx);

        assert_eq!(text, "{\"a\": 1}");
        let mut forwarded = Vec::new();
        while let Some(chunk) = rx.recv().await {
            forwarded.push(chunk);
        }
        assert_eq!(forwarded, vec!["{\"a\":", " 1}"]);
        assert_eq!(forwarded.concat(), text);
    }

    #[tokio::test]
    async fn test_generate_without_sink_uses_single_fragment() {
        let gateway = FragmentGateway {
            fragments: vec![Ok("Task".to_string()), Ok(" Forge".to_string())],
        };
        let request = GenerateRequest::new(Stage::Naming, "sys", "prompt");

        let text = generate(&gateway, &request, None).await.unwrap();
        assert_eq!(text, "Task Forge");
    }

    #[tokio::test]
    async fn test_generate_stops_on_stream_error() {
        let gateway = FragmentGateway {
            fragments: vec![
                Ok("partial".to_string()),
                Err(GatewayError::Transport("connection reset".to_string())),
            ],
        };
        let request = GenerateRequest::new(Stage::Design, "sys", "prompt");
        let (tx, _rx) = mpsc::channel(8);

        let result = generate(&gateway, &request, Some(&tx)).await;
        assert_eq!(
            result,
            Err(GatewayError::Transport("connection reset".to_string()))
        );
    }

    #[test]
    fn test_schema_is_appended_to_system_instruction() {
        let request = GenerateRequest::new(Stage::Requirement, "You are an analyst.", "p")
            .with_schema(serde_json::json!({"scope": "string"}));

        let system = request.full_system_instruction();
        assert!(system.starts_with("You are an analyst.\n\nOUTPUT MUST BE STRICT JSON"));
        assert!(system.contains("\"scope\": \"string\""));
        assert!(request.wants_json());

        let messages = request.messages();
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1], ChatMessage::user("p"));
    }

    #[test]
    fn test_request_without_schema_keeps_instruction() {
        let request = GenerateRequest::new(Stage::Development, "Write code.", "p");
        assert_eq!(request.full_system_instruction(), "Write code.");
        assert!(!request.wants_json());
    }
}
