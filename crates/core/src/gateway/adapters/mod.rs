//! Provider adapters for the `LlmGateway` trait.

pub mod backend_adapter;
pub mod gemini_adapter;
pub mod mock_gateway;
pub mod ollama_adapter;
pub mod openai_adapter;

pub use backend_adapter::BackendAdapter;
pub use gemini_adapter::GeminiAdapter;
pub use mock_gateway::{MockGateway, MockReply};
pub use ollama_adapter::OllamaAdapter;
pub use openai_adapter::OpenAiAdapter;
