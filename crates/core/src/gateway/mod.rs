//! LLM gateway abstraction.
//!
//! This module provides the `LlmGateway` trait (Adapter Pattern), one adapter
//! per supported provider, and the `GatewayFactory` that picks an adapter
//! from the global configuration.

pub mod adapters;
pub mod base;
pub mod factory;
pub mod stream;

pub use adapters::MockGateway;
pub use base::{generate, ChatMessage, GatewayError, GenerateRequest, LlmGateway, TextStream};
pub use factory::GatewayFactory;
