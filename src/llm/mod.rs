//! LLM client abstraction and retry/salvage gateway.

pub mod client;
pub mod gateway;

pub use client::{LlmClient, LlmCompletion, TokenUsage};
pub use gateway::{GatewayResponse, LlmGateway, LlmGatewayJsonError};
