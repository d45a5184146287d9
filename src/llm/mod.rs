pub mod client;
pub mod provider;
pub mod providers;

pub use client::{LLMClient, RetryConfig};
pub use provider::{CompletionOptions, CompletionResponse, LLMProvider, Message};
