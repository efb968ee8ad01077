//! Summarization: prompt construction, provider dispatch and the two
//! hosted LLM backends.

pub mod client;
pub mod gateway;
pub mod gemini;
pub mod openrouter;
pub mod prompt_builder;

// Re-export main types for convenience
pub use client::estimate_tokens;
pub use gateway::{ProviderGateway, SummarizationProvider};
pub use prompt_builder::PromptTemplate;
