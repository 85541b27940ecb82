//! LLM integration for repro-forge.
//!
//! A single OpenAI-compatible client sits behind the [`LlmProvider`] trait.
//! Everything that talks to a model goes through [`crate::oracle`], which
//! narrows the provider down to the yes/no, generate and score operations
//! the pipeline needs.
//!
//! ```ignore
//! use repro_forge::config::ForgeConfig;
//! use repro_forge::llm::{GenerationRequest, LiteLlmClient, LlmProvider, Message};
//!
//! let client = LiteLlmClient::from_config(&ForgeConfig::from_env()?);
//! let request = GenerationRequest::new("", vec![Message::user("Hello")]);
//! let response = client.generate(request).await?;
//! ```

pub mod litellm;

pub use litellm::{
    Choice, GenerationRequest, GenerationResponse, LiteLlmClient, LlmProvider, Message,
};
