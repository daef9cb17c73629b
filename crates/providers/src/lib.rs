//! # Crabdesk Providers
//!
//! Concrete `CompletionService` implementations. There is one today: an
//! OpenAI-compatible HTTP client, which covers OpenAI itself plus the many
//! services exposing the same `/v1/chat/completions` surface (OpenRouter,
//! Ollama, vLLM, Together AI, and others).

pub mod openai_compat;

pub use openai_compat::OpenAiCompatService;
