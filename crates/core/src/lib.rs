//! # Crabdesk Core
//!
//! Domain types, traits, and error definitions for the crabdesk support
//! agent backend. This crate has **zero framework dependencies**: it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion service, document source) is
//! defined as a trait here. Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod completion;
pub mod error;
pub mod json;
pub mod message;

// Re-export key types at crate root for ergonomics
pub use completion::{CompletionRequest, CompletionResponse, CompletionService, ToolDefinition};
pub use error::{CompletionError, Error, Result, ToolError};
pub use message::{ConversationId, Message, MessageToolCall, Role};
