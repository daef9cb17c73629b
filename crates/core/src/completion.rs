//! Completion service trait, the abstraction over LLM backends.
//!
//! A completion service knows how to send a conversation to an LLM and get
//! a response back, either as plain text content or as a set of structured
//! tool invocations. Message order and role semantics are preserved.

use crate::error::CompletionError;
use crate::message::{Message, MessageToolCall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The conversation messages, in order
    pub messages: Vec<Message>,

    /// Tools the model may call (empty = plain completion)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl CompletionRequest {
    /// A plain completion request with no tools declared.
    pub fn plain(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
        }
    }

    /// A completion request with declared tools.
    pub fn with_tools(messages: Vec<Message>, tools: Vec<ToolDefinition>) -> Self {
        Self { messages, tools }
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a completion service.
///
/// Either `content` holds the final text, or `tool_calls` holds the
/// invocations the model wants executed (content may carry interim
/// reasoning alongside tool calls).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text content
    pub content: String,

    /// Tool invocations requested by the model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

impl CompletionResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// The core completion service trait.
///
/// Every LLM backend implements this trait. The agents call `complete()`
/// without knowing which backend is being used.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// A human-readable name for this service (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_request_has_no_tools() {
        let req = CompletionRequest::plain(vec![Message::user("hello")]);
        assert!(req.tools.is_empty());
        assert_eq!(req.messages.len(), 1);
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "getPlanInfo".into(),
            description: "Retrieves subscription plan information".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string", "description": "Customer email address" }
                },
                "required": ["email"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("getPlanInfo"));
        assert!(json.contains("email"));
    }

    #[test]
    fn response_reports_tool_calls() {
        let mut resp = CompletionResponse {
            content: String::new(),
            tool_calls: vec![],
            model: "mock".into(),
        };
        assert!(!resp.has_tool_calls());

        resp.tool_calls.push(MessageToolCall {
            id: "call_1".into(),
            name: "getPlanInfo".into(),
            arguments: r#"{"email":"user1@example.com"}"#.into(),
        });
        assert!(resp.has_tool_calls());
    }
}
