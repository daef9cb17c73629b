//! Shared test helpers for agent tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crabdesk_core::{
    CompletionError, CompletionRequest, CompletionResponse, CompletionService, MessageToolCall,
};

/// A mock completion service that returns a sequence of scripted outcomes.
///
/// Each call to `complete` returns the next entry in the script.
/// Panics if more calls are made than entries provided.
pub struct ScriptedCompletionService {
    script: Mutex<Vec<Result<CompletionResponse, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_count: Mutex<usize>,
}

impl ScriptedCompletionService {
    pub fn new(script: Vec<Result<CompletionResponse, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            call_count: Mutex::new(0),
        }
    }

    /// A service scripted with exactly one text response.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(text_response(text))])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Requests recorded so far, for asserting on prompt construction.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletionService {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.requests.lock().unwrap().push(request);
        let mut count = self.call_count.lock().unwrap();
        let script = self.script.lock().unwrap();

        if *count >= script.len() {
            panic!(
                "ScriptedCompletionService: no more responses (call #{}, have {})",
                *count,
                script.len()
            );
        }

        let result = script[*count].clone();
        *count += 1;
        result
    }
}

/// Create a plain text response (no tool calls).
pub fn text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        content: text.to_string(),
        tool_calls: Vec::new(),
        model: "mock-model".into(),
    }
}

/// Create a response carrying tool calls and optional interim content.
pub fn tool_call_response(tool_calls: Vec<MessageToolCall>, content: &str) -> CompletionResponse {
    CompletionResponse {
        content: content.to_string(),
        tool_calls,
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call.
pub fn tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}
