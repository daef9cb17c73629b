//! Technical specialist agent.
//!
//! Answers from retrieved documentation snippets only. The model is asked
//! for strict JSON with bracketed citations; parsing is lenient and every
//! failure path still yields an answer, flagged for clarification when the
//! snippets could not support one.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crabdesk_core::{CompletionRequest, CompletionService, Message, json};
use crabdesk_retrieval::Chunk;

/// How many trailing history turns are included in the prompt.
const HISTORY_TURNS: usize = 8;

const SYSTEM_PROMPT: &str = "You are a Technical Specialist. Answer questions ONLY using the provided documentation snippets. \
If the answer is not present in the documentation, explicitly state that the docs do not cover this topic and ask a clarifying question. \
Do NOT guess or make up information. Always include citations in the format [docId:sectionTitle] for each snippet you use. \
Respond with valid JSON only in this format: {\"answer\":\"your answer\",\"citations\":[\"docId:sectionTitle\",...],\"needs_clarification\":true|false}";

const COMPLETION_FAILED_APOLOGY: &str =
    "I apologize, but I encountered an error processing your question. ";
const NO_DOCS_SUFFIX: &str = "No documentation was found to answer your question.";

/// A tech agent answer.
#[derive(Debug, Clone)]
pub struct TechAnswer {
    pub answer: String,
    pub citations: Vec<String>,
    pub needs_clarification: bool,
}

/// Citation-constrained answering over retrieved snippets.
pub struct TechAgent {
    completion: Arc<dyn CompletionService>,
}

impl TechAgent {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Answer one user turn from the given snippets. Infallible; completion
    /// failures produce an apology flagged per snippet availability.
    pub async fn answer(
        &self,
        history: &[Message],
        user_message: &str,
        snippets: &[Chunk],
    ) -> TechAnswer {
        let messages = build_messages(history, user_message, snippets);

        match self
            .completion
            .complete(CompletionRequest::plain(messages))
            .await
        {
            Ok(response) => parse_response(&response.content, snippets),
            Err(e) => {
                warn!(error = %e, "Tech agent completion failed");
                let suffix = if snippets.is_empty() {
                    NO_DOCS_SUFFIX
                } else {
                    ""
                };
                TechAnswer {
                    answer: format!("{COMPLETION_FAILED_APOLOGY}{suffix}"),
                    citations: Vec::new(),
                    needs_clarification: snippets.is_empty(),
                }
            }
        }
    }
}

fn build_messages(history: &[Message], user_message: &str, snippets: &[Chunk]) -> Vec<Message> {
    let mut messages = vec![Message::system(SYSTEM_PROMPT)];
    messages.extend_from_slice(&history[history.len().saturating_sub(HISTORY_TURNS)..]);

    let mut prompt = format!("User question: {user_message}\n\n");
    if snippets.is_empty() {
        prompt.push_str("No relevant documentation snippets were found for this question.\n");
    } else {
        prompt.push_str("Relevant documentation snippets:\n\n");
        for (i, chunk) in snippets.iter().enumerate() {
            prompt.push_str(&format!(
                "Snippet {} [{}:{}]:\n{}\n\n",
                i + 1,
                chunk.doc_id,
                chunk.section_title,
                chunk.text
            ));
        }
    }
    prompt.push_str(
        "Respond with JSON: {\"answer\":\"...\",\"citations\":[\"docId:sectionTitle\",...],\"needs_clarification\":true|false}",
    );

    messages.push(Message::user(prompt));
    messages
}

fn parse_response(content: &str, snippets: &[Chunk]) -> TechAnswer {
    match json::parse_object(content) {
        Some(parsed) => {
            let answer = parsed
                .get("answer")
                .and_then(Value::as_str)
                .unwrap_or(content)
                .to_string();
            let citations = parsed
                .get("citations")
                .and_then(Value::as_array)
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let flagged = parsed
                .get("needs_clarification")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            TechAnswer {
                answer,
                citations,
                needs_clarification: flagged || snippets.is_empty(),
            }
        }
        None => {
            debug!("Tech agent response was not JSON, applying coverage heuristic");
            let lowered = content.to_lowercase();
            let docs_cover_it = !snippets.is_empty()
                && !lowered.contains("don't cover")
                && !lowered.contains("doesn't cover")
                && !lowered.contains("not found");

            TechAnswer {
                answer: content.to_string(),
                citations: Vec::new(),
                needs_clarification: !docs_cover_it,
            }
        }
    }
}
