//! Intent router.
//!
//! Classifies a user turn into TECH, BILLING, or OUT_OF_SCOPE with one LLM
//! call, retrying exactly once with a stricter directive when the first
//! response cannot be parsed. The router never fails: any second failure
//! collapses to OUT_OF_SCOPE so the turn still gets a deflection answer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crabdesk_core::{CompletionRequest, CompletionService, Message, Role, json};

/// How many trailing history turns are embedded as routing context.
const CONTEXT_TURNS: usize = 6;

const SYSTEM_PROMPT: &str = "You are a routing assistant. Classify user messages into TECH, BILLING, or OUT_OF_SCOPE. Respond with valid JSON only: {\"route\":\"TECH|BILLING|OUT_OF_SCOPE\",\"why\":\"brief explanation\"}";

/// The three routing destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Route {
    Tech,
    Billing,
    OutOfScope,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Tech => "TECH",
            Route::Billing => "BILLING",
            Route::OutOfScope => "OUT_OF_SCOPE",
        }
    }

    /// Case-insensitive wire name parse; anything unrecognized is
    /// OUT_OF_SCOPE.
    fn from_wire(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "TECH" => Route::Tech,
            "BILLING" => Route::Billing,
            _ => Route::OutOfScope,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routing decision with the model's brief rationale.
#[derive(Debug, Clone)]
pub struct RouteResult {
    pub route: Route,
    pub rationale: String,
}

/// LLM-backed intent classifier.
pub struct Router {
    completion: Arc<dyn CompletionService>,
}

impl Router {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Classify one user turn. Infallible; see module docs.
    pub async fn route(&self, history: &[Message], user_message: &str) -> RouteResult {
        let prompt = build_routing_prompt(history, user_message);

        match self.attempt(&prompt).await {
            Ok(result) => {
                debug!(route = %result.route, "Routed message");
                result
            }
            Err(reason) => {
                warn!(reason = %reason, "Routing attempt failed, retrying with strict directive");
                let strict_prompt = format!(
                    "{prompt}\n\nIMPORTANT: Return ONLY valid JSON, no other text. Format: {{\"route\":\"TECH|BILLING|OUT_OF_SCOPE\",\"why\":\"...\"}}"
                );
                match self.attempt(&strict_prompt).await {
                    Ok(result) => result,
                    Err(reason) => {
                        warn!(reason = %reason, "Routing failed twice, defaulting to OUT_OF_SCOPE");
                        RouteResult {
                            route: Route::OutOfScope,
                            rationale: format!("Failed to parse routing response: {reason}"),
                        }
                    }
                }
            }
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<RouteResult, String> {
        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
        let response = self
            .completion
            .complete(CompletionRequest::plain(messages))
            .await
            .map_err(|e| e.to_string())?;

        parse_route_response(&response.content)
            .ok_or_else(|| format!("No JSON object in routing response: {}", response.content))
    }
}

fn build_routing_prompt(history: &[Message], user_message: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("Classify the following user message:\n\n");
    prompt.push_str(&format!("User message: {user_message}\n\n"));

    if !history.is_empty() {
        prompt.push_str("Recent conversation context:\n");
        let context = &history[history.len().saturating_sub(CONTEXT_TURNS)..];
        for message in context {
            prompt.push_str(&format!(
                "{}: {}\n",
                role_label(message.role),
                message.content
            ));
        }
        prompt.push('\n');
    }

    prompt.push_str("Classification rules:\n");
    prompt.push_str("- TECH: Technical questions about APIs, integration, webhooks, authentication, errors, implementation\n");
    prompt.push_str("- BILLING: Questions about payments, refunds, subscriptions, plans, invoices, billing issues\n");
    prompt.push_str("- OUT_OF_SCOPE: Anything else (general questions, unrelated topics, etc.)\n\n");
    prompt.push_str(
        "Respond with JSON only: {\"route\":\"TECH|BILLING|OUT_OF_SCOPE\",\"why\":\"brief explanation\"}",
    );

    prompt
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::System => "SYSTEM",
        Role::User => "USER",
        Role::Assistant => "ASSISTANT",
        Role::Tool => "TOOL",
    }
}

fn parse_route_response(content: &str) -> Option<RouteResult> {
    let parsed = json::parse_object(content)?;
    let route = parsed
        .get("route")
        .and_then(Value::as_str)
        .map(Route::from_wire)
        .unwrap_or(Route::OutOfScope);
    let rationale = parsed
        .get("why")
        .and_then(Value::as_str)
        .unwrap_or("No explanation provided")
        .to_string();
    Some(RouteResult { route, rationale })
}
