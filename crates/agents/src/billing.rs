//! Billing support agent.
//!
//! Runs a bounded tool-calling loop: the model may invoke the billing
//! tools up to a fixed number of rounds before the loop returns a fixed
//! wrap-up message. Tool failures of any kind are fed back to the model
//! as in-band `error` maps; completion failures propagate to the caller.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crabdesk_billing::{BillingToolCall, RefundPolicy, definitions};
use crabdesk_core::{CompletionRequest, CompletionService, Error, Message};

/// Maximum completion rounds before the loop gives up.
const MAX_TOOL_ITERATIONS: usize = 5;

/// How many trailing history turns are included in the prompt.
const HISTORY_TURNS: usize = 10;

const SYSTEM_PROMPT: &str = "You are a Billing Support Agent. Help users with billing questions, refunds, subscriptions, and plans. \
Ask for missing information (email, orderId, purchaseDate, paymentMethod) when needed. \
Use the provided tools to look up information and process refunds. \
Be friendly, professional, and clear.";

const EXHAUSTED_RESPONSE: &str =
    "I've processed your request. Please let me know if you need anything else.";

/// A billing agent answer with tool telemetry for the turn.
#[derive(Debug, Clone)]
pub struct BillingAnswer {
    pub response: String,
    /// Name of the last tool the model invoked, if any.
    pub tool_used: Option<String>,
    /// Cumulative tool result map; later results overwrite earlier keys.
    pub meta: Map<String, Value>,
}

/// Tool-calling billing agent.
pub struct BillingAgent {
    completion: Arc<dyn CompletionService>,
    policy: Arc<RefundPolicy>,
}

impl BillingAgent {
    pub fn new(completion: Arc<dyn CompletionService>, policy: Arc<RefundPolicy>) -> Self {
        Self { completion, policy }
    }

    /// Answer one user turn, executing tools as the model requests them.
    pub async fn answer(
        &self,
        history: &[Message],
        user_message: &str,
    ) -> Result<BillingAnswer, Error> {
        let mut messages = build_messages(history, user_message);
        let tools = definitions();

        let mut tool_used: Option<String> = None;
        let mut meta = Map::new();

        for iteration in 0..MAX_TOOL_ITERATIONS {
            let response = self
                .completion
                .complete(CompletionRequest::with_tools(messages.clone(), tools.clone()))
                .await?;

            if !response.has_tool_calls() {
                debug!(iteration, "Billing agent produced final answer");
                return Ok(BillingAnswer {
                    response: response.content,
                    tool_used,
                    meta,
                });
            }

            let mut assistant_turn = Message::assistant(response.content.clone());
            assistant_turn.tool_calls = response.tool_calls.clone();
            messages.push(assistant_turn);

            for call in &response.tool_calls {
                tool_used = Some(call.name.clone());
                let result = self.run_tool(&call.name, &call.arguments).await;
                meta.extend(result.clone());

                messages.push(Message::tool_result(
                    call.id.clone(),
                    Value::Object(result).to_string(),
                ));
            }
        }

        warn!("Billing agent exhausted its tool iterations");
        Ok(BillingAnswer {
            response: EXHAUSTED_RESPONSE.to_string(),
            tool_used,
            meta,
        })
    }

    /// Execute one tool call. Never errors; anything that goes wrong
    /// becomes an `error` entry the model can read.
    async fn run_tool(&self, name: &str, arguments: &str) -> Map<String, Value> {
        match BillingToolCall::parse(name, arguments) {
            Ok(call) => self.policy.execute(call).await,
            Err(e) => {
                warn!(tool = name, error = %e, "Billing tool call rejected");
                let mut error = Map::new();
                error.insert("error".to_string(), json!(e.to_string()));
                error
            }
        }
    }
}

fn build_messages(history: &[Message], user_message: &str) -> Vec<Message> {
    let mut messages = vec![Message::system(SYSTEM_PROMPT)];
    messages.extend_from_slice(&history[history.len().saturating_sub(HISTORY_TURNS)..]);
    messages.push(Message::user(user_message));
    messages
}
