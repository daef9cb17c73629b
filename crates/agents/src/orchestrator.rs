//! Conversation orchestrator.
//!
//! Sequences one turn: fetch prompt history, persist the user message,
//! route, dispatch to a specialist, persist the assistant reply. History
//! handed to the router and agents is the state from before this turn's
//! user message.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use crabdesk_core::{ConversationId, Error, Message};
use crabdesk_retrieval::{DEFAULT_TOP_K, Retriever};
use crabdesk_storage::ConversationStore;

use crate::billing::BillingAgent;
use crate::router::{Route, Router};
use crate::tech::TechAgent;

const OUT_OF_SCOPE_RESPONSE: &str = "I apologize, but I'm specifically trained to help with technical questions and billing inquiries. \
Could you please rephrase your question, or let me know if you have a technical or billing-related question I can help with?";

/// Everything a completed turn produced, ready for the wire.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub agent: Route,
    pub response: String,
    pub citations: Option<Vec<String>>,
    pub tool_used: Option<String>,
    pub case_id: Option<String>,
    pub meta: Option<Map<String, Value>>,
}

/// Coordinates the router, agents, and conversation store.
pub struct Orchestrator {
    router: Router,
    retriever: Arc<Retriever>,
    tech_agent: TechAgent,
    billing_agent: BillingAgent,
    conversations: Arc<ConversationStore>,
}

impl Orchestrator {
    pub fn new(
        router: Router,
        retriever: Arc<Retriever>,
        tech_agent: TechAgent,
        billing_agent: BillingAgent,
        conversations: Arc<ConversationStore>,
    ) -> Self {
        Self {
            router,
            retriever,
            tech_agent,
            billing_agent,
            conversations,
        }
    }

    /// Handle one user turn end to end.
    #[instrument(skip_all, fields(conversation_id = %conversation_id))]
    pub async fn handle(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<TurnOutcome, Error> {
        let history = self.conversations.history_for_prompt(conversation_id).await;
        self.conversations
            .append(conversation_id, Message::user(text))
            .await;

        let route_result = self.router.route(&history, text).await;
        info!(route = %route_result.route, rationale = %route_result.rationale, "Dispatching turn");

        let outcome = match route_result.route {
            Route::Tech => self.handle_tech(&history, text).await,
            Route::Billing => self.handle_billing(&history, text).await?,
            Route::OutOfScope => TurnOutcome {
                agent: Route::OutOfScope,
                response: OUT_OF_SCOPE_RESPONSE.to_string(),
                citations: None,
                tool_used: None,
                case_id: None,
                meta: None,
            },
        };

        self.conversations
            .append(conversation_id, Message::assistant(outcome.response.clone()))
            .await;

        Ok(outcome)
    }

    async fn handle_tech(&self, history: &[Message], text: &str) -> TurnOutcome {
        let snippets = self.retriever.retrieve(text, DEFAULT_TOP_K);
        let result = self.tech_agent.answer(history, text, &snippets).await;

        let mut meta = Map::new();
        meta.insert("snippetsFound".to_string(), json!(snippets.len()));
        meta.insert(
            "needsClarification".to_string(),
            json!(result.needs_clarification),
        );

        TurnOutcome {
            agent: Route::Tech,
            response: result.answer,
            citations: Some(result.citations),
            tool_used: None,
            case_id: None,
            meta: Some(meta),
        }
    }

    async fn handle_billing(&self, history: &[Message], text: &str) -> Result<TurnOutcome, Error> {
        let result = self.billing_agent.answer(history, text).await?;

        let case_id = if result.tool_used.is_some() {
            result
                .meta
                .get("caseId")
                .and_then(Value::as_str)
                .map(str::to_string)
        } else {
            None
        };

        Ok(TurnOutcome {
            agent: Route::Billing,
            response: result.response,
            citations: None,
            tool_used: result.tool_used,
            case_id,
            meta: Some(result.meta),
        })
    }
}
