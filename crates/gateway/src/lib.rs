//! HTTP gateway for crabdesk.
//!
//! Endpoints:
//!
//! - `POST /chat`: send a message, get the routed agent's answer
//! - `GET  /health`: liveness probe
//!
//! Built on Axum. Validation failures are 400s with an error body;
//! anything that escapes the orchestrator becomes a 500 with the
//! `agent: "ERROR"` envelope so clients always get the same shape back.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crabdesk_agents::{Orchestrator, TurnOutcome};
use crabdesk_core::ConversationId;

/// Shared state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub conversation_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub agent: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl ChatResponse {
    fn from_outcome(conversation_id: &str, outcome: TurnOutcome) -> Self {
        Self {
            conversation_id: Some(conversation_id.to_string()),
            agent: outcome.agent.as_str().to_string(),
            response: outcome.response,
            citations: outcome.citations,
            tool_used: outcome.tool_used,
            case_id: outcome.case_id,
            meta: outcome.meta,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.conversation_id.trim().is_empty() || request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "conversationId and message must be non-empty".into(),
            }),
        )
            .into_response();
    }

    let conversation_id = ConversationId::from(&request.conversation_id);
    match state
        .orchestrator
        .handle(&conversation_id, &request.message)
        .await
    {
        Ok(outcome) => {
            Json(ChatResponse::from_outcome(&request.conversation_id, outcome)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Turn handling failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatResponse {
                    conversation_id: None,
                    agent: "ERROR".into(),
                    response: format!("An error occurred: {e}"),
                    citations: None,
                    tool_used: None,
                    case_id: None,
                    meta: None,
                }),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    use crabdesk_agents::{BillingAgent, Router as IntentRouter, TechAgent};
    use crabdesk_billing::RefundPolicy;
    use crabdesk_core::{
        CompletionError, CompletionRequest, CompletionResponse, CompletionService, MessageToolCall,
    };
    use crabdesk_retrieval::{Chunk, DocumentSource, Retriever};
    use crabdesk_storage::{BillingStore, ConversationStore};

    struct ScriptedService {
        script: Mutex<Vec<Result<CompletionResponse, CompletionError>>>,
    }

    impl ScriptedService {
        fn new(script: Vec<Result<CompletionResponse, CompletionError>>) -> Self {
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait::async_trait]
    impl CompletionService for ScriptedService {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            let mut script = self.script.lock().unwrap();
            assert!(!script.is_empty(), "script exhausted");
            script.remove(0)
        }
    }

    struct NoDocs;
    impl DocumentSource for NoDocs {
        fn load_all(&self) -> std::collections::BTreeMap<String, String> {
            std::collections::BTreeMap::new()
        }
    }

    fn text(content: &str) -> Result<CompletionResponse, CompletionError> {
        Ok(CompletionResponse {
            content: content.to_string(),
            tool_calls: Vec::new(),
            model: "mock".into(),
        })
    }

    fn app(script: Vec<Result<CompletionResponse, CompletionError>>) -> Router {
        let completion: Arc<dyn CompletionService> = Arc::new(ScriptedService::new(script));
        let policy = Arc::new(RefundPolicy::new(
            Arc::new(BillingStore::with_seed_data()),
            Arc::new(NoDocs),
        ));
        let retriever = Arc::new(Retriever::from_chunks(vec![Chunk::new(
            "api_guide",
            "Webhooks",
            "Configure webhook endpoints in the dashboard settings.",
        )]));
        let orchestrator = Arc::new(Orchestrator::new(
            IntentRouter::new(completion.clone()),
            retriever,
            TechAgent::new(completion.clone()),
            BillingAgent::new(completion, policy),
            Arc::new(ConversationStore::new()),
        ));
        build_router(Arc::new(GatewayState { orchestrator }))
    }

    fn chat_request(conversation_id: &str, message: &str) -> Request<Body> {
        let body = serde_json::json!({
            "conversationId": conversation_id,
            "message": message,
        });
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app(Vec::new());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let app1 = app(Vec::new());
        let response = app1.oneshot(chat_request("conv-1", "   ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let app2 = app(Vec::new());
        let response = app2.oneshot(chat_request("", "hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(error.error.contains("non-empty"));
    }

    #[tokio::test]
    async fn tech_turn_round_trips_citations_and_meta() {
        let app = app(vec![
            text(r#"{"route":"TECH","why":"webhook setup"}"#),
            text(
                r#"{"answer":"Set the endpoint in dashboard settings. [api_guide:Webhooks]","citations":["api_guide:Webhooks"],"needs_clarification":false}"#,
            ),
        ]);

        let response = app
            .oneshot(chat_request("conv-tech", "How do I configure a webhook?"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let chat: ChatResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(chat.agent, "TECH");
        assert_eq!(chat.conversation_id.as_deref(), Some("conv-tech"));
        assert_eq!(chat.citations.unwrap(), vec!["api_guide:Webhooks"]);
        assert_eq!(chat.meta.unwrap()["snippetsFound"], 1);
        assert!(chat.tool_used.is_none());
    }

    #[tokio::test]
    async fn refund_turn_reports_case_id() {
        let tool_call = CompletionResponse {
            content: String::new(),
            tool_calls: vec![MessageToolCall {
                id: "call_1".into(),
                name: "openRefundCase".into(),
                arguments: serde_json::json!({
                    "email": "user1@example.com",
                    "orderId": "ORD-5",
                    "reason": "accidental purchase"
                })
                .to_string(),
            }],
            model: "mock".into(),
        };
        let app = app(vec![
            text(r#"{"route":"BILLING","why":"refund request"}"#),
            Ok(tool_call),
            text("Your refund case is open; check the form link."),
        ]);

        let response = app
            .oneshot(chat_request("conv-billing", "How do I get a refund?"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let chat: ChatResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(chat.agent, "BILLING");
        assert_eq!(chat.tool_used.as_deref(), Some("openRefundCase"));
        assert_eq!(chat.case_id.as_deref(), Some("REF-1000"));
        assert!(chat.citations.is_none());
    }

    #[tokio::test]
    async fn out_of_scope_omits_optional_fields_on_the_wire() {
        let app = app(vec![text(r#"{"route":"OUT_OF_SCOPE","why":"recipes"}"#)]);

        let response = app
            .oneshot(chat_request("conv-oos", "Best pasta recipe?"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(raw["agent"], "OUT_OF_SCOPE");
        assert!(raw.get("citations").is_none());
        assert!(raw.get("toolUsed").is_none());
        assert!(raw.get("caseId").is_none());
        assert!(raw.get("meta").is_none());
    }

    #[tokio::test]
    async fn internal_failure_returns_error_envelope() {
        let app = app(vec![
            text(r#"{"route":"BILLING","why":"plan question"}"#),
            Err(CompletionError::Network("connection refused".into())),
        ]);

        let response = app
            .oneshot(chat_request("conv-err", "What plan am I on?"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let chat: ChatResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(chat.agent, "ERROR");
        assert!(chat.response.starts_with("An error occurred:"));
    }
}
