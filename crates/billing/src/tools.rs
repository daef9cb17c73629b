//! Typed billing tool dispatch.
//!
//! Tool calls arrive from the model as a name plus a JSON-encoded argument
//! string. Parsing produces a tagged `BillingToolCall` variant with typed
//! arguments, so the execution path never branches on raw strings and
//! missing fields fail at one place with one error shape.

use serde::Deserialize;
use serde_json::json;

use crabdesk_core::{ToolDefinition, ToolError};

pub const OPEN_REFUND_CASE: &str = "openRefundCase";
pub const GET_PLAN_INFO: &str = "getPlanInfo";
pub const ESTIMATE_REFUND_TIMELINE: &str = "estimateRefundTimeline";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRefundCaseArgs {
    pub email: String,
    pub order_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPlanInfoArgs {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRefundTimelineArgs {
    pub payment_method: String,
    pub purchase_date_iso: String,
}

/// A parsed, validated billing tool invocation.
#[derive(Debug, Clone)]
pub enum BillingToolCall {
    OpenRefundCase(OpenRefundCaseArgs),
    GetPlanInfo(GetPlanInfoArgs),
    EstimateRefundTimeline(EstimateRefundTimelineArgs),
}

impl BillingToolCall {
    /// Parse a raw (name, arguments) pair from the model.
    pub fn parse(name: &str, arguments: &str) -> Result<Self, ToolError> {
        match name {
            OPEN_REFUND_CASE => serde_json::from_str(arguments)
                .map(Self::OpenRefundCase)
                .map_err(|e| ToolError::InvalidArguments(e.to_string())),
            GET_PLAN_INFO => serde_json::from_str(arguments)
                .map(Self::GetPlanInfo)
                .map_err(|e| ToolError::InvalidArguments(e.to_string())),
            ESTIMATE_REFUND_TIMELINE => serde_json::from_str(arguments)
                .map(Self::EstimateRefundTimeline)
                .map_err(|e| ToolError::InvalidArguments(e.to_string())),
            other => Err(ToolError::Unknown(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenRefundCase(_) => OPEN_REFUND_CASE,
            Self::GetPlanInfo(_) => GET_PLAN_INFO,
            Self::EstimateRefundTimeline(_) => ESTIMATE_REFUND_TIMELINE,
        }
    }
}

/// The tool schemas advertised to the model.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: OPEN_REFUND_CASE.to_string(),
            description: "Opens a refund case and generates a form link. Requires email, orderId, and reason.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string", "description": "Customer email address" },
                    "orderId": { "type": "string", "description": "Order ID for the refund" },
                    "reason": { "type": "string", "description": "Reason for refund request" }
                },
                "required": ["email", "orderId", "reason"]
            }),
        },
        ToolDefinition {
            name: GET_PLAN_INFO.to_string(),
            description: "Retrieves subscription plan information for a customer by email address."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string", "description": "Customer email address" }
                },
                "required": ["email"]
            }),
        },
        ToolDefinition {
            name: ESTIMATE_REFUND_TIMELINE.to_string(),
            description: "Estimates refund timeline based on payment method and purchase date according to billing policy.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "paymentMethod": { "type": "string", "description": "Payment method used (e.g., credit card, PayPal, bank transfer)" },
                    "purchaseDateIso": { "type": "string", "description": "Purchase date in ISO format (YYYY-MM-DD)" }
                },
                "required": ["paymentMethod", "purchaseDateIso"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_refund_case() {
        let call = BillingToolCall::parse(
            OPEN_REFUND_CASE,
            r#"{"email":"a@example.com","orderId":"ORD-7","reason":"defective"}"#,
        )
        .unwrap();
        match call {
            BillingToolCall::OpenRefundCase(args) => {
                assert_eq!(args.email, "a@example.com");
                assert_eq!(args.order_id, "ORD-7");
                assert_eq!(args.reason, "defective");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_tool_name_is_an_error() {
        let err = BillingToolCall::parse("closeAccount", "{}").unwrap_err();
        assert!(matches!(err, ToolError::Unknown(name) if name == "closeAccount"));
    }

    #[test]
    fn missing_field_is_invalid_arguments() {
        let err =
            BillingToolCall::parse(OPEN_REFUND_CASE, r#"{"email":"a@example.com"}"#).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn malformed_json_is_invalid_arguments() {
        let err = BillingToolCall::parse(GET_PLAN_INFO, "not json").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn definitions_cover_all_three_tools() {
        let defs = definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![OPEN_REFUND_CASE, GET_PLAN_INFO, ESTIMATE_REFUND_TIMELINE]
        );
        for def in &defs {
            assert_eq!(def.parameters["type"], "object");
            assert!(def.parameters["required"].is_array());
        }
    }
}
