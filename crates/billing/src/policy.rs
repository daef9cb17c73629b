//! Refund policy engine.
//!
//! Each operation returns a flat `serde_json::Map` that gets serialized
//! into a tool-result message and merged into the turn's metadata. Domain
//! conditions the model should see (no plan on file, unparseable date) are
//! `error` entries in the map, not `Err` values.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use crabdesk_retrieval::DocumentSource;
use crabdesk_storage::BillingStore;

use crate::tools::BillingToolCall;

/// Days after purchase during which a refund is eligible.
pub const REFUND_WINDOW_DAYS: i64 = 14;

/// Doc id of the customer-facing billing policy document.
const POLICY_DOC_ID: &str = "billing_policy";

const FALLBACK_POLICY: &str =
    "Refund window: 14 days from purchase date. Processing times vary by payment method.";

/// Executes billing tool calls against the store and the policy docs.
pub struct RefundPolicy {
    store: Arc<BillingStore>,
    docs: Arc<dyn DocumentSource>,
}

impl RefundPolicy {
    pub fn new(store: Arc<BillingStore>, docs: Arc<dyn DocumentSource>) -> Self {
        Self { store, docs }
    }

    /// Run a parsed tool call and return its result map.
    pub async fn execute(&self, call: BillingToolCall) -> Map<String, Value> {
        debug!(tool = call.name(), "Executing billing tool");
        match call {
            BillingToolCall::OpenRefundCase(args) => {
                self.open_refund_case(&args.email, &args.order_id, &args.reason)
                    .await
            }
            BillingToolCall::GetPlanInfo(args) => self.get_plan_info(&args.email).await,
            BillingToolCall::EstimateRefundTimeline(args) => {
                self.estimate_refund_timeline(&args.payment_method, &args.purchase_date_iso)
            }
        }
    }

    /// Open a refund case. Always succeeds; the form link gets a fresh uuid.
    pub async fn open_refund_case(
        &self,
        email: &str,
        order_id: &str,
        reason: &str,
    ) -> Map<String, Value> {
        let form_link = format!("https://example.com/refund-form/{}", Uuid::new_v4());
        let case = self
            .store
            .create_refund_case(email, order_id, reason, &form_link)
            .await;

        let mut result = Map::new();
        result.insert("caseId".to_string(), json!(case.case_id));
        result.insert("formLink".to_string(), json!(case.form_link));
        result.insert("status".to_string(), json!(case.status.to_string()));
        result
    }

    /// Look up a customer's plan by email.
    pub async fn get_plan_info(&self, email: &str) -> Map<String, Value> {
        let mut result = Map::new();
        match self.store.plan_info(email).await {
            Some(plan) => {
                result.insert("email".to_string(), json!(email));
                result.insert("planName".to_string(), json!(plan.plan_name));
                result.insert("price".to_string(), json!(plan.price));
                result.insert(
                    "renewalDate".to_string(),
                    json!(plan.renewal_date.to_string()),
                );
            }
            None => {
                result.insert(
                    "error".to_string(),
                    json!(format!("No plan found for email: {email}")),
                );
            }
        }
        result
    }

    /// Estimate the refund timeline for a payment method and purchase date.
    pub fn estimate_refund_timeline(
        &self,
        payment_method: &str,
        purchase_date_iso: &str,
    ) -> Map<String, Value> {
        self.estimate_refund_timeline_at(payment_method, purchase_date_iso, Utc::now().date_naive())
    }

    fn estimate_refund_timeline_at(
        &self,
        payment_method: &str,
        purchase_date_iso: &str,
        today: NaiveDate,
    ) -> Map<String, Value> {
        let mut result = Map::new();

        let purchase_date = match NaiveDate::parse_from_str(purchase_date_iso, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                warn!(purchase_date = purchase_date_iso, error = %e, "Unparseable purchase date");
                result.insert("error".to_string(), json!(format!("Invalid date format: {e}")));
                result.insert(
                    "timelineText".to_string(),
                    json!("Unable to estimate timeline. Please provide valid purchase date in ISO format (YYYY-MM-DD)."),
                );
                return result;
            }
        };

        let days_since_purchase = (today - purchase_date).num_days();
        let eligible = days_since_purchase <= REFUND_WINDOW_DAYS;

        result.insert("eligible".to_string(), json!(eligible));
        result.insert("daysSincePurchase".to_string(), json!(days_since_purchase));

        if !eligible {
            result.insert(
                "timelineText".to_string(),
                json!(format!(
                    "Refund not eligible: Purchase was {days_since_purchase} days ago. Refund window is {REFUND_WINDOW_DAYS} days."
                )),
            );
            return result;
        }

        let method = payment_method.to_lowercase();
        let timeline_text = if method.contains("card")
            || method.contains("credit")
            || method.contains("debit")
        {
            "Card refunds typically take 5-10 business days to process and appear on your statement."
        } else if method.contains("paypal") {
            "PayPal refunds typically take 1-3 business days to process."
        } else if method.contains("bank") || method.contains("transfer") {
            "Bank transfer refunds may take up to 10 business days to process."
        } else {
            "Refund timeline depends on payment method. Please allow 5-10 business days for processing."
        };

        result.insert("timelineText".to_string(), json!(timeline_text));
        result.insert("policy".to_string(), json!(self.policy_text()));
        result
    }

    fn policy_text(&self) -> String {
        self.docs
            .load(POLICY_DOC_ID)
            .unwrap_or_else(|| FALLBACK_POLICY.to_string())
    }
}
