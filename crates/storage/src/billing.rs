//! Billing records: subscription plans and refund cases.
//!
//! Plans are read-only seed data keyed by customer email. Refund cases get
//! ids "REF-<n>" from a single atomic counter starting at 1000; ids are
//! never reused, even across interleaved creates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

const FIRST_CASE_ID: u64 = 1000;

/// A customer's subscription plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInfo {
    pub plan_name: String,
    pub price: f64,
    pub renewal_date: NaiveDate,
}

/// Refund case lifecycle status. Cases only open today; the variant set
/// leaves room for resolution states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Open,
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStatus::Open => write!(f, "OPEN"),
        }
    }
}

/// An opened refund case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundCase {
    pub case_id: String,
    pub email: String,
    pub order_id: String,
    pub reason: String,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    pub form_link: String,
}

/// In-memory billing store.
pub struct BillingStore {
    plans_by_email: RwLock<HashMap<String, PlanInfo>>,
    cases_by_id: RwLock<HashMap<String, RefundCase>>,
    next_case_id: AtomicU64,
}

impl BillingStore {
    /// An empty store (tests seed their own data).
    pub fn new() -> Self {
        Self {
            plans_by_email: RwLock::new(HashMap::new()),
            cases_by_id: RwLock::new(HashMap::new()),
            next_case_id: AtomicU64::new(FIRST_CASE_ID),
        }
    }

    /// A store pre-loaded with the demo subscription plans.
    pub fn with_seed_data() -> Self {
        let today = Utc::now().date_naive();
        let mut plans = HashMap::new();
        plans.insert(
            "user1@example.com".to_string(),
            PlanInfo {
                plan_name: "Premium".to_string(),
                price: 29.99,
                renewal_date: today + Months::new(1),
            },
        );
        plans.insert(
            "user2@example.com".to_string(),
            PlanInfo {
                plan_name: "Basic".to_string(),
                price: 9.99,
                renewal_date: today + Days::new(15),
            },
        );
        plans.insert(
            "user3@example.com".to_string(),
            PlanInfo {
                plan_name: "Enterprise".to_string(),
                price: 99.99,
                renewal_date: today + Months::new(3),
            },
        );
        Self {
            plans_by_email: RwLock::new(plans),
            cases_by_id: RwLock::new(HashMap::new()),
            next_case_id: AtomicU64::new(FIRST_CASE_ID),
        }
    }

    pub async fn plan_info(&self, email: &str) -> Option<PlanInfo> {
        self.plans_by_email.read().await.get(email).cloned()
    }

    pub async fn save_plan_info(&self, email: &str, plan: PlanInfo) {
        self.plans_by_email
            .write()
            .await
            .insert(email.to_string(), plan);
    }

    /// Open a refund case with a freshly allocated id.
    pub async fn create_refund_case(
        &self,
        email: &str,
        order_id: &str,
        reason: &str,
        form_link: &str,
    ) -> RefundCase {
        let case_id = format!("REF-{}", self.next_case_id.fetch_add(1, Ordering::Relaxed));
        let case = RefundCase {
            case_id: case_id.clone(),
            email: email.to_string(),
            order_id: order_id.to_string(),
            reason: reason.to_string(),
            status: CaseStatus::Open,
            created_at: Utc::now(),
            form_link: form_link.to_string(),
        };
        self.cases_by_id
            .write()
            .await
            .insert(case_id.clone(), case.clone());
        info!(case_id = %case_id, email = %email, "Opened refund case");
        case
    }

    pub async fn refund_case(&self, case_id: &str) -> Option<RefundCase> {
        self.cases_by_id.read().await.get(case_id).cloned()
    }

    pub async fn refund_cases_for_email(&self, email: &str) -> Vec<RefundCase> {
        self.cases_by_id
            .read()
            .await
            .values()
            .filter(|case| case.email == email)
            .cloned()
            .collect()
    }
}

impl Default for BillingStore {
    fn default() -> Self {
        Self::new()
    }
}
