//! # Crabdesk Billing
//!
//! The refund policy engine and the typed tool surface the billing agent
//! exposes to the LLM. Policy operations return flat JSON maps; expected
//! domain conditions (unknown email, bad date) are in-band `error` entries
//! rather than `Err`, so the model can read and react to them.

pub mod policy;
pub mod tools;

pub use policy::RefundPolicy;
pub use tools::{
    BillingToolCall, EstimateRefundTimelineArgs, GetPlanInfoArgs, OpenRefundCaseArgs, definitions,
};
