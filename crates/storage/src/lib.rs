//! # Crabdesk Storage
//!
//! In-process stores: conversation histories and billing records. Both are
//! `tokio::sync::RwLock` maps, so state lives for the process lifetime only.
//! Durability is out of scope; the stores exist to give the agents a
//! consistent view within a running server.

pub mod billing;
pub mod conversation;

pub use billing::{BillingStore, CaseStatus, PlanInfo, RefundCase};
pub use conversation::ConversationStore;
