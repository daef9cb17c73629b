//! # Crabdesk Agents
//!
//! The conversational layer: intent routing, the two specialist agents,
//! and the orchestrator that sequences a turn. Agents talk to the LLM
//! through the `CompletionService` trait only, so every code path here is
//! testable with a scripted service.
//!
//! Failure posture differs by component. The router and the tech agent
//! recover locally (a turn always gets an answer); the billing agent
//! propagates completion failures upward, where the gateway turns them
//! into the generic error envelope.

pub mod billing;
pub mod orchestrator;
pub mod router;
pub mod tech;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use billing::{BillingAgent, BillingAnswer};
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use router::{Route, RouteResult, Router};
pub use tech::{TechAgent, TechAnswer};
