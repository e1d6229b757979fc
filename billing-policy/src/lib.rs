//! Billing policy rules for sandbox projects.
//!
//! Everything here is pure: the kernel fetches remote state, asks these rules
//! what to do, and performs the mutation itself.

#![warn(missing_docs, clippy::pedantic)]

pub mod decision;
pub mod engine;

pub use decision::{BillingDecision, DecisionKind};
pub use engine::{
    SpendReport, decide_over_budget, decide_reassignment, has_billing_attached,
    needs_billing_restored,
};
