//! Notification routing and billing enforcement procedures.
//!
//! This crate turns one inbound Pub/Sub notification into at most a handful
//! of billing mutations: budget alerts may detach billing from the single
//! project a budget covers, while the scheduler trigger re-attaches every
//! sandbox project under a folder.

#![warn(missing_docs, clippy::pedantic)]

mod disable;
mod envelope;
mod error;
mod reassign;
mod router;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use billing_adapters::traits::{BillingInfoService, BudgetService, ProjectDirectory};

pub use disable::{DisableOutcome, disable_billing};
pub use envelope::{
    BILLING_ACCOUNT_ID_ATTRIBUTE, BUDGET_ID_ATTRIBUTE, BudgetAlert, CLOUD_SCHEDULER_SOURCE,
    MessageAttributes, NotificationPayload, PubSubEvent, PubSubMessage, ReassignmentTrigger,
    decode_event,
};
pub use error::{DecodeLayer, HandlerError, HandlerResult};
pub use reassign::{ReassignOutcome, reassign_billing};
pub use router::{
    NotificationContext, NotificationHandler, NotificationOutcome, dispatch_notification,
};

/// Handler wiring both procedures to the remote services.
#[derive(Clone)]
pub struct BillingEnforcer {
    budgets: Arc<dyn BudgetService>,
    billing: Arc<dyn BillingInfoService>,
    projects: Arc<dyn ProjectDirectory>,
}

impl fmt::Debug for BillingEnforcer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingEnforcer").finish_non_exhaustive()
    }
}

impl BillingEnforcer {
    /// Creates an enforcer backed by the supplied services.
    #[must_use]
    pub fn new(
        budgets: Arc<dyn BudgetService>,
        billing: Arc<dyn BillingInfoService>,
        projects: Arc<dyn ProjectDirectory>,
    ) -> Self {
        Self {
            budgets,
            billing,
            projects,
        }
    }

    /// Decodes a raw event and runs the matching procedure.
    ///
    /// # Errors
    ///
    /// Propagates every [`HandlerError`]; nothing is retried here.
    pub async fn handle_event(&self, raw: &[u8]) -> HandlerResult<NotificationOutcome> {
        dispatch_notification(self, raw).await
    }
}

#[async_trait]
impl NotificationHandler for BillingEnforcer {
    async fn handle_budget_alert(
        &self,
        ctx: NotificationContext,
        alert: BudgetAlert,
    ) -> HandlerResult<NotificationOutcome> {
        disable_billing(
            self.budgets.as_ref(),
            self.billing.as_ref(),
            ctx.attributes(),
            &alert,
        )
        .await
        .map(NotificationOutcome::Disable)
    }

    async fn handle_reassignment(
        &self,
        ctx: NotificationContext,
        trigger: ReassignmentTrigger,
    ) -> HandlerResult<NotificationOutcome> {
        reassign_billing(
            self.projects.as_ref(),
            self.billing.as_ref(),
            ctx.attributes(),
            &trigger,
        )
        .await
        .map(NotificationOutcome::Reassign)
    }
}
