//! Routing of decoded notifications to the enforcement procedures.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::disable::DisableOutcome;
use crate::envelope::{
    BudgetAlert, MessageAttributes, NotificationPayload, PubSubMessage, ReassignmentTrigger,
    decode_event,
};
use crate::error::HandlerResult;
use crate::reassign::ReassignOutcome;

/// Context provided to notification handlers.
#[derive(Debug, Clone)]
pub struct NotificationContext {
    attributes: MessageAttributes,
    message_id: Option<String>,
    publish_time: Option<DateTime<Utc>>,
    received_at: Instant,
}

impl NotificationContext {
    /// Constructs a context from a decoded message.
    #[must_use]
    pub fn from_message(message: &PubSubMessage) -> Self {
        Self {
            attributes: message.attributes().clone(),
            message_id: message.message_id().map(str::to_owned),
            publish_time: message.publish_time(),
            received_at: Instant::now(),
        }
    }

    /// Returns the message attributes.
    #[must_use]
    pub fn attributes(&self) -> &MessageAttributes {
        &self.attributes
    }

    /// Returns the Pub/Sub message ID, when known.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Returns the publish time, when known.
    #[must_use]
    pub fn publish_time(&self) -> Option<DateTime<Utc>> {
        self.publish_time
    }

    /// Returns the time the message was received.
    #[must_use]
    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}

/// What a handled notification changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Result of the disable-billing procedure.
    Disable(DisableOutcome),
    /// Result of the reassign-billing procedure.
    Reassign(ReassignOutcome),
}

/// Trait implemented by the two enforcement branches.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// Called for budget alerts.
    async fn handle_budget_alert(
        &self,
        ctx: NotificationContext,
        alert: BudgetAlert,
    ) -> HandlerResult<NotificationOutcome>;

    /// Called for scheduler reassignment triggers.
    async fn handle_reassignment(
        &self,
        ctx: NotificationContext,
        trigger: ReassignmentTrigger,
    ) -> HandlerResult<NotificationOutcome>;
}

/// Decodes a raw event and dispatches it to the matching handler method.
///
/// # Errors
///
/// Returns [`HandlerError::Decode`](crate::HandlerError::Decode) when either
/// layer fails to decode, and propagates handler errors otherwise.
pub async fn dispatch_notification<H>(handler: &H, raw: &[u8]) -> HandlerResult<NotificationOutcome>
where
    H: NotificationHandler + ?Sized,
{
    let event = decode_event(raw)?;
    let payload = event.message().payload()?;
    let ctx = NotificationContext::from_message(event.message());
    let received_at = ctx.received_at();
    let kind = payload.label();
    let publish_time = ctx
        .publish_time()
        .map_or_else(|| "-".to_owned(), |time| time.to_rfc3339());

    info!(
        message_id = ctx.message_id().unwrap_or("-"),
        publish_time = %publish_time,
        subscription = event.subscription().unwrap_or("-"),
        kind,
        "received notification"
    );

    let result = match payload {
        NotificationPayload::BudgetAlert(alert) => handler.handle_budget_alert(ctx, alert).await,
        NotificationPayload::Reassignment(trigger) => {
            handler.handle_reassignment(ctx, trigger).await
        }
    };

    let elapsed_ms = u64::try_from(received_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(kind, elapsed_ms, ok = result.is_ok(), "notification processed");
    result
}
