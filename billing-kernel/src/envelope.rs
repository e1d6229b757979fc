//! Pub/Sub envelope and notification payload decoding.
//!
//! Decoding happens in two layers: the JSON envelope delivered by the push
//! subscription, then the JSON document carried in the message `data`.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use billing_policy::SpendReport;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DecodeLayer, HandlerError, HandlerResult};

/// `source` marker set by the scheduler job that triggers reassignment.
pub const CLOUD_SCHEDULER_SOURCE: &str = "cloud-scheduler";

/// Attribute carrying the billing account of the notification.
pub const BILLING_ACCOUNT_ID_ATTRIBUTE: &str = "billingAccountId";

/// Attribute carrying the budget that fired the notification.
pub const BUDGET_ID_ATTRIBUTE: &str = "budgetId";

/// Push delivery wrapper around a Pub/Sub message.
#[derive(Debug, Clone, Deserialize)]
pub struct PubSubEvent {
    message: PubSubMessage,
    #[serde(default)]
    subscription: Option<String>,
}

impl PubSubEvent {
    /// Returns the wrapped message.
    #[must_use]
    pub fn message(&self) -> &PubSubMessage {
        &self.message
    }

    /// Returns the delivering subscription, when the push request names one.
    #[must_use]
    pub fn subscription(&self) -> Option<&str> {
        self.subscription.as_deref()
    }
}

/// A single Pub/Sub message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubMessage {
    #[serde(default)]
    attributes: MessageAttributes,
    #[serde(default, deserialize_with = "deserialize_data")]
    data: Bytes,
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    publish_time: Option<DateTime<Utc>>,
}

impl PubSubMessage {
    /// Returns the message attributes.
    #[must_use]
    pub fn attributes(&self) -> &MessageAttributes {
        &self.attributes
    }

    /// Returns the decoded message data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the server-assigned message ID.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Returns the time the message was published.
    #[must_use]
    pub fn publish_time(&self) -> Option<DateTime<Utc>> {
        self.publish_time
    }

    /// Decodes the notification payload carried in `data`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Decode`] when the data is not a valid payload.
    pub fn payload(&self) -> HandlerResult<NotificationPayload> {
        NotificationPayload::from_slice(&self.data)
    }
}

/// String attributes attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageAttributes(BTreeMap<String, String>);

impl MessageAttributes {
    /// Returns the value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the billing account attribute, or `""` when absent.
    #[must_use]
    pub fn billing_account_id(&self) -> &str {
        self.get(BILLING_ACCOUNT_ID_ATTRIBUTE).unwrap_or_default()
    }

    /// Returns the budget attribute, or `""` when absent.
    #[must_use]
    pub fn budget_id(&self) -> &str {
        self.get(BUDGET_ID_ATTRIBUTE).unwrap_or_default()
    }

    /// Sets an attribute and returns the updated map.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

/// Decoded message data, discriminated by its `source` marker.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationPayload {
    /// Automatic budget alert for a single budget.
    BudgetAlert(BudgetAlert),
    /// Scheduled request to restore billing on every sandbox project.
    Reassignment(ReassignmentTrigger),
}

impl NotificationPayload {
    /// Decodes a payload from raw JSON bytes.
    ///
    /// Anything whose `source` is not [`CLOUD_SCHEDULER_SOURCE`] is treated as
    /// a budget alert, including a missing or empty `source`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Decode`] when the bytes are not JSON or do not
    /// match the shape selected by `source`.
    pub fn from_slice(data: &[u8]) -> HandlerResult<Self> {
        let value: Value = serde_json::from_slice(data).map_err(HandlerError::payload)?;
        let tag = SourceTag::deserialize(&value).map_err(HandlerError::payload)?;

        if tag.source.as_deref() == Some(CLOUD_SCHEDULER_SOURCE) {
            ReassignmentTrigger::deserialize(&value)
                .map(Self::Reassignment)
                .map_err(HandlerError::payload)
        } else {
            BudgetAlert::deserialize(&value)
                .map(Self::BudgetAlert)
                .map_err(HandlerError::payload)
        }
    }

    /// Returns a short label for logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::BudgetAlert(_) => "budget-alert",
            Self::Reassignment(_) => "reassignment",
        }
    }
}

#[derive(Deserialize)]
struct SourceTag {
    #[serde(default)]
    source: Option<String>,
}

/// Fields of a programmatic budget notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlert {
    budget_amount: f64,
    cost_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    budget_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alert_threshold_exceeded: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cost_interval_start: Option<String>,
}

impl BudgetAlert {
    /// Creates an alert with the supplied amounts.
    #[must_use]
    pub fn new(budget_amount: f64, cost_amount: f64) -> Self {
        Self {
            budget_amount,
            cost_amount,
            budget_display_name: None,
            currency_code: None,
            alert_threshold_exceeded: None,
            cost_interval_start: None,
        }
    }

    /// Returns the budgeted amount.
    #[must_use]
    pub const fn budget_amount(&self) -> f64 {
        self.budget_amount
    }

    /// Returns the accrued cost.
    #[must_use]
    pub const fn cost_amount(&self) -> f64 {
        self.cost_amount
    }

    /// Returns the budget display name, if the notification carried one.
    #[must_use]
    pub fn budget_display_name(&self) -> Option<&str> {
        self.budget_display_name.as_deref()
    }

    /// Returns the currency of the amounts, if reported.
    #[must_use]
    pub fn currency_code(&self) -> Option<&str> {
        self.currency_code.as_deref()
    }

    /// Returns the threshold that triggered this alert, if any.
    #[must_use]
    pub const fn alert_threshold_exceeded(&self) -> Option<f64> {
        self.alert_threshold_exceeded
    }

    /// Returns the start of the cost interval, as reported.
    #[must_use]
    pub fn cost_interval_start(&self) -> Option<&str> {
        self.cost_interval_start.as_deref()
    }

    /// Returns the spend figures for policy evaluation.
    #[must_use]
    pub const fn spend(&self) -> SpendReport {
        SpendReport::new(self.cost_amount, self.budget_amount)
    }
}

/// Fields of the scheduler message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignmentTrigger {
    #[serde(default)]
    sandbox_folder_id: String,
}

impl ReassignmentTrigger {
    /// Creates a trigger for the supplied folder.
    #[must_use]
    pub fn new(sandbox_folder_id: impl Into<String>) -> Self {
        Self {
            sandbox_folder_id: sandbox_folder_id.into(),
        }
    }

    /// Returns the folder that parents the sandbox projects, or `""`.
    #[must_use]
    pub fn sandbox_folder_id(&self) -> &str {
        &self.sandbox_folder_id
    }
}

/// Decodes the outer envelope from the raw request body.
///
/// # Errors
///
/// Returns [`HandlerError::Decode`] tagged [`DecodeLayer::Envelope`].
pub fn decode_event(raw: &[u8]) -> HandlerResult<PubSubEvent> {
    serde_json::from_slice(raw).map_err(|source| HandlerError::Decode {
        layer: DecodeLayer::Envelope,
        source,
    })
}

// Push subscriptions deliver `data` base64-encoded; hand-written test events
// often inline the JSON document instead.
fn deserialize_data<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawData {
        Encoded(String),
        Raw(Vec<u8>),
        Inline(Value),
    }

    match RawData::deserialize(deserializer)? {
        RawData::Encoded(text) => STANDARD
            .decode(text.trim())
            .map(Bytes::from)
            .map_err(|err| D::Error::custom(format!("data is not valid base64: {err}"))),
        RawData::Raw(bytes) => Ok(Bytes::from(bytes)),
        RawData::Inline(Value::Null) => Ok(Bytes::new()),
        RawData::Inline(value @ Value::Object(_)) => serde_json::to_vec(&value)
            .map(Bytes::from)
            .map_err(D::Error::custom),
        RawData::Inline(_) => Err(D::Error::custom(
            "data must be a base64 string, a byte array, or a JSON object",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn decodes_push_envelope_with_base64_data() {
        let body = format!(
            r#"{{
                "message": {{
                    "attributes": {{"billingAccountId": "B1", "budgetId": "b1", "schemaVersion": "1.0"}},
                    "data": "{}",
                    "messageId": "136969346945",
                    "message_id": "136969346945",
                    "publishTime": "2024-05-01T10:00:00.000Z"
                }},
                "subscription": "projects/ops/subscriptions/budget-alerts"
            }}"#,
            encode(r#"{"budgetAmount": 100, "costAmount": 12.5}"#)
        );

        let event = decode_event(body.as_bytes()).expect("envelope");
        let message = event.message();
        assert_eq!(message.attributes().billing_account_id(), "B1");
        assert_eq!(message.attributes().budget_id(), "b1");
        assert_eq!(message.attributes().get("schemaVersion"), Some("1.0"));
        assert_eq!(message.message_id(), Some("136969346945"));
        assert!(message.publish_time().is_some());
        assert_eq!(
            event.subscription(),
            Some("projects/ops/subscriptions/budget-alerts")
        );

        let payload = message.payload().expect("payload");
        assert_eq!(payload, NotificationPayload::BudgetAlert(BudgetAlert::new(100.0, 12.5)));
    }

    #[test]
    fn inline_json_data_is_accepted() {
        let body = r#"{"message": {"data": {"source": "cloud-scheduler", "sandboxFolderId": "F1"}}}"#;
        let payload = decode_event(body.as_bytes())
            .unwrap()
            .message()
            .payload()
            .unwrap();
        assert_eq!(
            payload,
            NotificationPayload::Reassignment(ReassignmentTrigger::new("F1"))
        );
    }

    #[test]
    fn missing_attributes_default_to_empty() {
        let body = format!(r#"{{"message": {{"data": "{}"}}}}"#, encode("{}"));
        let event = decode_event(body.as_bytes()).unwrap();
        assert_eq!(event.message().attributes().billing_account_id(), "");
        assert_eq!(event.message().attributes().budget_id(), "");
    }

    #[test]
    fn malformed_envelope_is_envelope_decode_error() {
        let err = decode_event(b"not json").expect_err("invalid");
        assert!(matches!(
            err,
            HandlerError::Decode {
                layer: DecodeLayer::Envelope,
                ..
            }
        ));
    }

    #[test]
    fn invalid_base64_is_envelope_decode_error() {
        let err = decode_event(br#"{"message": {"data": "***"}}"#).expect_err("bad base64");
        assert!(matches!(
            err,
            HandlerError::Decode {
                layer: DecodeLayer::Envelope,
                ..
            }
        ));
    }

    #[test]
    fn non_json_data_is_payload_decode_error() {
        let err = NotificationPayload::from_slice(b"plain text").expect_err("bad payload");
        assert!(matches!(
            err,
            HandlerError::Decode {
                layer: DecodeLayer::Payload,
                ..
            }
        ));

        let err = NotificationPayload::from_slice(b"").expect_err("empty payload");
        assert!(matches!(err, HandlerError::Decode { .. }));
    }

    #[test]
    fn budget_alert_requires_amounts() {
        let err = NotificationPayload::from_slice(br#"{"costAmount": 5}"#).expect_err("amounts");
        assert!(matches!(
            err,
            HandlerError::Decode {
                layer: DecodeLayer::Payload,
                ..
            }
        ));
    }

    #[test]
    fn only_scheduler_source_selects_reassignment() {
        for source in ["", "budget", "Cloud-Scheduler", "cloud-scheduler "] {
            let json = format!(
                r#"{{"source": "{source}", "budgetAmount": 1, "costAmount": 0, "sandboxFolderId": "F1"}}"#
            );
            let payload = NotificationPayload::from_slice(json.as_bytes()).unwrap();
            assert_eq!(payload.label(), "budget-alert", "source {source:?}");
        }

        let payload = NotificationPayload::from_slice(
            br#"{"source": "cloud-scheduler", "sandboxFolderId": "F1"}"#,
        )
        .unwrap();
        assert_eq!(payload.label(), "reassignment");
    }

    #[test]
    fn optional_alert_fields_are_decoded() {
        let payload = NotificationPayload::from_slice(
            br#"{
                "budgetDisplayName": "sandbox-alice",
                "alertThresholdExceeded": 1.0,
                "costAmount": 120.5,
                "costIntervalStart": "2024-05-01T07:00:00Z",
                "budgetAmount": 100.0,
                "budgetAmountType": "SPECIFIED_AMOUNT",
                "currencyCode": "EUR"
            }"#,
        )
        .unwrap();

        let NotificationPayload::BudgetAlert(alert) = payload else {
            panic!("expected budget alert");
        };
        assert_eq!(alert.budget_display_name(), Some("sandbox-alice"));
        assert_eq!(alert.currency_code(), Some("EUR"));
        assert_eq!(alert.alert_threshold_exceeded(), Some(1.0));
        assert_eq!(alert.cost_interval_start(), Some("2024-05-01T07:00:00Z"));
        assert!(alert.spend().exceeds_budget());
    }
}
