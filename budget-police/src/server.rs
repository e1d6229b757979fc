//! HTTP entrypoint receiving Pub/Sub notifications as CloudEvents.

use std::io;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use billing_kernel::{BillingEnforcer, HandlerError, NotificationOutcome};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Content type of a structured-mode CloudEvent.
pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

const CE_ID_HEADER: &str = "ce-id";

#[derive(Clone)]
struct AppState {
    enforcer: Arc<BillingEnforcer>,
}

/// Builds the router serving `POST /` and `GET /healthz`.
pub fn router(enforcer: BillingEnforcer) -> Router {
    Router::new()
        .route("/", post(handle_notification))
        .route("/healthz", get(health))
        .with_state(AppState {
            enforcer: Arc::new(enforcer),
        })
}

/// Serves `app` on `listener` until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, app: Router) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "budget enforcer listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn handle_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match InboundEvent::from_request(&headers, body) {
        Ok(event) => event,
        Err(reason) => {
            warn!(%reason, "rejected malformed CloudEvent");
            return error_response(StatusCode::BAD_REQUEST, &reason);
        }
    };

    let span = info_span!("notification", invocation = %event.id);
    async move {
        match state.enforcer.handle_event(&event.data).await {
            Ok(outcome) => {
                log_outcome(&outcome);
                StatusCode::NO_CONTENT.into_response()
            }
            Err(err) => {
                let status = status_for(&err);
                if status.is_client_error() {
                    warn!(error = %err, "notification rejected");
                } else {
                    error!(error = %err, "notification failed");
                }
                error_response(status, &err.to_string())
            }
        }
    }
    .instrument(span)
    .await
}

/// Pub/Sub envelope extracted from a binary or structured CloudEvent.
#[derive(Debug)]
struct InboundEvent {
    id: String,
    data: Bytes,
}

impl InboundEvent {
    fn from_request(headers: &HeaderMap, body: Bytes) -> Result<Self, String> {
        if is_structured(headers) {
            return Self::from_structured(&body);
        }

        let id = headers
            .get(CE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);
        Ok(Self { id, data: body })
    }

    fn from_structured(body: &[u8]) -> Result<Self, String> {
        let mut event: Value = serde_json::from_slice(body)
            .map_err(|err| format!("invalid structured CloudEvent: {err}"))?;

        let id = event
            .get("id")
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

        let inline = event.get_mut("data").map(Value::take).unwrap_or_default();
        let data = match (inline, event.get("data_base64")) {
            (Value::String(text), _) => Bytes::from(text),
            (Value::Null, Some(Value::String(encoded))) => STANDARD
                .decode(encoded)
                .map(Bytes::from)
                .map_err(|err| format!("invalid data_base64: {err}"))?,
            (Value::Null, _) => return Err("structured CloudEvent has no data".to_owned()),
            (inline, _) => Bytes::from(inline.to_string()),
        };

        Ok(Self { id, data })
    }
}

fn is_structured(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with(STRUCTURED_CONTENT_TYPE)
        })
}

/// Maps a handler error to the status the delivery system sees.
///
/// Malformed events are not retried; everything else is.
fn status_for(err: &HandlerError) -> StatusCode {
    if err.is_malformed_event() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn log_outcome(outcome: &NotificationOutcome) {
    match outcome {
        NotificationOutcome::Disable(result) => {
            info!(project = %result.project(), outcome = ?result, "budget alert handled");
        }
        NotificationOutcome::Reassign(result) => info!(
            reassigned = result.reassigned().len(),
            already_enabled = result.already_enabled().len(),
            "reassignment handled"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn binary_mode_uses_body_and_ce_id() {
        let mut headers = HeaderMap::new();
        headers.insert(CE_ID_HEADER, HeaderValue::from_static("evt-1"));
        let event = InboundEvent::from_request(&headers, Bytes::from_static(b"{}")).unwrap();
        assert_eq!(event.id, "evt-1");
        assert_eq!(&event.data[..], b"{}");
    }

    #[test]
    fn binary_mode_generates_id_when_absent() {
        let event = InboundEvent::from_request(&HeaderMap::new(), Bytes::new()).unwrap();
        assert!(Uuid::parse_str(&event.id).is_ok());
    }

    #[test]
    fn structured_mode_extracts_data_member() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/cloudevents+json; charset=utf-8"),
        );
        let body = json!({
            "id": "evt-2",
            "specversion": "1.0",
            "data": { "message": { "attributes": {} }, "subscription": "s" }
        });
        let event =
            InboundEvent::from_request(&headers, Bytes::from(body.to_string())).unwrap();
        assert_eq!(event.id, "evt-2");
        let data: Value = serde_json::from_slice(&event.data).unwrap();
        assert_eq!(data["subscription"], "s");
    }

    #[test]
    fn structured_mode_decodes_data_base64() {
        let encoded = STANDARD.encode(br#"{"message":{}}"#);
        let body = json!({ "id": "evt-3", "data_base64": encoded }).to_string();
        let event = InboundEvent::from_structured(body.as_bytes()).unwrap();
        assert_eq!(&event.data[..], br#"{"message":{}}"#);
    }

    #[test]
    fn structured_mode_without_data_is_rejected() {
        let err = InboundEvent::from_structured(br#"{"id":"x"}"#).unwrap_err();
        assert!(err.contains("no data"));
    }
}
