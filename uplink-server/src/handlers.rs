//! HTTP request handlers for the verifying endpoint

use crate::server::ServerState;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uplink_core::{Clock, UplinkError, VerifiedCommand, TAG_HEADER};

type BoxBody = Full<Bytes>;

/// Largest command body accepted; real payloads are a few dozen bytes.
pub const MAX_BODY_BYTES: usize = 1024;

/// Main request handler
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<BoxBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") => health_response(&state),

        (&Method::POST, "/") => {
            let tag = req
                .headers()
                .get(TAG_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
                Ok(body) => handle_command(&state, tag.as_deref(), &body.to_bytes()),
                Err(e) if e.is::<LengthLimitError>() => {
                    warn!("Request body over {} bytes", MAX_BODY_BYTES);
                    text_response(StatusCode::PAYLOAD_TOO_LARGE, "payload too large")
                }
                Err(e) => {
                    warn!("Failed to read request body: {}", e);
                    text_response(StatusCode::BAD_REQUEST, "unreadable body")
                }
            }
        }

        _ => text_response(StatusCode::NOT_FOUND, "not found"),
    };

    info!("{} {} -> {}", method, path, response.status());
    Ok(response)
}

/// Verify one signed command. Acknowledges with `ACK <command> [argument]`.
pub fn handle_command(state: &ServerState, tag: Option<&str>, body: &[u8]) -> Response<BoxBody> {
    let Some(tag) = tag else {
        return text_response(StatusCode::UNAUTHORIZED, "missing HMAC header");
    };

    let now_ms = state.clock.now_millis();
    match verify(state, tag, body, now_ms) {
        Ok(command) => {
            info!(
                "Accepted '{}' signed at {}",
                command,
                render_timestamp(command.timestamp_ms)
            );
            text_response(StatusCode::OK, format!("ACK {}", command))
        }
        Err(err) => {
            warn!("Rejected request: {}", err);
            let (status, reason) = match err {
                UplinkError::InvalidSignature => (StatusCode::UNAUTHORIZED, "invalid signature"),
                UplinkError::StaleTimestamp { .. } => (StatusCode::UNAUTHORIZED, "expired timestamp"),
                UplinkError::ReplayDetected => (StatusCode::CONFLICT, "replayed request"),
                UplinkError::MalformedPayload(_) => (StatusCode::BAD_REQUEST, "malformed payload"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
            };
            text_response(status, reason)
        }
    }
}

fn verify(state: &ServerState, tag: &str, body: &[u8], now_ms: u64) -> uplink_core::Result<VerifiedCommand> {
    let command = state.verifier.verify(body, tag, now_ms)?;

    // Every insert is a single call, so a poisoned map is still consistent
    let mut replay = state
        .replay
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    replay.check(tag, command.timestamp_ms, now_ms)?;

    Ok(command)
}

fn health_response(state: &ServerState) -> Response<BoxBody> {
    let body = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "uplink-server",
        "window_ms": state.verifier.window_ms(),
    });

    let mut response = text_response(StatusCode::OK, body.to_string());
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

/// Simple text response builder
pub fn text_response(status: StatusCode, body: impl Into<String>) -> Response<BoxBody> {
    let mut response = Response::new(Full::new(Bytes::from(body.into())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn render_timestamp(timestamp_ms: u64) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uplink_core::{build_payload, sign, FixedClock, SharedKey};

    const NOW: u64 = 1_700_000_000_000;

    fn state() -> ServerState {
        ServerState::new(
            SharedKey::from("key"),
            Duration::from_secs(30),
            Arc::new(FixedClock(NOW)),
        )
    }

    async fn body_text(response: Response<BoxBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn accepts_fresh_signed_command() {
        let state = state();
        let payload = build_payload(NOW, "set", Some("5"));
        let tag = sign(b"key", payload.as_bytes());

        let response = handle_command(&state, Some(tag.as_str()), payload.as_bytes());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ACK set 5");
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let response = handle_command(&state(), None, b"1700000000000;reboot;");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_stale_timestamp() {
        let state = state();
        let payload = build_payload(NOW - 60_000, "reboot", None);
        let tag = sign(b"key", payload.as_bytes());

        let response = handle_command(&state, Some(tag.as_str()), payload.as_bytes());
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, "expired timestamp");
    }

    #[tokio::test]
    async fn rejects_replay() {
        let state = state();
        let payload = build_payload(NOW, "reboot", None);
        let tag = sign(b"key", payload.as_bytes());

        let first = handle_command(&state, Some(tag.as_str()), payload.as_bytes());
        assert_eq!(first.status(), StatusCode::OK);

        let second = handle_command(&state, Some(tag.as_str()), payload.as_bytes());
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn rejects_malformed_but_signed_payload() {
        let state = state();
        let payload = b"1700000000000;set;5;6;";
        let tag = sign(b"key", payload);

        let response = handle_command(&state, Some(tag.as_str()), payload);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn renders_timestamps() {
        assert_eq!(render_timestamp(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(render_timestamp(u64::MAX), u64::MAX.to_string());
    }
}
