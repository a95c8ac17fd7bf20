//! Wire-level tests for the verifying endpoint
//! Requests are written by hand so the exact header spelling on the wire is under test control

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use uplink_core::{build_payload, sign, Clock, SharedKey, SystemClock};
use uplink_server::VerifyingServer;

async fn start_server(key: &str) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = VerifyingServer::new(SharedKey::from(key), Duration::from_secs(30));

    let handle = tokio::spawn(async move {
        let _ = server.serve_listener(listener).await;
    });

    (addr, handle)
}

/// Send a raw HTTP/1.1 request and return (status, body)
async fn exchange(addr: SocketAddr, request: String) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

fn post(header_name: &str, tag: &str, body: &str) -> String {
    format!(
        "POST / HTTP/1.1\r\nHost: localhost\r\n{}: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        header_name,
        tag,
        body.len(),
        body
    )
}

#[tokio::test]
async fn uppercase_hmac_header_is_accepted() {
    let (addr, handle) = start_server("key").await;

    let payload = build_payload(SystemClock.now_millis(), "set", Some("5"));
    let tag = sign(b"key", payload.as_bytes());

    let (status, body) = exchange(addr, post("HMAC", tag.as_str(), payload.as_str())).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ACK set 5");

    handle.abort();
}

#[tokio::test]
async fn header_name_is_case_insensitive() {
    let (addr, handle) = start_server("key").await;

    let payload = build_payload(SystemClock.now_millis(), "reboot", None);
    let tag = sign(b"key", payload.as_bytes());

    let (status, _) = exchange(addr, post("hmac", tag.as_str(), payload.as_str())).await;
    assert_eq!(status, 200);

    handle.abort();
}

#[tokio::test]
async fn tag_value_is_case_sensitive() {
    let (addr, handle) = start_server("key").await;

    let payload = build_payload(SystemClock.now_millis(), "reboot", None);
    let tag = sign(b"key", payload.as_bytes()).as_str().to_lowercase();

    let (status, body) = exchange(addr, post("HMAC", &tag, payload.as_str())).await;
    assert_eq!(status, 401);
    assert_eq!(body, "invalid signature");

    handle.abort();
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let (addr, handle) = start_server("key").await;

    let (status, body) = exchange(
        addr,
        "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_string(),
    )
    .await;
    assert_eq!(status, 200);
    let health: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["window_ms"], 30_000);

    let (status, _) = exchange(
        addr,
        "GET /nope HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_string(),
    )
    .await;
    assert_eq!(status, 404);

    handle.abort();
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let (addr, handle) = start_server("key").await;

    let body = "A".repeat(4 * 1024);
    let (status, text) = exchange(addr, post("HMAC", "00", &body)).await;
    assert_eq!(status, 413);
    assert_eq!(text, "payload too large");

    handle.abort();
}
