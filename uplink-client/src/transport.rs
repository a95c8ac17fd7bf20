//! HTTP transport for signed commands

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::borrow::Cow;
use std::time::Duration;
use tracing::debug;
use uplink_core::{AuthTag, Payload, TAG_HEADER};
use crate::{ClientError, Result};

/// What came back from the control endpoint. The body is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl DispatchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Delivers one signed payload. Implementations make a single attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, payload: Payload, tag: &AuthTag) -> Result<DispatchResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post(&self, payload: Payload, tag: &AuthTag) -> Result<DispatchResponse> {
        (**self).post(payload, tag).await
    }
}

/// POSTs the payload as a raw body with the tag in the `HMAC` header
pub struct HttpTransport {
    client: Client<HttpConnector, Full<Bytes>>,
    endpoint: Uri,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: Uri, timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));

        // Header names go out as `Hmac`, `Host`, `Content-Length`
        let client = Client::builder(TokioExecutor::new())
            .http1_title_case_headers(true)
            .build(connector);

        HttpTransport {
            client,
            endpoint,
            timeout,
        }
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, payload: Payload, tag: &AuthTag) -> Result<DispatchResponse> {
        let request = Request::post(self.endpoint.clone())
            .header(TAG_HEADER, tag.as_str())
            .body(Full::new(Bytes::from(payload.into_string())))
            .map_err(|e| ClientError::Transport(format!("cannot build request: {}", e)))?;

        debug!("POST {}", self.endpoint);

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ClientError::Transport(error_chain(&e)))?;

            let status = response.status().as_u16();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| ClientError::Transport(error_chain(&e)))?
                .to_bytes();

            Ok::<_, ClientError>(DispatchResponse { status, body })
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                ClientError::Transport(format!(
                    "no response from {} within {:?}",
                    self.endpoint, self.timeout
                ))
            })?
    }
}

/// Render an error with its sources; hyper's top-level messages are terse.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
