//! HTTP/1.1 server loop

use crate::handlers::handle_request;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};
use uplink_core::{Clock, ReplayCache, SharedKey, SystemClock, Verifier};

/// Verification state shared by all connections
pub struct ServerState {
    pub verifier: Verifier,
    pub replay: Mutex<ReplayCache>,
    pub clock: Arc<dyn Clock>,
}

impl ServerState {
    pub fn new(key: SharedKey, window: Duration, clock: Arc<dyn Clock>) -> Self {
        ServerState {
            verifier: Verifier::new(key, window),
            replay: Mutex::new(ReplayCache::new(window)),
            clock,
        }
    }
}

/// Reference control endpoint: verifies commands and acknowledges them
pub struct VerifyingServer {
    state: Arc<ServerState>,
}

impl VerifyingServer {
    pub fn new(key: SharedKey, window: Duration) -> Self {
        Self::with_clock(key, window, Arc::new(SystemClock))
    }

    pub fn with_clock(key: SharedKey, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(ServerState::new(key, window, clock)),
        }
    }

    pub async fn serve(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener).await
    }

    /// Accept connections on an already bound listener
    pub async fn serve_listener(self, listener: TcpListener) -> std::io::Result<()> {
        info!("uplink-server listening on {}", listener.local_addr()?);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            debug!("New connection from {}", remote_addr);

            let state = self.state.clone();
            tokio::spawn(async move {
                if let Err(err) = Self::handle_connection(stream, state).await {
                    error!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }
    }

    async fn handle_connection(stream: TcpStream, state: Arc<ServerState>) -> hyper::Result<()> {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let state = state.clone();
            async move { handle_request(req, state).await }
        });

        http1::Builder::new().serve_connection(io, service).await
    }
}
