//! Reference control endpoint for uplink
//!
//! Verifies the `HMAC` header against the raw body, enforces the freshness
//! window, refuses replays, and acknowledges the command. Nothing is executed.

pub mod handlers;
pub mod server;

pub use server::{ServerState, VerifyingServer};
