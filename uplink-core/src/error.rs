//! Error types for uplink

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UplinkError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Expired timestamp: {timestamp_ms} is outside {window_ms}ms of {now_ms}")]
    StaleTimestamp {
        timestamp_ms: u64,
        now_ms: u64,
        window_ms: u64,
    },

    #[error("Replayed request")]
    ReplayDetected,
}

impl UplinkError {
    /// True for failures that mean the request itself was rejected by a verifier.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            UplinkError::MalformedPayload(_)
                | UplinkError::InvalidSignature
                | UplinkError::StaleTimestamp { .. }
                | UplinkError::ReplayDetected
        )
    }
}
