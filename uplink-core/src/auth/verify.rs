//! Verification of signed commands
//!
//! This is the check the control endpoint runs: recompute the tag, recover the
//! fields, then hold the embedded timestamp against a freshness window. A
//! [`ReplayCache`] additionally refuses an exact request seen twice inside
//! that window.

use crate::auth::{compare_tags, sign, Payload, SharedKey};
use crate::{Result, UplinkError, VerifiedCommand};
use std::collections::HashMap;
use std::time::Duration;

/// Default tolerated clock skew between client and server.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);

/// Checks tags and freshness for one shared key.
#[derive(Debug, Clone)]
pub struct Verifier {
    key: SharedKey,
    window_ms: u64,
}

impl Verifier {
    pub fn new(key: SharedKey, window: Duration) -> Self {
        Verifier {
            key,
            window_ms: window.as_millis() as u64,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Verify a received body and `HMAC` header value at server time `now_ms`.
    pub fn verify(&self, payload: &[u8], tag: &str, now_ms: u64) -> Result<VerifiedCommand> {
        let expected = sign(self.key.as_bytes(), payload);
        if !compare_tags(expected.as_str(), tag) {
            return Err(UplinkError::InvalidSignature);
        }

        let request = Payload::parse(payload)?;

        if request.timestamp_ms.abs_diff(now_ms) > self.window_ms {
            return Err(UplinkError::StaleTimestamp {
                timestamp_ms: request.timestamp_ms,
                now_ms,
                window_ms: self.window_ms,
            });
        }

        Ok(VerifiedCommand {
            timestamp_ms: request.timestamp_ms,
            command: request.command.as_str().to_string(),
            argument: request.argument,
        })
    }
}

/// Tags accepted within the freshness window
#[derive(Debug)]
pub struct ReplayCache {
    seen: HashMap<String, u64>,
    window_ms: u64,
}

impl ReplayCache {
    /// Create a new cache that remembers tags for `window`
    pub fn new(window: Duration) -> Self {
        ReplayCache {
            seen: HashMap::new(),
            window_ms: window.as_millis() as u64,
        }
    }

    /// Record `tag` for a request stamped `timestamp_ms`, failing if it was already used.
    pub fn check(&mut self, tag: &str, timestamp_ms: u64, now_ms: u64) -> Result<()> {
        self.cleanup(now_ms);

        if self.seen.contains_key(tag) {
            return Err(UplinkError::ReplayDetected);
        }

        self.seen.insert(tag.to_string(), timestamp_ms);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Drop tags whose timestamp can no longer pass the freshness check
    fn cleanup(&mut self, now_ms: u64) {
        let window_ms = self.window_ms;
        self.seen
            .retain(|_, timestamp_ms| timestamp_ms.saturating_add(window_ms) >= now_ms);
    }
}
