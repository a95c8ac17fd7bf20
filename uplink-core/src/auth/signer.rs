//! HMAC-SHA256 request signing
//!
//! The tag is rendered as uppercase hex because verifiers compare it as an
//! exact string.

use crate::auth::{build_payload, CredentialProvider, Payload, SharedKey};
use crate::{Clock, Command, CommandRequest, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the tag.
///
/// The HTTP client writes header names in title case, so this goes on the
/// wire as `Hmac`. Receivers must match the name case-insensitively.
pub const TAG_HEADER: &str = "HMAC";

/// Uppercase hexadecimal HMAC-SHA256 digest of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthTag(String);

impl AuthTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for AuthTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the tag of `payload` under `key`.
pub fn sign(key: &[u8], payload: &[u8]) -> AuthTag {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(payload);
    AuthTag(hex::encode_upper(mac.finalize().into_bytes()))
}

/// Payload and tag for one request, plus the instant it was bound to.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub request: CommandRequest,
    pub payload: Payload,
    pub tag: AuthTag,
}

/// Signs commands with a key obtained from an injected provider.
///
/// The key is fetched for every request and dropped before the call returns.
/// The timestamp is read from the clock after the key is loaded, so it always
/// reflects the moment of signing.
#[derive(Debug)]
pub struct RequestSigner<P, C> {
    credentials: P,
    clock: C,
}

impl<P: CredentialProvider, C: Clock> RequestSigner<P, C> {
    pub fn new(credentials: P, clock: C) -> Self {
        RequestSigner { credentials, clock }
    }

    pub fn sign_request(&self, command: Command, argument: Option<String>) -> Result<SignedRequest> {
        let key: SharedKey = self.credentials.load_key()?;

        let request = CommandRequest::new(self.clock.now_millis(), command, argument);
        if request.has_ambiguous_framing() {
            warn!(
                "Command or argument contains ';'; the server may split fields differently than signed"
            );
        }

        let payload = build_payload(
            request.timestamp_ms,
            request.command.as_str(),
            request.argument.as_deref(),
        );
        let tag = sign(key.as_bytes(), payload.as_bytes());
        drop(key);

        debug!("Signed payload {:?} -> {}", payload.as_str(), tag);

        Ok(SignedRequest {
            request,
            payload,
            tag,
        })
    }
}
