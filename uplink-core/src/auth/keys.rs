//! Shared secret key and the providers that resolve it
//!
//! The signer never constructs its key source; it is handed a
//! [`CredentialProvider`] and asks it for the key once per request.

use crate::{Result, UplinkError};
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Default header file holding the key.
pub const DEFAULT_CREDENTIALS_PATH: &str = "secrets.h";

/// Default constant name the key is stored under.
pub const DEFAULT_KEY_NAME: &str = "DOWN_COMMAND_KEY";

/// Raw shared secret. Zeroed on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey {
    bytes: Vec<u8>,
}

impl SharedKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        SharedKey { bytes: bytes.into() }
    }

    /// Raw key bytes, exactly as provisioned (not hex-decoded).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedKey(***)")
    }
}

impl From<&str> for SharedKey {
    fn from(value: &str) -> Self {
        SharedKey::new(value.as_bytes())
    }
}

/// Capability that resolves the shared key on demand.
pub trait CredentialProvider: Send + Sync {
    fn load_key(&self) -> Result<SharedKey>;
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for std::sync::Arc<P> {
    fn load_key(&self) -> Result<SharedKey> {
        (**self).load_key()
    }
}

/// In-memory key, for tests and for callers that already hold the secret.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    key: SharedKey,
}

impl StaticKeyProvider {
    pub fn new(key: impl Into<SharedKey>) -> Self {
        StaticKeyProvider { key: key.into() }
    }
}

impl CredentialProvider for StaticKeyProvider {
    fn load_key(&self) -> Result<SharedKey> {
        Ok(self.key.clone())
    }
}

/// Reads the key from a C-header-style file, e.g.
/// `#define DOWN_COMMAND_KEY "secret"` or `const char *DOWN_COMMAND_KEY = "secret";`.
///
/// Exactly one line may name the constant as a whole identifier; its value is
/// the text between the first pair of double quotes. The file is opened and
/// closed inside each [`load_key`](CredentialProvider::load_key) call.
#[derive(Debug, Clone)]
pub struct HeaderFileProvider {
    path: PathBuf,
    name: String,
}

impl HeaderFileProvider {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        HeaderFileProvider {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for HeaderFileProvider {
    fn default() -> Self {
        HeaderFileProvider::new(DEFAULT_CREDENTIALS_PATH, DEFAULT_KEY_NAME)
    }
}

impl CredentialProvider for HeaderFileProvider {
    fn load_key(&self) -> Result<SharedKey> {
        let contents = Zeroizing::new(std::fs::read(&self.path).map_err(|e| {
            UplinkError::MissingCredential(format!("cannot read {}: {}", self.path.display(), e))
        })?);

        let mut found: Option<SharedKey> = None;
        for raw in contents.split(|&b| b == b'\n') {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line,
                // Other lines may carry any encoding; only the key line must be text
                Err(_) if !contains_bytes(raw, self.name.as_bytes()) => continue,
                Err(_) => {
                    return Err(UplinkError::MissingCredential(format!(
                        "{} line in {} is not valid UTF-8",
                        self.name,
                        self.path.display()
                    )))
                }
            };
            if !names_identifier(line, &self.name) {
                continue;
            }

            if found.is_some() {
                return Err(UplinkError::MissingCredential(format!(
                    "{} is defined more than once in {}",
                    self.name,
                    self.path.display()
                )));
            }

            let value = quoted_value(line).ok_or_else(|| {
                UplinkError::MissingCredential(format!(
                    "{} has no quoted value in {}",
                    self.name,
                    self.path.display()
                ))
            })?;
            if value.is_empty() {
                return Err(UplinkError::MissingCredential(format!(
                    "{} is empty in {}",
                    self.name,
                    self.path.display()
                )));
            }
            found = Some(SharedKey::from(value));
        }

        let key = found.ok_or_else(|| {
            UplinkError::MissingCredential(format!(
                "{} not found in {}",
                self.name,
                self.path.display()
            ))
        })?;

        debug!("Loaded {} from {}", self.name, self.path.display());
        Ok(key)
    }
}

/// Whether `line` contains `name` as a standalone identifier token.
fn names_identifier(line: &str, name: &str) -> bool {
    line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|token| token == name)
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

fn quoted_value(line: &str) -> Option<&str> {
    let mut parts = line.splitn(3, '"');
    parts.next()?;
    let value = parts.next()?;
    // An unterminated quote is not a value
    parts.next()?;
    Some(value)
}
