//! Payload framing for signed commands
//!
//! The payload is both the request body and the exact input to the tag:
//! `{timestamp_ms};{command};` or `{timestamp_ms};{command};{argument};`.
//! The trailing delimiter is part of the signed content.
//!
//! Fields are not escaped. A command or argument containing `;` produces a
//! payload whose field boundaries a server cannot recover, so [`Payload::parse`]
//! rejects anything with more than three fields instead of guessing.

use crate::{Command, CommandRequest, Result, UplinkError, DELIMITER};

/// Serialized command request, ready to sign and send.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload(String);

impl Payload {
    /// Get the payload as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UTF-8 bytes as they go on the wire
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse received bytes back into the request they frame.
    pub fn parse(bytes: &[u8]) -> Result<CommandRequest> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| UplinkError::MalformedPayload("not valid UTF-8".to_string()))?;

        let body = text.strip_suffix(DELIMITER).ok_or_else(|| {
            UplinkError::MalformedPayload("missing trailing delimiter".to_string())
        })?;

        let fields: Vec<&str> = body.split(DELIMITER).collect();
        let (timestamp, command, argument) = match fields.as_slice() {
            [timestamp, command] => (*timestamp, *command, None),
            [timestamp, command, argument] => (*timestamp, *command, Some(argument.to_string())),
            _ => {
                return Err(UplinkError::MalformedPayload(format!(
                    "expected 2 or 3 fields, found {}",
                    fields.len()
                )))
            }
        };

        if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UplinkError::MalformedPayload("invalid timestamp".to_string()));
        }
        let timestamp_ms: u64 = timestamp
            .parse()
            .map_err(|_| UplinkError::MalformedPayload("timestamp out of range".to_string()))?;

        let command = Command::new(command)
            .map_err(|_| UplinkError::MalformedPayload("empty command".to_string()))?;

        Ok(CommandRequest::new(timestamp_ms, command, argument))
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Build the payload for a command issued at `timestamp_ms`.
pub fn build_payload(timestamp_ms: u64, command: &str, argument: Option<&str>) -> Payload {
    let mut payload = format!("{timestamp_ms}{DELIMITER}{command}{DELIMITER}");

    if let Some(argument) = argument {
        payload.push_str(argument);
        payload.push(DELIMITER);
    }

    Payload(payload)
}
