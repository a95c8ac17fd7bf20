//! Core data types for uplink

use serde::{Deserialize, Serialize};

/// Field separator of the signed payload.
pub const DELIMITER: char = ';';

/// Name of the remote command to run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command(String);

impl Command {
    /// Create a new command name. Only emptiness is rejected; the delimiter is
    /// passed through unescaped, see [`CommandRequest::has_ambiguous_framing`].
    pub fn new(name: &str) -> crate::Result<Self> {
        if name.is_empty() {
            return Err(crate::UplinkError::InvalidCommand("empty command".to_string()));
        }

        Ok(Command(name.to_string()))
    }

    /// Get the command name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A command plus its optional argument, bound to the moment it was signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub timestamp_ms: u64,
    pub command: Command,
    pub argument: Option<String>,
}

impl CommandRequest {
    pub fn new(timestamp_ms: u64, command: Command, argument: Option<String>) -> Self {
        CommandRequest {
            timestamp_ms,
            command,
            argument,
        }
    }

    /// Serialize into the exact bytes that get signed and sent.
    pub fn to_payload(&self) -> crate::auth::Payload {
        crate::auth::build_payload(
            self.timestamp_ms,
            self.command.as_str(),
            self.argument.as_deref(),
        )
    }

    /// Whether a field carries the delimiter, in which case a server cannot
    /// recover the field boundaries that were signed.
    pub fn has_ambiguous_framing(&self) -> bool {
        self.command.as_str().contains(DELIMITER)
            || self
                .argument
                .as_deref()
                .map_or(false, |arg| arg.contains(DELIMITER))
    }
}

/// A request that passed tag, framing and freshness checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedCommand {
    pub timestamp_ms: u64,
    pub command: String,
    pub argument: Option<String>,
}

impl std::fmt::Display for VerifiedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.argument {
            Some(arg) => write!(f, "{} {}", self.command, arg),
            None => write!(f, "{}", self.command),
        }
    }
}
