//! Command-line surface and client configuration

use crate::{ClientError, Result};
use clap::Parser;
use hyper::Uri;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use uplink_core::{Command, DEFAULT_CREDENTIALS_PATH, DEFAULT_KEY_NAME};

/// Fixed control endpoint commands are sent to.
pub const DEFAULT_ENDPOINT: &str = "http://10.0.1.14";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Send an authenticated command to the control endpoint
#[derive(Parser, Debug, Clone)]
#[command(name = "uplink", version)]
pub struct Cli {
    /// Command to run on the remote side
    pub command: String,

    /// Optional single argument for the command
    #[arg(allow_hyphen_values = true)]
    pub argument: Option<String>,

    /// Control endpoint URL
    #[arg(long, env = "UPLINK_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Header file holding the shared key
    #[arg(long, env = "UPLINK_CREDENTIALS", default_value = DEFAULT_CREDENTIALS_PATH)]
    pub credentials: PathBuf,

    /// Name of the constant the key is defined under
    #[arg(long, env = "UPLINK_KEY_NAME", default_value = DEFAULT_KEY_NAME)]
    pub key_name: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Sign and print the payload and tag without sending
    #[arg(long)]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Parse arguments, turning any parse failure into [`ClientError::Usage`].
    pub fn try_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map_err(ClientError::from)
    }

    /// The validated command and its argument
    pub fn invocation(&self) -> Result<(Command, Option<String>)> {
        let command = Command::new(&self.command)
            .map_err(|e| ClientError::Usage(e.to_string()))?;
        Ok((command, self.argument.clone()))
    }

    pub fn config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig {
            endpoint: parse_endpoint(&self.endpoint)?,
            credentials: self.credentials.clone(),
            key_name: self.key_name.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

/// Where and how to send signed commands
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Uri,
    pub credentials: PathBuf,
    pub key_name: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoint: Uri::from_static(DEFAULT_ENDPOINT),
            credentials: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            key_name: DEFAULT_KEY_NAME.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Validate a plain-HTTP endpoint URL
pub fn parse_endpoint(endpoint: &str) -> Result<Uri> {
    let uri: Uri = endpoint
        .parse()
        .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

    if uri.scheme_str() != Some("http") {
        return Err(ClientError::InvalidEndpoint(format!(
            "{}: only http:// endpoints are supported",
            endpoint
        )));
    }
    if uri.authority().is_none() {
        return Err(ClientError::InvalidEndpoint(format!("{}: missing host", endpoint)));
    }

    Ok(uri)
}
