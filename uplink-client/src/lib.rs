//! uplink client: signs a command and posts it to the control endpoint

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::Dispatcher;
pub use config::{Cli, ClientConfig, DEFAULT_ENDPOINT};
pub use error::ClientError;
pub use transport::{DispatchResponse, HttpTransport, Transport};

use std::io::Write;
use uplink_core::{AuthTag, Clock, CredentialProvider, SignedRequest};

pub type Result<T> = std::result::Result<T, ClientError>;

/// Result of one invocation
#[derive(Debug)]
pub enum Outcome {
    /// The request went out with `tag` and `response` came back
    Sent {
        tag: AuthTag,
        response: DispatchResponse,
    },
    /// `--dry-run`: signed, nothing sent
    Signed(SignedRequest),
}

/// Carry out a parsed command line with the given dispatcher.
pub async fn run<P, C, T>(cli: &Cli, dispatcher: &Dispatcher<P, C, T>) -> Result<Outcome>
where
    P: CredentialProvider,
    C: Clock,
    T: Transport,
{
    let (command, argument) = cli.invocation()?;
    let signed = dispatcher.sign(command, argument)?;

    if cli.dry_run {
        return Ok(Outcome::Signed(signed));
    }

    let tag = signed.tag.clone();
    let response = dispatcher.send(signed).await?;
    Ok(Outcome::Sent { tag, response })
}

/// Print an outcome: the tag line first, then the raw response body, or
/// the payload and tag for a dry run.
pub fn write_outcome<W: Write>(out: &mut W, outcome: &Outcome) -> Result<()> {
    match outcome {
        Outcome::Signed(signed) => {
            writeln!(out, "{}", signed.payload)?;
            writeln!(out, "{}", signed.tag)?;
        }
        Outcome::Sent { tag, response } => {
            writeln!(out, "{}", tag)?;
            out.write_all(&response.body)?;
            if !response.body.ends_with(b"\n") {
                writeln!(out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
