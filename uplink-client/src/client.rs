//! Signs commands and hands them to the transport

use tracing::{info, warn};
use uplink_core::{
    Clock, Command, CredentialProvider, HeaderFileProvider, RequestSigner, SignedRequest,
    SystemClock,
};
use crate::config::ClientConfig;
use crate::transport::{DispatchResponse, HttpTransport, Transport};
use crate::Result;

/// Sends one authenticated command per call
pub struct Dispatcher<P, C, T> {
    signer: RequestSigner<P, C>,
    transport: T,
}

impl Dispatcher<HeaderFileProvider, SystemClock, HttpTransport> {
    /// Dispatcher reading the key from the configured header file
    pub fn from_config(config: &ClientConfig) -> Self {
        Dispatcher::new(
            HeaderFileProvider::new(&config.credentials, &config.key_name),
            SystemClock,
            HttpTransport::new(config.endpoint.clone(), config.timeout),
        )
    }
}

impl<P, C, T> Dispatcher<P, C, T>
where
    P: CredentialProvider,
    C: Clock,
    T: Transport,
{
    pub fn new(credentials: P, clock: C, transport: T) -> Self {
        Dispatcher {
            signer: RequestSigner::new(credentials, clock),
            transport,
        }
    }

    /// Build the payload and tag without sending anything
    pub fn sign(&self, command: Command, argument: Option<String>) -> Result<SignedRequest> {
        Ok(self.signer.sign_request(command, argument)?)
    }

    /// Sign and send in a single attempt. Failures are returned as-is.
    pub async fn dispatch(
        &self,
        command: Command,
        argument: Option<String>,
    ) -> Result<DispatchResponse> {
        let signed = self.sign(command, argument)?;
        self.send(signed).await
    }

    /// Send an already signed request in a single attempt
    pub async fn send(&self, signed: SignedRequest) -> Result<DispatchResponse> {
        info!(tag = %signed.tag, "Dispatching {}", signed.request.command);

        let response = self.transport.post(signed.payload, &signed.tag).await?;
        if response.is_success() {
            info!("Endpoint answered {}", response.status);
        } else {
            warn!("Endpoint answered {}", response.status);
        }

        Ok(response)
    }
}
