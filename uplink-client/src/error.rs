//! Client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Usage(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Core error: {0}")]
    Core(#[from] uplink_core::UplinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Usage(_) => 2,
            _ => 1,
        }
    }

    pub fn is_missing_credential(&self) -> bool {
        matches!(
            self,
            ClientError::Core(uplink_core::UplinkError::MissingCredential(_))
        )
    }
}

impl From<clap::Error> for ClientError {
    fn from(err: clap::Error) -> Self {
        ClientError::Usage(err.to_string())
    }
}
