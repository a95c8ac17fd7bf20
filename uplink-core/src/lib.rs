//! Core types and request authentication for uplink

pub mod auth;
pub mod clock;
pub mod error;
pub mod types;

pub use auth::*;
pub use clock::*;
pub use error::*;
pub use types::*;

/// Result type alias for uplink operations
pub type Result<T> = std::result::Result<T, UplinkError>;
