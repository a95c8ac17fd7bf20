//! Request authentication for uplink
//!
//! - Payload framing of (timestamp, command, argument)
//! - HMAC-SHA256 tags over the payload
//! - Injected credential providers for the shared key
//! - Verification with a freshness window and replay memory

pub mod keys;
pub mod payload;
pub mod signer;
pub mod timing;
pub mod verify;

pub use keys::*;
pub use payload::*;
pub use signer::*;
pub use timing::*;
pub use verify::*;
