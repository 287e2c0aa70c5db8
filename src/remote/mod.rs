//! Remote player surface exposed by the host process.
//!
//! Architecture:
//! - `protocol.rs` - Versioned command names and JSON argument records
//! - `client.rs` - `Invoke` transport trait and the typed `PlayerRemote` client
//! - `channel.rs` - In-process call/response transport over channels
//! - `error.rs` - Error type shared by all of the above

mod channel;
mod client;
mod error;
mod protocol;

pub use channel::{ChannelInvoker, HostRequest};
pub use client::{Invoke, PlayerRemote};
pub use error::RemoteError;
pub use protocol::{ApiVersion, RemoteCommand};

#[cfg(test)]
pub(crate) use client::recording;
