//! Remote invocation error types.

use thiserror::Error;

use super::protocol::ApiVersion;

/// Errors returned by calls into the host process.
#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("Host rejected the call: {0}")]
  Rejected(String),

  #[error("Command {command} is not available in API {version}")]
  Unsupported {
    command: &'static str,
    version: ApiVersion,
  },

  #[error("Unexpected response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("Host disconnected")]
  Disconnected,

  #[error("Call timed out")]
  Timeout,
}
