//! In-process call/response transport.
//!
//! The frontend side (`ChannelInvoker`) queues a `HostRequest` and waits on a
//! oneshot for the host's answer. The host side drains the receiver returned
//! by `ChannelInvoker::new` and replies through `HostRequest::respond`.
//! Dropping that receiver disconnects every invoker.

use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use serde_json::Value;
use tokio::sync::oneshot;

use super::client::Invoke;
use super::error::RemoteError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A call waiting for the host to answer it.
#[derive(Debug)]
pub struct HostRequest {
  pub request_id: i64,
  pub command: &'static str,
  pub args: Value,
  reply: oneshot::Sender<Result<Value, String>>,
}

impl HostRequest {
  /// Answer the call. `Err` is delivered to the caller as a rejection.
  pub fn respond(self, result: Result<Value, String>) {
    if self.reply.send(result).is_err() {
      log::debug!("Caller stopped waiting for request {}", self.request_id);
    }
  }
}

/// Frontend end of the channel transport.
#[derive(Clone)]
pub struct ChannelInvoker {
  tx: Sender<HostRequest>,
  next_id: Arc<AtomicI64>,
  timeout: Duration,
}

impl ChannelInvoker {
  /// Create the invoker and the receiver the host drains.
  pub fn new() -> (Self, Receiver<HostRequest>) {
    let (tx, rx) = async_channel::unbounded();
    let invoker = Self {
      tx,
      next_id: Arc::new(AtomicI64::new(1)),
      timeout: DEFAULT_TIMEOUT,
    };
    (invoker, rx)
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Stop accepting calls. Pending and future calls fail with `Disconnected`.
  pub fn close(&self) {
    self.tx.close();
  }
}

impl Invoke for ChannelInvoker {
  fn invoke(
    &self,
    command: &'static str,
    args: Value,
  ) -> impl Future<Output = Result<Value, RemoteError>> + Send {
    let request_id = self.next_id.fetch_add(1, Ordering::SeqCst);
    let tx = self.tx.clone();
    let timeout = self.timeout;

    async move {
      let (reply, rx) = oneshot::channel();
      tx.send(HostRequest {
        request_id,
        command,
        args,
        reply,
      })
      .await
      .map_err(|_| RemoteError::Disconnected)?;

      match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(message))) => Err(RemoteError::Rejected(message)),
        Ok(Err(_)) => Err(RemoteError::Disconnected),
        Err(_) => {
          log::error!(
            "Host call {} timed out after {:?}, request_id={}",
            command,
            timeout,
            request_id
          );
          Err(RemoteError::Timeout)
        }
      }
    }
  }
}
