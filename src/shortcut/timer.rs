//! One-shot timers with explicit cancellation.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a scheduled task. Dropping it does not cancel the task.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
  token: CancellationToken,
}

impl TimerHandle {
  pub fn new() -> Self {
    Self::default()
  }

  /// Prevent the task from running if it has not run yet.
  pub fn cancel(&self) {
    self.token.cancel();
  }

  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }

  /// Token that schedulers watch to skip a cancelled task.
  pub fn token(&self) -> CancellationToken {
    self.token.clone()
  }
}

/// Runs a task once after a delay.
pub trait Scheduler: Send + Sync {
  fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Scheduler backed by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
  runtime: Handle,
}

impl TokioScheduler {
  pub fn new(runtime: Handle) -> Self {
    Self { runtime }
  }

  /// Use the runtime of the calling context, if there is one.
  pub fn current() -> Option<Self> {
    Handle::try_current().ok().map(Self::new)
  }
}

impl Scheduler for TokioScheduler {
  fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
    let handle = TimerHandle::new();
    let token = handle.token();
    self.runtime.spawn(async move {
      tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(delay) => task(),
      }
    });
    handle
  }
}
