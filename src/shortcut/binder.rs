//! Binding of one key combination to one action on one UI element.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use super::combo::KeyCombination;
use super::event::{KeyEvent, KeyEventSource, KeyHandler, ListenerId};
use super::timer::{Scheduler, TimerHandle};

/// Suppression window used when a config does not set one.
pub const DEFAULT_SUPPRESSION: Duration = Duration::from_millis(200);

pub type Action = Arc<dyn Fn() + Send + Sync>;

/// A UI element that can be activated (clicked) programmatically.
pub trait Activate: Send + Sync {
  fn activate(&self);
}

/// What a [`Shortcut`] listens for and does.
#[derive(Clone, Default)]
pub struct ShortcutConfig {
  pub combination: KeyCombination,
  /// Runs instead of activating the target when set.
  pub action: Option<Action>,
  /// `None` uses [`DEFAULT_SUPPRESSION`]; `Some(Duration::ZERO)` disables suppression.
  pub suppression: Option<Duration>,
}

impl ShortcutConfig {
  pub fn new(combination: KeyCombination) -> Self {
    Self {
      combination,
      ..Default::default()
    }
  }

  pub fn with_action(mut self, action: impl Fn() + Send + Sync + 'static) -> Self {
    self.action = Some(Arc::new(action));
    self
  }

  pub fn with_suppression(mut self, window: Duration) -> Self {
    self.suppression = Some(window);
    self
  }

  pub fn suppression_window(&self) -> Duration {
    self.suppression.unwrap_or(DEFAULT_SUPPRESSION)
  }
}

impl fmt::Debug for ShortcutConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ShortcutConfig")
      .field("combination", &self.combination)
      .field("action", &self.action.as_ref().map(|_| "<fn>"))
      .field("suppression", &self.suppression)
      .finish()
  }
}

/// Observable state of a [`Shortcut`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
  /// No listener registered.
  Detached,
  /// Listening; the next matching event fires.
  Ready,
  /// Listening, but matching events are ignored until the window expires.
  Suppressed,
}

struct Armed {
  listener: ListenerId,
  config: ShortcutConfig,
  suppressed: bool,
  timer: Option<TimerHandle>,
}

struct State {
  armed: Option<Armed>,
  /// Bumped on every teardown; listeners and timers from older generations are inert.
  generation: u64,
}

struct Inner {
  source: Arc<dyn KeyEventSource>,
  scheduler: Arc<dyn Scheduler>,
  target: Weak<dyn Activate>,
  state: Mutex<State>,
}

/// A global keyboard shortcut tied to a UI element.
///
/// While armed, the shortcut listens on the whole key event stream, not just
/// when the target has focus. A matching press prevents the event's default,
/// runs the configured action (or activates the target) and then ignores
/// further matches for the suppression window, which absorbs key repeat.
///
/// Dropping the shortcut detaches it.
pub struct Shortcut {
  inner: Arc<Inner>,
}

impl Shortcut {
  /// Create a shortcut, armed if `config` is given.
  pub fn bind(
    source: Arc<dyn KeyEventSource>,
    scheduler: Arc<dyn Scheduler>,
    target: Weak<dyn Activate>,
    config: Option<ShortcutConfig>,
  ) -> Self {
    let shortcut = Self {
      inner: Arc::new(Inner {
        source,
        scheduler,
        target,
        state: Mutex::new(State {
          armed: None,
          generation: 0,
        }),
      }),
    };
    shortcut.update(config);
    shortcut
  }

  /// Replace the configuration. The old listener and any pending timer are
  /// removed first; `None` leaves the shortcut detached.
  pub fn update(&self, config: Option<ShortcutConfig>) {
    let mut state = self.inner.state.lock();
    self.inner.teardown(&mut state);

    let Some(config) = config else {
      return;
    };

    let handler = Inner::handler(Arc::downgrade(&self.inner), state.generation);
    let listener = self.inner.source.add_listener(handler);
    log::debug!("Shortcut {} armed", config.combination);
    state.armed = Some(Armed {
      listener,
      config,
      suppressed: false,
      timer: None,
    });
  }

  /// Detach. Safe to call repeatedly.
  pub fn destroy(&self) {
    let mut state = self.inner.state.lock();
    self.inner.teardown(&mut state);
  }

  pub fn state(&self) -> BindingState {
    match &self.inner.state.lock().armed {
      None => BindingState::Detached,
      Some(armed) if armed.suppressed => BindingState::Suppressed,
      Some(_) => BindingState::Ready,
    }
  }

  pub fn combination(&self) -> Option<KeyCombination> {
    let state = self.inner.state.lock();
    state.armed.as_ref().map(|armed| armed.config.combination.clone())
  }
}

impl Drop for Shortcut {
  fn drop(&mut self) {
    self.destroy();
  }
}

impl Inner {
  fn teardown(&self, state: &mut State) {
    state.generation = state.generation.wrapping_add(1);
    if let Some(armed) = state.armed.take() {
      if let Some(timer) = armed.timer {
        timer.cancel();
      }
      self.source.remove_listener(armed.listener);
      log::debug!("Shortcut {} detached", armed.config.combination);
    }
  }

  fn handler(inner: Weak<Inner>, generation: u64) -> KeyHandler {
    Arc::new(move |event: &mut KeyEvent| {
      if let Some(inner) = inner.upgrade() {
        inner.on_key(generation, event);
      }
    })
  }

  fn on_key(self: &Arc<Self>, generation: u64, event: &mut KeyEvent) {
    let action = {
      let mut state = self.state.lock();
      if state.generation != generation {
        return;
      }
      let Some(armed) = state.armed.as_mut() else {
        return;
      };
      if armed.suppressed || !armed.config.combination.matches(event) {
        return;
      }

      event.prevent_default();
      log::debug!("Shortcut {} fired", armed.config.combination);

      let window = armed.config.suppression_window();
      if !window.is_zero() {
        armed.suppressed = true;
        let weak = Arc::downgrade(self);
        armed.timer = Some(self.scheduler.schedule(
          window,
          Box::new(move || {
            if let Some(inner) = weak.upgrade() {
              inner.end_suppression(generation);
            }
          }),
        ));
      }

      armed.config.action.clone()
    };

    // No lock held: the action may reconfigure this shortcut.
    match action {
      Some(action) => action(),
      None => match self.target.upgrade() {
        Some(target) => target.activate(),
        None => log::debug!("Shortcut target is gone, nothing to activate"),
      },
    }
  }

  fn end_suppression(&self, generation: u64) {
    let mut state = self.state.lock();
    if state.generation != generation {
      return;
    }
    if let Some(armed) = state.armed.as_mut() {
      armed.suppressed = false;
      armed.timer = None;
    }
  }
}
