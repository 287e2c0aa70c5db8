//! Key events and the process-wide listener registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use async_channel::Receiver;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A key press as delivered by the platform.
///
/// Field names follow the DOM `KeyboardEvent` so adapters can deserialize
/// events straight from the webview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
  pub code: String,
  #[serde(default)]
  pub alt_key: bool,
  #[serde(default)]
  pub shift_key: bool,
  #[serde(default)]
  pub ctrl_key: bool,
  #[serde(default)]
  pub meta_key: bool,
  #[serde(skip)]
  default_prevented: bool,
}

impl KeyEvent {
  pub fn new(code: impl Into<String>) -> Self {
    Self {
      code: code.into(),
      ..Default::default()
    }
  }

  pub fn alt(mut self) -> Self {
    self.alt_key = true;
    self
  }

  pub fn shift(mut self) -> Self {
    self.shift_key = true;
    self
  }

  pub fn ctrl(mut self) -> Self {
    self.ctrl_key = true;
    self
  }

  pub fn meta(mut self) -> Self {
    self.meta_key = true;
    self
  }

  /// Suppress the platform's default handling of this event.
  pub fn prevent_default(&mut self) {
    self.default_prevented = true;
  }

  pub fn default_prevented(&self) -> bool {
    self.default_prevented
  }
}

/// Registration token returned by [`KeyEventSource::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type KeyHandler = Arc<dyn Fn(&mut KeyEvent) + Send + Sync>;

/// A global stream of key presses that handlers can subscribe to.
pub trait KeyEventSource: Send + Sync {
  fn add_listener(&self, handler: KeyHandler) -> ListenerId;

  /// Returns `false` if the id was not registered.
  fn remove_listener(&self, id: ListenerId) -> bool;
}

/// In-process key event dispatcher.
///
/// Listeners run in registration order. The listener list is copied before
/// each dispatch, so handlers may register or remove listeners (including
/// themselves) while an event is being delivered.
#[derive(Default)]
pub struct KeyEventBus {
  listeners: RwLock<Vec<(ListenerId, KeyHandler)>>,
  next_id: AtomicU64,
}

impl KeyEventBus {
  pub fn new() -> Self {
    Self::default()
  }

  /// The process-wide bus.
  pub fn global() -> Arc<KeyEventBus> {
    static GLOBAL: OnceLock<Arc<KeyEventBus>> = OnceLock::new();
    GLOBAL.get_or_init(|| Arc::new(KeyEventBus::new())).clone()
  }

  /// Deliver an event to every registered listener.
  pub fn dispatch(&self, event: &mut KeyEvent) {
    let listeners: Vec<KeyHandler> = self
      .listeners
      .read()
      .iter()
      .map(|(_, handler)| handler.clone())
      .collect();

    for handler in listeners {
      handler(event);
    }

    if event.default_prevented() {
      log::trace!("Key event {} handled", event.code);
    }
  }

  pub fn listener_count(&self) -> usize {
    self.listeners.read().len()
  }

  /// Dispatch events fed by a platform adapter until the channel closes.
  pub async fn run(&self, events: Receiver<KeyEvent>) {
    log::info!("Key event loop started");
    while let Ok(mut event) = events.recv().await {
      self.dispatch(&mut event);
    }
    log::info!("Key event loop stopped");
  }
}

impl KeyEventSource for KeyEventBus {
  fn add_listener(&self, handler: KeyHandler) -> ListenerId {
    let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
    self.listeners.write().push((id, handler));
    id
  }

  fn remove_listener(&self, id: ListenerId) -> bool {
    let mut listeners = self.listeners.write();
    let before = listeners.len();
    listeners.retain(|(existing, _)| *existing != id);
    listeners.len() != before
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize;

  fn counting_handler(counter: &Arc<AtomicUsize>) -> KeyHandler {
    let counter = counter.clone();
    Arc::new(move |_event: &mut KeyEvent| {
      counter.fetch_add(1, Ordering::SeqCst);
    })
  }

  #[test]
  fn test_event_deserializes_from_dom_shape() {
    let json = r#"{"code":"KeyS","ctrlKey":true,"altKey":false}"#;
    let event: KeyEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event, KeyEvent::new("KeyS").ctrl());
    assert!(!event.default_prevented());
  }

  #[test]
  fn test_add_and_remove_listener() {
    let bus = KeyEventBus::new();
    let count = Arc::new(AtomicUsize::new(0));

    let id = bus.add_listener(counting_handler(&count));
    assert_eq!(bus.listener_count(), 1);

    bus.dispatch(&mut KeyEvent::new("Space"));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    assert!(bus.remove_listener(id));
    assert!(!bus.remove_listener(id));
    assert_eq!(bus.listener_count(), 0);

    bus.dispatch(&mut KeyEvent::new("Space"));
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_listener_may_remove_itself_during_dispatch() {
    let bus = Arc::new(KeyEventBus::new());
    let slot: Arc<parking_lot::Mutex<Option<ListenerId>>> = Arc::default();

    let handler: KeyHandler = {
      let bus = Arc::downgrade(&bus);
      let slot = slot.clone();
      Arc::new(move |event: &mut KeyEvent| {
        event.prevent_default();
        if let (Some(bus), Some(id)) = (bus.upgrade(), slot.lock().take()) {
          bus.remove_listener(id);
        }
      })
    };
    *slot.lock() = Some(bus.add_listener(handler));

    let mut event = KeyEvent::new("Escape");
    bus.dispatch(&mut event);
    assert!(event.default_prevented());
    assert_eq!(bus.listener_count(), 0);
  }

  #[tokio::test]
  async fn test_run_drains_channel() {
    let bus = KeyEventBus::new();
    let count = Arc::new(AtomicUsize::new(0));
    bus.add_listener(counting_handler(&count));

    let (tx, rx) = async_channel::unbounded();
    tx.send(KeyEvent::new("KeyA")).await.unwrap();
    tx.send(KeyEvent::new("KeyB")).await.unwrap();
    drop(tx);

    bus.run(rx).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
  }
}
