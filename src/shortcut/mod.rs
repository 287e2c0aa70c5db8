//! Global keyboard shortcuts.
//!
//! Architecture:
//! - `combo.rs` - Key combinations, matching and "Ctrl+KeyS" parsing
//! - `event.rs` - Key events and the process-wide listener registry
//! - `timer.rs` - Cancelable one-shot timers used for suppression
//! - `binder.rs` - `Shortcut`, one combination bound to one action on one element

mod binder;
mod combo;
mod event;
mod timer;

pub use binder::{Action, Activate, BindingState, Shortcut, ShortcutConfig, DEFAULT_SUPPRESSION};
pub use combo::{KeyCombination, ParseComboError};
pub use event::{KeyEvent, KeyEventBus, KeyEventSource, KeyHandler, ListenerId};
pub use timer::{Scheduler, TimerHandle, TimerTask, TokioScheduler};

#[cfg(test)]
pub(crate) use timer::manual::ManualScheduler;
