//! Keyboard shortcuts and player controls for a music player frontend.
//!
//! - [`shortcut`] - global key combinations bound to actions on UI elements
//! - [`remote`] - typed calls into the host process that plays the music
//! - [`keymap`] - persisted key bindings wired to remote player actions

pub mod keymap;
pub mod remote;
pub mod shortcut;

pub use keymap::{ConfigError, KeyAction, Keymap, KeymapEntry};
pub use remote::{ApiVersion, ChannelInvoker, Invoke, PlayerRemote, RemoteCommand, RemoteError};
pub use shortcut::{
  Activate, BindingState, KeyCombination, KeyEvent, KeyEventBus, Shortcut, ShortcutConfig,
};
