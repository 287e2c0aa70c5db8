//! Key combinations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::event::KeyEvent;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseComboError {
  #[error("Key combination is empty")]
  Empty,
  #[error("Key combination has no key after the modifiers")]
  MissingKey,
  #[error("Unknown modifier: {0}")]
  UnknownModifier(String),
  #[error("Modifier given twice: {0}")]
  DuplicateModifier(String),
}

/// A key code plus the exact modifier state required to match it.
///
/// Modifiers are compared strictly: a modifier left `false` must not be held.
/// `control` is satisfied by either the control key or the meta (Cmd) key.
///
/// The string form is `[modifiers+]code`, e.g. `"Ctrl+Shift+KeyS"` or `"Space"`,
/// where `code` is a physical key code (`KeyA`, `Digit1`, `ArrowLeft`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCombination {
  pub code: String,
  pub alt: bool,
  pub shift: bool,
  pub control: bool,
}

impl KeyCombination {
  /// Combination with no modifiers.
  pub fn new(code: impl Into<String>) -> Self {
    Self {
      code: code.into(),
      ..Default::default()
    }
  }

  pub fn ctrl(code: impl Into<String>) -> Self {
    Self::new(code).with_control(true)
  }

  pub fn with_alt(mut self, alt: bool) -> Self {
    self.alt = alt;
    self
  }

  pub fn with_shift(mut self, shift: bool) -> Self {
    self.shift = shift;
    self
  }

  pub fn with_control(mut self, control: bool) -> Self {
    self.control = control;
    self
  }

  /// Check the event against this combination.
  ///
  /// A combination with an empty code matches nothing.
  pub fn matches(&self, event: &KeyEvent) -> bool {
    !self.code.is_empty()
      && self.alt == event.alt_key
      && self.shift == event.shift_key
      && self.control == (event.ctrl_key || event.meta_key)
      && self.code == event.code
  }
}

impl fmt::Display for KeyCombination {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.control {
      f.write_str("Ctrl+")?;
    }
    if self.alt {
      f.write_str("Alt+")?;
    }
    if self.shift {
      f.write_str("Shift+")?;
    }
    f.write_str(&self.code)
  }
}

impl FromStr for KeyCombination {
  type Err = ParseComboError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() {
      return Err(ParseComboError::Empty);
    }

    let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
    let code = parts.pop().unwrap_or_default();
    if code.is_empty() {
      return Err(ParseComboError::MissingKey);
    }

    let mut combo = KeyCombination::new(code);
    for part in parts {
      let flag = match part.to_ascii_lowercase().as_str() {
        "ctrl" | "control" | "cmd" | "command" | "meta" | "super" => &mut combo.control,
        "alt" | "option" => &mut combo.alt,
        "shift" => &mut combo.shift,
        _ => return Err(ParseComboError::UnknownModifier(part.to_string())),
      };
      if *flag {
        return Err(ParseComboError::DuplicateModifier(part.to_string()));
      }
      *flag = true;
    }

    Ok(combo)
  }
}

impl TryFrom<String> for KeyCombination {
  type Error = ParseComboError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<KeyCombination> for String {
  fn from(combo: KeyCombination) -> Self {
    combo.to_string()
  }
}
