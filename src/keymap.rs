//! Keymap configuration with persistence.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Handle;

use crate::remote::{ApiVersion, Invoke, PlayerRemote, RemoteError};
use crate::shortcut::{Activate, KeyCombination, KeyEventSource, Scheduler, Shortcut, ShortcutConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to access keymap file: {0}")]
  Io(#[from] std::io::Error),

  #[error("Invalid keymap JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Invalid keymap entry: {0}")]
  Invalid(String),

  #[error("Bindings {first} and {second} both use {keys}")]
  Conflict {
    first: usize,
    second: usize,
    keys: String,
  },

  #[error("No configuration directory on this platform")]
  NoConfigDir,
}

/// Player action triggered by a key binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyAction {
  PlayPause,
  /// Volume delta in the range -1.0 to 1.0.
  AdjustVolume { by: f64 },
  /// Seconds to seek, relative to the current position.
  Seek { by: i64 },
  /// Songs to move through the queue.
  Skip { by: i32 },
  Shuffle,
  ToggleRepeat,
  /// Click the element the keymap is installed on.
  Activate,
}

impl KeyAction {
  /// Forward the action to the host. `Activate` has nothing to send.
  pub async fn run<I: Invoke>(&self, remote: &PlayerRemote<I>) -> Result<(), RemoteError> {
    match self {
      KeyAction::PlayPause => remote.play_pause().await,
      KeyAction::AdjustVolume { by } => remote.adjust_volume(*by).await,
      KeyAction::Seek { by } => remote.seek_relative(*by).await.map(|_| ()),
      KeyAction::Skip { by } => remote.skip(*by).await,
      KeyAction::Shuffle => remote.shuffle().await,
      KeyAction::ToggleRepeat => remote.toggle_repeat().await,
      KeyAction::Activate => Ok(()),
    }
  }
}

/// One key binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeymapEntry {
  pub keys: KeyCombination,
  pub action: KeyAction,
  /// Suppression window in milliseconds. Absent uses the default, 0 disables it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub delay_ms: Option<u64>,
}

impl KeymapEntry {
  pub fn new(keys: KeyCombination, action: KeyAction) -> Self {
    Self {
      keys,
      action,
      delay_ms: None,
    }
  }

  pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
    self.delay_ms = Some(delay_ms);
    self
  }
}

/// Keyboard shortcuts for the player window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keymap {
  /// Command naming scheme of the host.
  #[serde(default)]
  pub api_version: ApiVersion,

  #[serde(default = "default_bindings")]
  pub bindings: Vec<KeymapEntry>,
}

fn default_bindings() -> Vec<KeymapEntry> {
  use KeyAction::*;

  vec![
    KeymapEntry::new(KeyCombination::new("Space"), PlayPause),
    KeymapEntry::new(KeyCombination::new("ArrowUp"), AdjustVolume { by: 0.05 }).with_delay_ms(50),
    KeymapEntry::new(KeyCombination::new("ArrowDown"), AdjustVolume { by: -0.05 }).with_delay_ms(50),
    KeymapEntry::new(KeyCombination::new("ArrowRight"), Seek { by: 5 }),
    KeymapEntry::new(KeyCombination::new("ArrowLeft"), Seek { by: -5 }),
    KeymapEntry::new(KeyCombination::ctrl("ArrowRight"), Skip { by: 1 }),
    KeymapEntry::new(KeyCombination::ctrl("ArrowLeft"), Skip { by: -1 }),
    KeymapEntry::new(KeyCombination::ctrl("KeyS"), Shuffle),
    KeymapEntry::new(KeyCombination::ctrl("KeyR"), ToggleRepeat),
  ]
}

impl Default for Keymap {
  fn default() -> Self {
    Self {
      api_version: ApiVersion::default(),
      bindings: default_bindings(),
    }
  }
}

impl Keymap {
  /// `<config dir>/keybridge/keymap.json`.
  pub fn default_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
      .map(|dir| dir.join("keybridge").join("keymap.json"))
      .ok_or(ConfigError::NoConfigDir)
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut seen: HashMap<&KeyCombination, usize> = HashMap::new();

    for (index, entry) in self.bindings.iter().enumerate() {
      if entry.keys.code.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("binding {} has no key", index)));
      }
      if let KeyAction::AdjustVolume { by } = entry.action {
        if !(-1.0..=1.0).contains(&by) {
          return Err(ConfigError::Invalid(format!(
            "binding {} ({}) changes volume by {}, expected -1.0 to 1.0",
            index, entry.keys, by
          )));
        }
      }
      if let Some(first) = seen.insert(&entry.keys, index) {
        return Err(ConfigError::Conflict {
          first,
          second: index,
          keys: entry.keys.to_string(),
        });
      }
    }

    Ok(())
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let keymap: Keymap = serde_json::from_str(&contents)?;
    keymap.validate()?;
    log::info!("Loaded {} key bindings from {}", keymap.bindings.len(), path.display());
    Ok(keymap)
  }

  /// Load `path`, or fall back to the defaults if it is missing or unusable.
  pub fn load_or_default(path: &Path) -> Self {
    if !path.exists() {
      log::info!("No keymap at {}, using defaults", path.display());
      return Self::default();
    }
    match Self::load(path) {
      Ok(keymap) => keymap,
      Err(e) => {
        log::warn!("Ignoring keymap {}: {}", path.display(), e);
        Self::default()
      }
    }
  }

  pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
    self.validate()?;
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(self)?)?;
    Ok(())
  }

  /// Arm one shortcut per binding.
  ///
  /// The keymap is validated first. Remote actions are sent through `invoker`
  /// using this keymap's `api_version`, spawned on `runtime` and not awaited;
  /// failures are logged. `Activate` bindings click `target`.
  pub fn install<I: Invoke + 'static>(
    &self,
    source: Arc<dyn KeyEventSource>,
    scheduler: Arc<dyn Scheduler>,
    target: Weak<dyn Activate>,
    invoker: I,
    runtime: Handle,
  ) -> Result<Vec<Shortcut>, ConfigError> {
    self.validate()?;
    let remote = Arc::new(PlayerRemote::new(invoker, self.api_version));

    let shortcuts: Vec<Shortcut> = self
      .bindings
      .iter()
      .map(|entry| {
        let mut config = ShortcutConfig::new(entry.keys.clone());
        config.suppression = entry.delay_ms.map(Duration::from_millis);

        if entry.action != KeyAction::Activate {
          let action = entry.action.clone();
          let remote = remote.clone();
          let runtime = runtime.clone();
          config = config.with_action(move || {
            let action = action.clone();
            let remote = remote.clone();
            runtime.spawn(async move {
              if let Err(e) = action.run(&*remote).await {
                log::warn!("Shortcut action {:?} failed: {}", action, e);
              }
            });
          });
        }

        Shortcut::bind(source.clone(), scheduler.clone(), target.clone(), Some(config))
      })
      .collect();

    log::info!(
      "Installed {} shortcuts for API {}",
      shortcuts.len(),
      self.api_version
    );
    Ok(shortcuts)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::remote::recording::RecordingHost;
  use crate::shortcut::{KeyEvent, KeyEventBus, ManualScheduler};
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn test_default_keymap_is_valid() {
    let keymap = Keymap::default();
    keymap.validate().unwrap();
    assert_eq!(keymap.api_version, ApiVersion::V2);
    assert!(keymap
      .bindings
      .iter()
      .any(|b| b.keys == KeyCombination::new("Space") && b.action == KeyAction::PlayPause));
  }

  #[test]
  fn test_parse_keymap_file() {
    let json = r#"{
      "apiVersion": "v1",
      "bindings": [
        { "keys": "Ctrl+KeyP", "action": { "type": "playPause" } },
        { "keys": "Shift+ArrowUp", "action": { "type": "adjustVolume", "by": 0.1 }, "delayMs": 0 },
        { "keys": "Enter", "action": { "type": "activate" } }
      ]
    }"#;
    let keymap: Keymap = serde_json::from_str(json).unwrap();
    keymap.validate().unwrap();

    assert_eq!(keymap.api_version, ApiVersion::V1);
    assert_eq!(keymap.bindings.len(), 3);
    assert_eq!(keymap.bindings[0].keys, KeyCombination::ctrl("KeyP"));
    assert_eq!(keymap.bindings[0].delay_ms, None);
    assert_eq!(keymap.bindings[1].action, KeyAction::AdjustVolume { by: 0.1 });
    assert_eq!(keymap.bindings[1].delay_ms, Some(0));
    assert_eq!(keymap.bindings[2].action, KeyAction::Activate);
  }

  #[test]
  fn test_missing_fields_use_defaults() {
    let keymap: Keymap = serde_json::from_str("{}").unwrap();
    assert_eq!(keymap, Keymap::default());
  }

  #[test]
  fn test_bad_combination_is_rejected() {
    let json = r#"{ "bindings": [{ "keys": "Hyper+KeyP", "action": { "type": "playPause" } }] }"#;
    assert!(serde_json::from_str::<Keymap>(json).is_err());
  }

  #[test]
  fn test_validate_conflict() {
    let keymap = Keymap {
      api_version: ApiVersion::V2,
      bindings: vec![
        KeymapEntry::new(KeyCombination::ctrl("KeyS"), KeyAction::Shuffle),
        KeymapEntry::new(KeyCombination::new("Space"), KeyAction::PlayPause),
        KeymapEntry::new("Cmd+KeyS".parse().unwrap(), KeyAction::ToggleRepeat),
      ],
    };
    match keymap.validate() {
      Err(ConfigError::Conflict { first, second, keys }) => {
        assert_eq!((first, second), (0, 2));
        assert_eq!(keys, "Ctrl+KeyS");
      }
      other => panic!("Expected conflict, got {:?}", other),
    }
  }

  #[test]
  fn test_validate_volume_range_and_empty_key() {
    let loud = Keymap {
      api_version: ApiVersion::V2,
      bindings: vec![KeymapEntry::new(
        KeyCombination::new("ArrowUp"),
        KeyAction::AdjustVolume { by: 2.0 },
      )],
    };
    assert!(matches!(loud.validate(), Err(ConfigError::Invalid(_))));

    let blank = Keymap {
      api_version: ApiVersion::V2,
      bindings: vec![KeymapEntry::new(KeyCombination::default(), KeyAction::PlayPause)],
    };
    assert!(matches!(blank.validate(), Err(ConfigError::Invalid(_))));
  }

  #[test]
  fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("keymap.json");

    let mut keymap = Keymap::default();
    keymap.api_version = ApiVersion::V1;
    keymap.bindings.truncate(2);
    keymap.save(&path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains(r#""keys": "ArrowUp""#));
    assert!(written.contains(r#""delayMs": 50"#));

    assert_eq!(Keymap::load(&path).unwrap(), keymap);
  }

  #[test]
  fn test_load_or_default() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert_eq!(Keymap::load_or_default(&missing), Keymap::default());

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(Keymap::load(&broken), Err(ConfigError::Json(_))));
    assert_eq!(Keymap::load_or_default(&broken), Keymap::default());
  }

  #[derive(Default)]
  struct Controls {
    clicks: AtomicUsize,
  }

  impl Activate for Controls {
    fn activate(&self) {
      self.clicks.fetch_add(1, Ordering::SeqCst);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_install_forwards_keys_to_host() {
    let bus = Arc::new(KeyEventBus::new());
    let clock = ManualScheduler::new();
    let controls = Arc::new(Controls::default());
    let target: Arc<dyn Activate> = controls.clone();

    let host = Arc::new(RecordingHost::new());
    host.answer("player_song_position", json!(20));

    let mut keymap = Keymap::default();
    keymap
      .bindings
      .push(KeymapEntry::new(KeyCombination::new("Enter"), KeyAction::Activate));
    let shortcuts = keymap
      .install(
        bus.clone(),
        Arc::new(clock.clone()),
        Arc::downgrade(&target),
        host.clone(),
        Handle::current(),
      )
      .unwrap();
    assert_eq!(shortcuts.len(), keymap.bindings.len());
    assert_eq!(bus.listener_count(), keymap.bindings.len());

    let mut space = KeyEvent::new("Space");
    bus.dispatch(&mut space);
    assert!(space.default_prevented());
    bus.dispatch(&mut KeyEvent::new("ArrowLeft"));
    bus.dispatch(&mut KeyEvent::new("ArrowRight").ctrl());
    bus.dispatch(&mut KeyEvent::new("Enter"));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let mut names = host.names();
    names.sort();
    assert_eq!(
      names,
      vec![
        "player_play_or_pause",
        "player_seek_position",
        "player_skip",
        "player_song_position",
      ]
    );
    let calls = host.calls();
    assert!(calls.contains(&("player_seek_position".to_string(), json!({ "pos": 15 }))));
    assert!(calls.contains(&("player_skip".to_string(), json!({ "toIndex": 1 }))));
    assert_eq!(controls.clicks.load(Ordering::SeqCst), 1);

    drop(shortcuts);
    assert_eq!(bus.listener_count(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_action_does_not_disarm() {
    let bus = Arc::new(KeyEventBus::new());
    let clock = ManualScheduler::new();
    let target: Arc<dyn Activate> = Arc::new(Controls::default());
    let host = Arc::new(RecordingHost::new());
    host.reject("player_shuffle_queue", "queue is empty");

    let keymap = Keymap {
      api_version: ApiVersion::V2,
      bindings: vec![KeymapEntry::new(KeyCombination::ctrl("KeyS"), KeyAction::Shuffle)],
    };
    let _shortcuts = keymap
      .install(
        bus.clone(),
        Arc::new(clock.clone()),
        Arc::downgrade(&target),
        host.clone(),
        Handle::current(),
      )
      .unwrap();

    bus.dispatch(&mut KeyEvent::new("KeyS").ctrl());
    tokio::time::sleep(Duration::from_millis(10)).await;
    clock.advance(Duration::from_millis(200));
    bus.dispatch(&mut KeyEvent::new("KeyS").meta());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(host.names().len(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_install_uses_keymap_api_version() {
    let bus = Arc::new(KeyEventBus::new());
    let target: Arc<dyn Activate> = Arc::new(Controls::default());
    let host = Arc::new(RecordingHost::new());
    host.answer("get_song_position", json!(8));

    let keymap = Keymap {
      api_version: ApiVersion::V1,
      ..Keymap::default()
    };
    let _shortcuts = keymap
      .install(
        bus.clone(),
        Arc::new(ManualScheduler::new()),
        Arc::downgrade(&target),
        host.clone(),
        Handle::current(),
      )
      .unwrap();

    bus.dispatch(&mut KeyEvent::new("Space"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    bus.dispatch(&mut KeyEvent::new("ArrowRight"));
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(
      host.names(),
      vec!["play_pause", "get_song_position", "seek_position"]
    );
    assert_eq!(host.calls()[2].1, json!({ "pos": 13 }));
  }

  #[tokio::test]
  async fn test_install_rejects_conflicting_bindings() {
    let bus = Arc::new(KeyEventBus::new());
    let target: Arc<dyn Activate> = Arc::new(Controls::default());
    let host = Arc::new(RecordingHost::new());

    let keymap = Keymap {
      api_version: ApiVersion::V2,
      bindings: vec![
        KeymapEntry::new(KeyCombination::new("Space"), KeyAction::PlayPause),
        KeymapEntry::new(KeyCombination::new("Space"), KeyAction::Shuffle),
      ],
    };
    let result = keymap.install(
      bus.clone(),
      Arc::new(ManualScheduler::new()),
      Arc::downgrade(&target),
      host.clone(),
      Handle::current(),
    );

    assert!(matches!(result, Err(ConfigError::Conflict { first: 0, second: 1, .. })));
    assert_eq!(bus.listener_count(), 0);
    bus.dispatch(&mut KeyEvent::new("Space"));
    assert!(host.calls().is_empty());
  }
}
