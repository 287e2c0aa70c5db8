//! Typed client for the host's player commands.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::RemoteError;
use super::protocol::{ApiVersion, RemoteCommand};

/// Transport that delivers a named call to the host and returns its answer.
///
/// Commands without a result answer `Value::Null`.
pub trait Invoke: Send + Sync {
  fn invoke(
    &self,
    command: &'static str,
    args: Value,
  ) -> impl Future<Output = Result<Value, RemoteError>> + Send;
}

impl<T: Invoke> Invoke for Arc<T> {
  fn invoke(
    &self,
    command: &'static str,
    args: Value,
  ) -> impl Future<Output = Result<Value, RemoteError>> + Send {
    (**self).invoke(command, args)
  }
}

/// Player controls forwarded to the host process.
pub struct PlayerRemote<I> {
  invoker: I,
  version: ApiVersion,
}

impl<I: Invoke> PlayerRemote<I> {
  pub fn new(invoker: I, version: ApiVersion) -> Self {
    Self { invoker, version }
  }

  pub fn version(&self) -> ApiVersion {
    self.version
  }

  pub fn invoker(&self) -> &I {
    &self.invoker
  }

  /// Send a raw command.
  pub async fn call(&self, command: RemoteCommand) -> Result<Value, RemoteError> {
    let name = command.name(self.version).ok_or(RemoteError::Unsupported {
      command: command.label(),
      version: self.version,
    })?;
    let args = command.args();
    log::debug!("Invoking {} with {}", name, args);
    self.invoker.invoke(name, args).await
  }

  async fn call_as<T: DeserializeOwned>(&self, command: RemoteCommand) -> Result<T, RemoteError> {
    let value = self.call(command).await?;
    Ok(serde_json::from_value(value)?)
  }

  pub async fn play_pause(&self) -> Result<(), RemoteError> {
    self.call(RemoteCommand::PlayPause).await?;
    Ok(())
  }

  /// Change volume by a signed delta (volume ranges 0.0 to 1.0).
  pub async fn adjust_volume(&self, by: f64) -> Result<(), RemoteError> {
    self.call(RemoteCommand::AdjustVolume { by }).await?;
    Ok(())
  }

  /// Seek to an absolute position in seconds.
  pub async fn seek_to(&self, pos: u64) -> Result<(), RemoteError> {
    self.call(RemoteCommand::SeekPosition { pos }).await?;
    Ok(())
  }

  /// Seek relative to the current position, stopping at the start of the song.
  /// Returns the position sought to.
  pub async fn seek_relative(&self, delta: i64) -> Result<u64, RemoteError> {
    let current = self.song_position().await?;
    let target = current.saturating_add_signed(delta);
    self.seek_to(target).await?;
    Ok(target)
  }

  /// Move through the queue by a signed offset.
  pub async fn skip(&self, to_index: i32) -> Result<(), RemoteError> {
    self.call(RemoteCommand::Skip { to_index }).await?;
    Ok(())
  }

  /// Current playback position in whole seconds.
  pub async fn song_position(&self) -> Result<u64, RemoteError> {
    self.call_as(RemoteCommand::SongPosition).await
  }

  /// A metadata field of the current song (`title`, `artist`, `duration`, ...).
  pub async fn current_song_info(&self, key: &str) -> Result<Value, RemoteError> {
    self
      .call(RemoteCommand::CurrentSongInfo {
        key: key.to_string(),
      })
      .await
  }

  /// Cover image paths for the queue, in queue order.
  pub async fn cover_queue(&self) -> Result<Vec<PathBuf>, RemoteError> {
    self.call_as(RemoteCommand::CoverQueue).await
  }

  pub async fn song_finished(&self) -> Result<bool, RemoteError> {
    self.call_as(RemoteCommand::SongFinished).await
  }

  pub async fn is_paused(&self) -> Result<bool, RemoteError> {
    self.call_as(RemoteCommand::SongPaused).await
  }

  pub async fn shuffle(&self) -> Result<(), RemoteError> {
    self.call(RemoteCommand::ShuffleQueue).await?;
    Ok(())
  }

  pub async fn repeat(&self) -> Result<bool, RemoteError> {
    self.call_as(RemoteCommand::Repeat).await
  }

  pub async fn toggle_repeat(&self) -> Result<(), RemoteError> {
    self.call(RemoteCommand::ToggleRepeat).await?;
    Ok(())
  }

  pub async fn album_playlists(&self) -> Result<Value, RemoteError> {
    self.call(RemoteCommand::AlbumPlaylists).await
  }

  pub async fn play_album_playlist(&self, album_id: &str) -> Result<(), RemoteError> {
    self
      .call(RemoteCommand::PlayAlbumPlaylist {
        album_id: album_id.to_string(),
      })
      .await?;
    Ok(())
  }

  /// Startup calls that let the host build its library and playlists.
  pub async fn bootstrap(&self) -> Result<(), RemoteError> {
    for command in [
      RemoteCommand::CreatePlaylists,
      RemoteCommand::CreatePlaylistTypes,
      RemoteCommand::AddMusic,
    ] {
      self.call(command).await?;
    }
    log::info!("Host library bootstrapped");
    Ok(())
  }
}
