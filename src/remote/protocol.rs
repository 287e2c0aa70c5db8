//! Host command names and argument records.
//!
//! The host has shipped two naming schemes. `V1` uses the original flat names
//! (`play_pause`, `get_song_position`), `V2` prefixes player operations with
//! `player_`. Argument keys are camelCase in both.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
  V1,
  #[default]
  V2,
}

impl fmt::Display for ApiVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiVersion::V1 => f.write_str("v1"),
      ApiVersion::V2 => f.write_str("v2"),
    }
  }
}

/// A call into the host process.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
  PlayPause,
  /// Signed volume delta; the host clamps to 0.0..=1.0.
  AdjustVolume { by: f64 },
  /// Absolute position in seconds.
  SeekPosition { pos: u64 },
  /// Move through the queue by a signed offset (`1` next, `-1` previous).
  /// The field and its wire key `toIndex` keep the host's naming.
  Skip { to_index: i32 },
  SongPosition,
  CurrentSongInfo { key: String },
  CoverQueue,
  /// `true` once the current song has finished (or nothing is loaded).
  SongFinished,
  SongPaused,
  ShuffleQueue,
  Repeat,
  ToggleRepeat,
  AlbumPlaylists,
  PlayAlbumPlaylist { album_id: String },
  CreatePlaylists,
  CreatePlaylistTypes,
  AddMusic,
}

impl RemoteCommand {
  /// Wire name for `version`, or `None` if that host has no such command.
  pub fn name(&self, version: ApiVersion) -> Option<&'static str> {
    use ApiVersion::*;
    use RemoteCommand::*;

    let name = match (self, version) {
      (PlayPause, V1) => "play_pause",
      (PlayPause, V2) => "player_play_or_pause",
      (AdjustVolume { .. }, V1) => "adjust_volume",
      (AdjustVolume { .. }, V2) => "player_adjust_volume",
      (SeekPosition { .. }, V1) => "seek_position",
      (SeekPosition { .. }, V2) => "player_seek_position",
      (Skip { .. }, V1) => "skip_music",
      (Skip { .. }, V2) => "player_skip",
      (SongPosition, V1) => "get_song_position",
      (SongPosition, V2) => "player_song_position",
      (CurrentSongInfo { .. }, V1) => "get_current_song_info",
      (CurrentSongInfo { .. }, V2) => "player_current_song_info",
      (CoverQueue, V1) => "get_queue_of_covers",
      (CoverQueue, V2) => "player_cover_path_queue",
      (SongFinished, V1) => "not_playing",
      (SongFinished, V2) => "player_song_finished",
      (SongPaused, V1) => return None,
      (SongPaused, V2) => "player_song_paused",
      (ShuffleQueue, V1) => "shuffle_music",
      (ShuffleQueue, V2) => "player_shuffle_queue",
      (Repeat, V1) => "get_repeat",
      (Repeat, V2) => "player_repeat",
      (ToggleRepeat, V1) => "toggle_repeat",
      (ToggleRepeat, V2) => "player_toggle_repeat",
      (AlbumPlaylists, _) => "get_album_playlists",
      (PlayAlbumPlaylist { .. }, _) => "play_album_playlist",
      (CreatePlaylists, _) => "create_playlists",
      (CreatePlaylistTypes, _) => "create_playlist_types",
      (AddMusic, _) => "add_music",
    };
    Some(name)
  }

  /// Stable identifier used in logs and errors, independent of version.
  pub fn label(&self) -> &'static str {
    use RemoteCommand::*;

    match self {
      PlayPause => "play_pause",
      AdjustVolume { .. } => "adjust_volume",
      SeekPosition { .. } => "seek_position",
      Skip { .. } => "skip",
      SongPosition => "song_position",
      CurrentSongInfo { .. } => "current_song_info",
      CoverQueue => "cover_queue",
      SongFinished => "song_finished",
      SongPaused => "song_paused",
      ShuffleQueue => "shuffle_queue",
      Repeat => "repeat",
      ToggleRepeat => "toggle_repeat",
      AlbumPlaylists => "album_playlists",
      PlayAlbumPlaylist { .. } => "play_album_playlist",
      CreatePlaylists => "create_playlists",
      CreatePlaylistTypes => "create_playlist_types",
      AddMusic => "add_music",
    }
  }

  /// Argument record sent with the call. Commands without arguments send `{}`.
  pub fn args(&self) -> Value {
    match self {
      RemoteCommand::AdjustVolume { by } => json!({ "by": by }),
      RemoteCommand::SeekPosition { pos } => json!({ "pos": pos }),
      RemoteCommand::Skip { to_index } => json!({ "toIndex": to_index }),
      RemoteCommand::CurrentSongInfo { key } => json!({ "key": key }),
      RemoteCommand::PlayAlbumPlaylist { album_id } => json!({ "albumId": album_id }),
      _ => Value::Object(Map::new()),
    }
  }
}
