//! Playlists and the request shapes used to create them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::song::UploadedFile;

/// A user or curation owned playlist.
///
/// `songs` never contains the same id twice. `follows` tracks how many users
/// currently follow the playlist and is only changed by atomic store updates.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayList {
    pub id: String,
    pub owner_id: Option<String>,
    pub name: String,
    pub photo_url: String,
    pub songs: Vec<String>,
    pub follows: i64,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `playlists` table; songs are joined in separately.
#[derive(FromRow, Debug, Clone)]
pub struct PlayListRow {
    pub id: String,
    pub owner_id: Option<String>,
    pub name: String,
    pub photo_url: String,
    pub follows: i64,
    pub created_at: DateTime<Utc>,
}

impl PlayListRow {
    pub fn with_songs(self, songs: Vec<String>) -> PlayList {
        PlayList {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            photo_url: self.photo_url,
            songs,
            follows: self.follows,
            created_at: self.created_at,
        }
    }
}

/// Input of `createPlayList`.
#[derive(Debug, Clone, Default)]
pub struct NewPlayList {
    pub owner_id: Option<String>,
    pub name: String,
    pub photo: Option<UploadedFile>,
    pub songs: Vec<String>,
}

/// JSON body of `POST /users/{id}/playlists`.
#[derive(Deserialize, Debug, Clone)]
pub struct EmptyPlayListReq {
    pub name: String,
}

/// Result of adding a song reference to a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddSongOutcome {
    Added,
    AlreadyPresent,
}
