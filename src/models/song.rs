//! A song in the catalog and the edits it accepts after upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An uploaded song.
///
/// `file_name` and `title` are unique across the catalog. Apart from
/// `play_count` and the `title`/`artist` edits the record never changes
/// after creation.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,

    /// Key of the audio payload in the audio bucket.
    pub file_name: String,

    pub title: String,

    pub artist: String,

    pub genre: String,

    /// Playable duration formatted as `M:SS`.
    pub time: String,

    /// Public URL of the cover image, empty when none was uploaded.
    pub photo_url: String,

    /// Public URL of the audio payload.
    pub song_url: String,

    /// Number of recorded playbacks. Only ever incremented.
    pub play_count: i64,

    pub created_at: DateTime<Utc>,
}

/// Partial update accepted by `PUT /songs/{id}`.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct SongEdit {
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl SongEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.artist.is_none()
    }
}

/// Validated fields of a song upload, before any blob is written.
#[derive(Debug, Clone)]
pub struct NewSong {
    pub file_name: String,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub audio_content_type: Option<String>,
    pub photo: Option<UploadedFile>,
}

/// A file part received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: bytes::Bytes,
}
