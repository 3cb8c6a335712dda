//! SQLite repositories for songs, playlists, users, curated slots and
//! assets.
//!
//! Invariants that must hold across service instances live here rather than
//! in the services: uniqueness through unique indexes, set membership
//! through composite primary keys with `INSERT OR IGNORE`, counters through
//! in-place `SET x = x + 1` updates. Follow edges and follower counters are
//! written in one transaction.

use crate::models::{
    asset::{GlobalPodcasts, Image},
    curated::{CuratedSlot, GlobalPlayLists},
    playlist::{AddSongOutcome, PlayList, PlayListRow},
    song::{Song, SongEdit},
    user::{User, UserRow},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[async_trait]
pub trait SongRepository: Send + Sync {
    async fn find_song(&self, id: &str) -> CatalogResult<Option<Song>>;

    /// All songs in upload order.
    async fn list_songs(&self) -> CatalogResult<Vec<Song>>;

    async fn song_exists_by_file_name(&self, file_name: &str) -> CatalogResult<bool>;

    async fn song_exists_by_title(&self, title: &str) -> CatalogResult<bool>;

    /// Hold `file_name` and `title` for an upload in flight. Returns false
    /// when a song or another upload already uses either of them.
    async fn claim_song_names(&self, file_name: &str, title: &str) -> CatalogResult<bool>;

    /// Drop the claim on `file_name`, if any.
    async fn release_song_names(&self, file_name: &str) -> CatalogResult<()>;

    /// Drop every claim. Only safe while no upload is running.
    async fn clear_song_claims(&self) -> CatalogResult<u64>;

    /// Insert a new song and drop the claim on its file name. A duplicate
    /// file name or title is a `Conflict`.
    async fn insert_song(&self, song: &Song) -> CatalogResult<()>;

    /// Apply a title/artist edit. Returns `None` when the song is missing.
    async fn update_song(&self, id: &str, edit: &SongEdit) -> CatalogResult<Option<Song>>;

    /// Atomically add one to the play count. Returns false when missing.
    async fn increment_play_count(&self, id: &str) -> CatalogResult<bool>;

    /// Ids of songs whose genre equals `genre` exactly, in upload order.
    async fn song_ids_by_genre(&self, genre: &str) -> CatalogResult<Vec<String>>;
}

#[async_trait]
pub trait PlayListRepository: Send + Sync {
    async fn find_playlist(&self, id: &str) -> CatalogResult<Option<PlayList>>;

    /// All playlists in creation order.
    async fn list_playlists(&self) -> CatalogResult<Vec<PlayList>>;

    /// Insert a playlist with its song references. Duplicate references
    /// collapse to the first occurrence.
    async fn insert_playlist(&self, playlist: &PlayList) -> CatalogResult<()>;

    async fn delete_playlist(&self, id: &str) -> CatalogResult<bool>;

    /// Append a song reference unless already present. When the playlist has
    /// no photo yet it adopts `song_photo_url` in the same write.
    async fn add_song_to_playlist(
        &self,
        playlist_id: &str,
        song_id: &str,
        song_photo_url: &str,
    ) -> CatalogResult<AddSongOutcome>;

    /// Replace the whole song list. Returns false when the playlist is missing.
    async fn replace_playlist_songs(&self, id: &str, songs: &[String]) -> CatalogResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: &str) -> CatalogResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> CatalogResult<Option<User>>;

    async fn list_users(&self) -> CatalogResult<Vec<User>>;

    /// Insert a user. A duplicate email is a `Conflict`.
    async fn insert_user(&self, user: &User) -> CatalogResult<()>;

    /// Add the follow edge and bump the follower counter, both or neither.
    /// Returns false when the edge already existed (nothing changes).
    async fn follow_playlist(&self, user_id: &str, playlist_id: &str) -> CatalogResult<bool>;

    /// Remove the follow edge and, only if it existed, decrement the
    /// follower counter (never below zero).
    async fn unfollow_playlist(&self, user_id: &str, playlist_id: &str) -> CatalogResult<bool>;

    async fn is_following(&self, user_id: &str, playlist_id: &str) -> CatalogResult<bool>;

    async fn like_song(&self, user_id: &str, song_id: &str) -> CatalogResult<bool>;

    async fn unlike_song(&self, user_id: &str, song_id: &str) -> CatalogResult<bool>;
}

#[async_trait]
pub trait CuratedRepository: Send + Sync {
    async fn curated_slot(&self, slot: CuratedSlot) -> CatalogResult<Option<GlobalPlayLists>>;

    async fn list_curated(&self) -> CatalogResult<Vec<GlobalPlayLists>>;

    /// Overwrite the slot's references. Returns false when the slot row is
    /// missing.
    async fn replace_curated(&self, slot: CuratedSlot, playlist_ids: &[String])
    -> CatalogResult<bool>;
}

#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn list_images(&self) -> CatalogResult<Vec<Image>>;

    async fn find_image(&self, id: &str) -> CatalogResult<Option<Image>>;

    async fn insert_image(&self, image: &Image) -> CatalogResult<()>;

    async fn delete_image(&self, id: &str) -> CatalogResult<bool>;

    async fn list_podcasts(&self) -> CatalogResult<Vec<GlobalPodcasts>>;

    async fn insert_podcast(&self, podcasts: &GlobalPodcasts) -> CatalogResult<()>;
}

/// Combined catalog store.
#[async_trait]
pub trait CatalogStore:
    SongRepository + PlayListRepository + UserRepository + CuratedRepository + AssetRepository
{
    /// Check connectivity.
    async fn ping(&self) -> CatalogResult<()>;
}

/// SQLite-backed catalog store.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

const SONG_COLUMNS: &str = "id, file_name, title, artist, genre, time, photo_url, song_url, \
                            play_count, created_at";
const PLAYLIST_COLUMNS: &str = "id, owner_id, name, photo_url, follows, created_at";

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn playlist_song_ids(&self, playlist_id: &str) -> CatalogResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT song_id FROM playlist_songs WHERE playlist_id = ? ORDER BY rowid",
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn load_user(&self, row: UserRow) -> CatalogResult<User> {
        let play_lists = sqlx::query_scalar::<_, String>(
            "SELECT playlist_id FROM user_playlists WHERE user_id = ? ORDER BY rowid",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;
        let liked_songs = sqlx::query_scalar::<_, String>(
            "SELECT song_id FROM user_liked_songs WHERE user_id = ? ORDER BY rowid",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(row.with_edges(play_lists, liked_songs))
    }

    async fn slot_entries(&self, slot: &str) -> CatalogResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT playlist_id FROM curated_slot_entries WHERE slot = ? ORDER BY position",
        )
        .bind(slot)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn user_exists(&self, user_id: &str) -> CatalogResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

async fn insert_song_refs(
    tx: &mut Transaction<'_, Sqlite>,
    playlist_id: &str,
    songs: &[String],
) -> CatalogResult<()> {
    for song_id in songs {
        sqlx::query("INSERT OR IGNORE INTO playlist_songs (playlist_id, song_id) VALUES (?, ?)")
            .bind(playlist_id)
            .bind(song_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl SongRepository for SqliteCatalog {
    async fn find_song(&self, id: &str) -> CatalogResult<Option<Song>> {
        let song = sqlx::query_as::<_, Song>(&format!(
            "SELECT {SONG_COLUMNS} FROM songs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(song)
    }

    async fn list_songs(&self) -> CatalogResult<Vec<Song>> {
        let songs = sqlx::query_as::<_, Song>(&format!(
            "SELECT {SONG_COLUMNS} FROM songs ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(songs)
    }

    async fn song_exists_by_file_name(&self, file_name: &str) -> CatalogResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM songs WHERE file_name = ?")
            .bind(file_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn song_exists_by_title(&self, title: &str) -> CatalogResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM songs WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn claim_song_names(&self, file_name: &str, title: &str) -> CatalogResult<bool> {
        // One statement, so the check and the claim happen under the same
        // write lock.
        let result = sqlx::query(
            "INSERT INTO song_claims (file_name, title, claimed_at)
             SELECT ?, ?, ?
             WHERE NOT EXISTS (SELECT 1 FROM songs WHERE file_name = ? OR title = ?)",
        )
        .bind(file_name)
        .bind(title)
        .bind(Utc::now())
        .bind(file_name)
        .bind(title)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn release_song_names(&self, file_name: &str) -> CatalogResult<()> {
        sqlx::query("DELETE FROM song_claims WHERE file_name = ?")
            .bind(file_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_song_claims(&self) -> CatalogResult<u64> {
        let done = sqlx::query("DELETE FROM song_claims")
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn insert_song(&self, song: &Song) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO songs (id, file_name, title, artist, genre, time, photo_url, song_url,
                                play_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&song.id)
        .bind(&song.file_name)
        .bind(&song.title)
        .bind(&song.artist)
        .bind(&song.genre)
        .bind(&song.time)
        .bind(&song.photo_url)
        .bind(&song.song_url)
        .bind(song.play_count)
        .bind(song.created_at)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(CatalogError::Conflict("taken".into()));
            }
            Err(err) => return Err(err.into()),
        }

        sqlx::query("DELETE FROM song_claims WHERE file_name = ?")
            .bind(&song.file_name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_song(&self, id: &str, edit: &SongEdit) -> CatalogResult<Option<Song>> {
        let result = sqlx::query(
            "UPDATE songs SET title = COALESCE(?, title), artist = COALESCE(?, artist)
             WHERE id = ?",
        )
        .bind(edit.title.as_deref())
        .bind(edit.artist.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(None),
            Ok(_) => self.find_song(id).await,
            Err(err) if is_unique_violation(&err) => Err(CatalogError::Conflict("taken".into())),
            Err(err) => Err(err.into()),
        }
    }

    async fn increment_play_count(&self, id: &str) -> CatalogResult<bool> {
        let done = sqlx::query("UPDATE songs SET play_count = play_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn song_ids_by_genre(&self, genre: &str) -> CatalogResult<Vec<String>> {
        let ids =
            sqlx::query_scalar::<_, String>("SELECT id FROM songs WHERE genre = ? ORDER BY rowid")
                .bind(genre)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }
}

#[async_trait]
impl PlayListRepository for SqliteCatalog {
    async fn find_playlist(&self, id: &str) -> CatalogResult<Option<PlayList>> {
        let row = sqlx::query_as::<_, PlayListRow>(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let songs = self.playlist_song_ids(&row.id).await?;
                Ok(Some(row.with_songs(songs)))
            }
            None => Ok(None),
        }
    }

    async fn list_playlists(&self) -> CatalogResult<Vec<PlayList>> {
        let rows = sqlx::query_as::<_, PlayListRow>(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        let refs = sqlx::query_as::<_, (String, String)>(
            "SELECT playlist_id, song_id FROM playlist_songs ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut songs_by_playlist: HashMap<String, Vec<String>> = HashMap::new();
        for (playlist_id, song_id) in refs {
            songs_by_playlist.entry(playlist_id).or_default().push(song_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let songs = songs_by_playlist.remove(&row.id).unwrap_or_default();
                row.with_songs(songs)
            })
            .collect())
    }

    async fn insert_playlist(&self, playlist: &PlayList) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO playlists (id, owner_id, name, photo_url, follows, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&playlist.id)
        .bind(playlist.owner_id.as_deref())
        .bind(&playlist.name)
        .bind(&playlist.photo_url)
        .bind(playlist.follows)
        .bind(playlist.created_at)
        .execute(&mut *tx)
        .await?;
        insert_song_refs(&mut tx, &playlist.id, &playlist.songs).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_playlist(&self, id: &str) -> CatalogResult<bool> {
        let done = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn add_song_to_playlist(
        &self,
        playlist_id: &str,
        song_id: &str,
        song_photo_url: &str,
    ) -> CatalogResult<AddSongOutcome> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO playlist_songs (playlist_id, song_id) VALUES (?, ?)",
        )
        .bind(playlist_id)
        .bind(song_id)
        .execute(&mut *tx)
        .await
        .map_err(|err| not_found_on_fk(err, "playlist", playlist_id))?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(AddSongOutcome::AlreadyPresent);
        }

        sqlx::query("UPDATE playlists SET photo_url = ? WHERE id = ? AND TRIM(photo_url) = ''")
            .bind(song_photo_url)
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(AddSongOutcome::Added)
    }

    async fn replace_playlist_songs(&self, id: &str, songs: &[String]) -> CatalogResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let exists = sqlx::query_scalar::<_, i64>("SELECT 1 FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            tx.rollback().await?;
            return Ok(false);
        }
        insert_song_refs(&mut tx, id, songs).await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl UserRepository for SqliteCatalog {
    async fn find_user(&self, id: &str) -> CatalogResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, name, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> CatalogResult<Option<User>> {
        let row =
            sqlx::query_as::<_, UserRow>("SELECT id, name, email FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> CatalogResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT id, name, email FROM users ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.load_user(row).await?);
        }
        Ok(users)
    }

    async fn insert_user(&self, user: &User) -> CatalogResult<()> {
        let result = sqlx::query("INSERT INTO users (id, name, email) VALUES (?, ?, ?)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(CatalogError::Conflict(format!(
                "email `{}` already registered",
                user.email
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn follow_playlist(&self, user_id: &str, playlist_id: &str) -> CatalogResult<bool> {
        // The edge insert comes first so the transaction takes the write lock
        // before anything is read.
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO user_playlists (user_id, playlist_id) VALUES (?, ?)",
        )
        .bind(user_id)
        .bind(playlist_id)
        .execute(&mut *tx)
        .await
        .map_err(|err| not_found_on_fk(err, "user or playlist", playlist_id))?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE playlists SET follows = follows + 1 WHERE id = ?")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn unfollow_playlist(&self, user_id: &str, playlist_id: &str) -> CatalogResult<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM user_playlists WHERE user_id = ? AND playlist_id = ?")
            .bind(user_id)
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;

        if removed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE playlists SET follows = MAX(follows - 1, 0) WHERE id = ?")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn is_following(&self, user_id: &str, playlist_id: &str) -> CatalogResult<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM user_playlists WHERE user_id = ? AND playlist_id = ?",
        )
        .bind(user_id)
        .bind(playlist_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn like_song(&self, user_id: &str, song_id: &str) -> CatalogResult<bool> {
        let done =
            sqlx::query("INSERT OR IGNORE INTO user_liked_songs (user_id, song_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(song_id)
                .execute(&self.pool)
                .await
                .map_err(|err| not_found_on_fk(err, "user", user_id))?;
        Ok(done.rows_affected() > 0)
    }

    async fn unlike_song(&self, user_id: &str, song_id: &str) -> CatalogResult<bool> {
        if !self.user_exists(user_id).await? {
            return Err(CatalogError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            });
        }
        let done = sqlx::query("DELETE FROM user_liked_songs WHERE user_id = ? AND song_id = ?")
            .bind(user_id)
            .bind(song_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl CuratedRepository for SqliteCatalog {
    async fn curated_slot(&self, slot: CuratedSlot) -> CatalogResult<Option<GlobalPlayLists>> {
        let title = sqlx::query_scalar::<_, String>("SELECT title FROM curated_slots WHERE slot = ?")
            .bind(slot.key())
            .fetch_optional(&self.pool)
            .await?;
        match title {
            Some(title) => Ok(Some(GlobalPlayLists {
                slot,
                title,
                play_lists: self.slot_entries(slot.key()).await?,
            })),
            None => Ok(None),
        }
    }

    async fn list_curated(&self) -> CatalogResult<Vec<GlobalPlayLists>> {
        let mut slots = Vec::new();
        for slot in CuratedSlot::ALL {
            if let Some(curated) = self.curated_slot(slot).await? {
                slots.push(curated);
            }
        }
        Ok(slots)
    }

    async fn replace_curated(
        &self,
        slot: CuratedSlot,
        playlist_ids: &[String],
    ) -> CatalogResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM curated_slot_entries WHERE slot = ?")
            .bind(slot.key())
            .execute(&mut *tx)
            .await?;
        let exists = sqlx::query_scalar::<_, i64>("SELECT 1 FROM curated_slots WHERE slot = ?")
            .bind(slot.key())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            tx.rollback().await?;
            return Ok(false);
        }
        for (position, playlist_id) in playlist_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO curated_slot_entries (slot, position, playlist_id) VALUES (?, ?, ?)",
            )
            .bind(slot.key())
            .bind(position as i64)
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl AssetRepository for SqliteCatalog {
    async fn list_images(&self) -> CatalogResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>("SELECT id, name, url FROM images ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        Ok(images)
    }

    async fn find_image(&self, id: &str) -> CatalogResult<Option<Image>> {
        let image = sqlx::query_as::<_, Image>("SELECT id, name, url FROM images WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(image)
    }

    async fn insert_image(&self, image: &Image) -> CatalogResult<()> {
        sqlx::query("INSERT INTO images (id, name, url) VALUES (?, ?, ?)")
            .bind(&image.id)
            .bind(&image.name)
            .bind(&image.url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_image(&self, id: &str) -> CatalogResult<bool> {
        let done = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_podcasts(&self) -> CatalogResult<Vec<GlobalPodcasts>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT id, title FROM podcasts ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut podcasts = Vec::with_capacity(rows.len());
        for (id, title) in rows {
            let play_lists = sqlx::query_scalar::<_, String>(
                "SELECT playlist_id FROM podcast_playlists WHERE podcast_id = ? ORDER BY position",
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await?;
            podcasts.push(GlobalPodcasts {
                id,
                title,
                play_lists,
            });
        }
        Ok(podcasts)
    }

    async fn insert_podcast(&self, podcasts: &GlobalPodcasts) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO podcasts (id, title) VALUES (?, ?)")
            .bind(&podcasts.id)
            .bind(&podcasts.title)
            .execute(&mut *tx)
            .await?;
        for (position, playlist_id) in podcasts.play_lists.iter().enumerate() {
            sqlx::query(
                "INSERT INTO podcast_playlists (podcast_id, position, playlist_id) VALUES (?, ?, ?)",
            )
            .bind(&podcasts.id)
            .bind(position as i64)
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn ping(&self) -> CatalogResult<()> {
        let one = sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        if one != 1 {
            return Err(CatalogError::Sqlx(sqlx::Error::Protocol(format!(
                "unexpected ping result: {}",
                one
            ))));
        }
        Ok(())
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Map a foreign key failure to `NotFound`; pass everything else through.
fn not_found_on_fk(err: sqlx::Error, entity: &'static str, id: &str) -> CatalogError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            CatalogError::NotFound {
                entity,
                id: id.to_string(),
            }
        }
        other => CatalogError::Sqlx(other),
    }
}
