//! Validates and persists songs, playlists, users and images, touching the
//! blob store only after catalog checks pass.
//!
//! Uploads follow one rule: a request that fails never leaves a catalog
//! record without its blobs, and never leaves blobs it wrote behind.

use crate::{
    errors::{ServiceError, ServiceResult},
    models::{
        asset::{GlobalPodcasts, Image, NewPodcasts},
        playlist::{NewPlayList, PlayList},
        song::{NewSong, Song, SongEdit, UploadedFile},
        user::{LoginReq, User},
    },
    services::{
        blob_store::{BlobStore, StorageError},
        catalog_store::{CatalogError, CatalogStore},
        duration,
    },
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Names of the two logical buckets.
#[derive(Debug, Clone)]
pub struct Buckets {
    pub audio: String,
    pub images: String,
}

const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

#[derive(Clone)]
pub struct MediaCatalog {
    catalog: Arc<dyn CatalogStore>,
    blobs: Arc<dyn BlobStore>,
    buckets: Buckets,
}

impl MediaCatalog {
    pub fn new(catalog: Arc<dyn CatalogStore>, blobs: Arc<dyn BlobStore>, buckets: Buckets) -> Self {
        Self {
            catalog,
            blobs,
            buckets,
        }
    }

    // ---- songs -----------------------------------------------------------

    /// Validate, measure and upload a new song.
    ///
    /// 1. Conflict if the file name or title is taken. The names are then
    ///    claimed in the catalog, so a concurrent upload of the same names
    ///    stops here too, before any blob write.
    /// 2. Decode error if the payload has no readable duration.
    /// 3. Upload photo then audio, cleaning up on failure.
    /// 4. Insert the record with a zero play count, dropping the claim.
    pub async fn create_song(&self, new: NewSong, audio: UploadedFile) -> ServiceResult<Song> {
        if new.file_name.trim().is_empty() || new.title.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "fileName and title are required".into(),
            ));
        }
        if self.catalog.song_exists_by_file_name(&new.file_name).await?
            || self.catalog.song_exists_by_title(&new.title).await?
        {
            return Err(ServiceError::Conflict("taken".into()));
        }
        if !self
            .catalog
            .claim_song_names(&new.file_name, &new.title)
            .await?
        {
            return Err(ServiceError::Conflict("taken".into()));
        }

        let file_name = new.file_name.clone();
        let result = self.upload_claimed_song(new, audio).await;
        if result.is_err() {
            if let Err(err) = self.catalog.release_song_names(&file_name).await {
                error!(%file_name, error = %err, "failed to release song name claim");
            }
        }
        result
    }

    /// Steps 2 to 4 of [`MediaCatalog::create_song`]. The caller holds the
    /// claim on `new.file_name`, so the audio key belongs to this request
    /// alone and may be removed on failure.
    async fn upload_claimed_song(&self, new: NewSong, audio: UploadedFile) -> ServiceResult<Song> {
        match self.blobs.head(&self.buckets.audio, &new.file_name).await {
            Ok(_) => return Err(ServiceError::Conflict("taken".into())),
            Err(StorageError::ObjectNotFound { .. }) => {}
            Err(err) => return Err(err.into()),
        }

        let playable = duration::extract_duration_blocking(audio.bytes.clone()).await?;
        let time = duration::format_duration(playable);

        let id = Uuid::new_v4().to_string();
        let mut written: Vec<(String, String)> = Vec::new();

        let photo_url = match &new.photo {
            Some(photo) => {
                let key = asset_key(&id, &photo.file_name);
                self.blobs
                    .put(
                        &self.buckets.images,
                        &key,
                        photo.content_type.clone(),
                        photo.bytes.clone(),
                    )
                    .await?;
                written.push((self.buckets.images.clone(), key.clone()));
                self.blobs.public_url(&self.buckets.images, &key)
            }
            None => String::new(),
        };

        let content_type = new
            .audio_content_type
            .clone()
            .or_else(|| audio.content_type.clone())
            .unwrap_or_else(|| DEFAULT_AUDIO_CONTENT_TYPE.to_string());
        if let Err(err) = self
            .blobs
            .put(&self.buckets.audio, &new.file_name, Some(content_type), audio.bytes)
            .await
        {
            self.remove_blobs(&written).await;
            return Err(err.into());
        }
        written.push((self.buckets.audio.clone(), new.file_name.clone()));

        let song = Song {
            id,
            song_url: self.blobs.public_url(&self.buckets.audio, &new.file_name),
            file_name: new.file_name,
            title: new.title,
            artist: new.artist,
            genre: new.genre,
            time,
            photo_url,
            play_count: 0,
            created_at: Utc::now(),
        };

        if let Err(err) = self.catalog.insert_song(&song).await {
            self.remove_blobs(&written).await;
            return Err(err.into());
        }

        info!(song_id = %song.id, file_name = %song.file_name, time = %song.time, "song created");
        Ok(song)
    }

    pub async fn get_song(&self, id: &str) -> ServiceResult<Song> {
        self.catalog
            .find_song(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("song", id))
    }

    pub async fn list_songs(&self) -> ServiceResult<Vec<Song>> {
        Ok(self.catalog.list_songs().await?)
    }

    pub async fn song_ids_by_genre(&self, genre: &str) -> ServiceResult<Vec<String>> {
        Ok(self.catalog.song_ids_by_genre(genre).await?)
    }

    /// Edit title and/or artist. A title already used by another song is a
    /// conflict.
    pub async fn update_song(&self, id: &str, edit: SongEdit) -> ServiceResult<Song> {
        if edit.is_empty() {
            return self.get_song(id).await;
        }
        if edit.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ServiceError::BadRequest("title must not be empty".into()));
        }
        self.catalog
            .update_song(id, &edit)
            .await?
            .ok_or_else(|| ServiceError::not_found("song", id))
    }

    pub async fn increment_play_count(&self, id: &str) -> ServiceResult<()> {
        if self.catalog.increment_play_count(id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("song", id))
        }
    }

    // ---- playlists -------------------------------------------------------

    /// Insert a playlist with `follows = 0`.
    ///
    /// Song ids must exist; duplicates collapse to their first occurrence.
    /// Without a photo the playlist shows the first song's photo, or nothing
    /// until a song is added.
    pub async fn create_playlist(&self, new: NewPlayList) -> ServiceResult<PlayList> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::BadRequest("playlist name is required".into()));
        }
        if let Some(owner_id) = &new.owner_id {
            if self.catalog.find_user(owner_id).await?.is_none() {
                return Err(ServiceError::not_found("user", owner_id.clone()));
            }
        }

        let mut songs: Vec<String> = Vec::with_capacity(new.songs.len());
        let mut first_photo: Option<String> = None;
        for song_id in new.songs {
            if songs.contains(&song_id) {
                continue;
            }
            let song = self
                .catalog
                .find_song(&song_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("song", song_id.clone()))?;
            if first_photo.is_none() {
                first_photo = Some(song.photo_url);
            }
            songs.push(song_id);
        }

        let id = Uuid::new_v4().to_string();
        let mut written = Vec::new();
        let photo_url = match new.photo {
            Some(photo) => {
                let key = asset_key(&id, &photo.file_name);
                self.blobs
                    .put(&self.buckets.images, &key, photo.content_type, photo.bytes)
                    .await?;
                written.push((self.buckets.images.clone(), key.clone()));
                self.blobs.public_url(&self.buckets.images, &key)
            }
            None => first_photo.unwrap_or_default(),
        };

        let playlist = PlayList {
            id,
            owner_id: new.owner_id,
            name: new.name,
            photo_url,
            songs,
            follows: 0,
            created_at: Utc::now(),
        };
        if let Err(err) = self.catalog.insert_playlist(&playlist).await {
            self.remove_blobs(&written).await;
            return Err(err.into());
        }
        info!(playlist_id = %playlist.id, songs = playlist.songs.len(), "playlist created");
        Ok(playlist)
    }

    pub async fn get_playlist(&self, id: &str) -> ServiceResult<PlayList> {
        self.catalog
            .find_playlist(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("playlist", id))
    }

    pub async fn list_playlists(&self) -> ServiceResult<Vec<PlayList>> {
        Ok(self.catalog.list_playlists().await?)
    }

    /// Songs of the playlist in order, skipping ids that no longer resolve.
    pub async fn playlist_songs(&self, id: &str) -> ServiceResult<Vec<Song>> {
        let playlist = self.get_playlist(id).await?;
        self.resolve_songs(&playlist.songs).await
    }

    /// Sum of the play counts of the playlist's songs.
    pub async fn playlist_views(&self, id: &str) -> ServiceResult<i64> {
        let songs = self.playlist_songs(id).await?;
        Ok(songs.iter().map(|s| s.play_count).sum())
    }

    /// Delete a playlist on behalf of `user_id`, who must own it.
    pub async fn delete_playlist(&self, id: &str, user_id: &str) -> ServiceResult<()> {
        let playlist = self.get_playlist(id).await?;
        match playlist.owner_id.as_deref() {
            None => Err(ServiceError::not_found("playlist", id)),
            Some(owner) if owner != user_id => Err(ServiceError::Forbidden(
                "only the owner may delete a playlist".into(),
            )),
            Some(_) => {
                if !self.catalog.delete_playlist(id).await? {
                    return Err(ServiceError::not_found("playlist", id));
                }
                info!(playlist_id = %id, "playlist deleted");
                Ok(())
            }
        }
    }

    // ---- users -----------------------------------------------------------

    /// Return the user registered under the login's email, creating one on
    /// first login.
    pub async fn login(&self, req: LoginReq) -> ServiceResult<User> {
        let email = req.email.trim().to_string();
        if email.is_empty() {
            return Err(ServiceError::BadRequest("email is required".into()));
        }
        if let Some(user) = self.catalog.find_user_by_email(&email).await? {
            return Ok(user);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            email,
            play_lists: Vec::new(),
            liked_songs: Vec::new(),
        };
        match self.catalog.insert_user(&user).await {
            Ok(()) => {
                info!(user_id = %user.id, "user created on first login");
                Ok(user)
            }
            // Lost a race with a concurrent first login; the winner's row stands.
            Err(CatalogError::Conflict(_)) => self
                .catalog
                .find_user_by_email(&user.email)
                .await?
                .ok_or_else(|| ServiceError::not_found("user", user.email)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_user(&self, id: &str) -> ServiceResult<User> {
        self.catalog
            .find_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", id))
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.catalog.list_users().await?)
    }

    pub async fn liked_songs(&self, user_id: &str) -> ServiceResult<Vec<Song>> {
        let user = self.get_user(user_id).await?;
        self.resolve_songs(&user.liked_songs).await
    }

    // ---- images and podcasts ---------------------------------------------

    pub async fn upload_image(&self, name: String, file: UploadedFile) -> ServiceResult<Image> {
        let id = Uuid::new_v4().to_string();
        let key = asset_key(&id, &file.file_name);
        self.blobs
            .put(&self.buckets.images, &key, file.content_type, file.bytes)
            .await?;
        let image = Image {
            url: self.blobs.public_url(&self.buckets.images, &key),
            id,
            name,
        };
        if let Err(err) = self.catalog.insert_image(&image).await {
            self.remove_blobs(&[(self.buckets.images.clone(), key)]).await;
            return Err(err.into());
        }
        Ok(image)
    }

    pub async fn list_images(&self) -> ServiceResult<Vec<Image>> {
        Ok(self.catalog.list_images().await?)
    }

    pub async fn get_image(&self, id: &str) -> ServiceResult<Image> {
        self.catalog
            .find_image(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("image", id))
    }

    pub async fn delete_image(&self, id: &str) -> ServiceResult<()> {
        if self.catalog.delete_image(id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("image", id))
        }
    }

    pub async fn list_podcasts(&self) -> ServiceResult<Vec<GlobalPodcasts>> {
        Ok(self.catalog.list_podcasts().await?)
    }

    pub async fn create_podcasts(&self, new: NewPodcasts) -> ServiceResult<GlobalPodcasts> {
        let podcasts = GlobalPodcasts {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            play_lists: new.play_lists,
        };
        self.catalog.insert_podcast(&podcasts).await?;
        Ok(podcasts)
    }

    // ---- helpers ---------------------------------------------------------

    async fn resolve_songs(&self, ids: &[String]) -> ServiceResult<Vec<Song>> {
        let mut songs = Vec::with_capacity(ids.len());
        for id in ids {
            match self.catalog.find_song(id).await? {
                Some(song) => songs.push(song),
                None => warn!(song_id = %id, "skipping stale song reference"),
            }
        }
        Ok(songs)
    }

    /// Best-effort removal of blobs written by a request that failed later.
    async fn remove_blobs(&self, written: &[(String, String)]) {
        for (bucket, key) in written {
            if let Err(err) = self.blobs.delete(bucket, key).await {
                error!(%bucket, %key, error = %err, "failed to remove blob of aborted upload");
            }
        }
    }
}

/// Image key scoped by the owning record, so two uploads of `cover.jpg`
/// never overwrite each other.
fn asset_key(owner_id: &str, file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let name = if name.is_empty() || name.contains("..") { "image" } else { name };
    format!("{}-{}", owner_id, name)
}
