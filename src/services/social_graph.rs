//! Follow and like edges between users, playlists and songs, plus the
//! follower counters derived from them.
//!
//! Existence of both ends is checked before any write, and the store applies
//! each edge together with its counter change, so a missing entity never
//! leaves a half-applied mutation behind.

use crate::{
    errors::{ServiceError, ServiceResult},
    models::playlist::AddSongOutcome,
    services::catalog_store::CatalogStore,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SocialGraph {
    catalog: Arc<dyn CatalogStore>,
}

impl SocialGraph {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    async fn require_user(&self, user_id: &str) -> ServiceResult<()> {
        match self.catalog.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("user", user_id)),
        }
    }

    async fn require_playlist(&self, playlist_id: &str) -> ServiceResult<()> {
        match self.catalog.find_playlist(playlist_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("playlist", playlist_id)),
        }
    }

    /// Follow a playlist. Returns false when the user already followed it,
    /// in which case the follower counter is left untouched.
    pub async fn follow(&self, user_id: &str, playlist_id: &str) -> ServiceResult<bool> {
        self.require_user(user_id).await?;
        self.require_playlist(playlist_id).await?;

        let added = self.catalog.follow_playlist(user_id, playlist_id).await?;
        if added {
            info!(%user_id, %playlist_id, "playlist followed");
        } else {
            debug!(%user_id, %playlist_id, "follow edge already present");
        }
        Ok(added)
    }

    /// Unfollow a playlist. The counter drops only when an edge was removed,
    /// and never below zero.
    pub async fn unfollow(&self, user_id: &str, playlist_id: &str) -> ServiceResult<bool> {
        self.require_user(user_id).await?;
        self.require_playlist(playlist_id).await?;

        let removed = self.catalog.unfollow_playlist(user_id, playlist_id).await?;
        if removed {
            info!(%user_id, %playlist_id, "playlist unfollowed");
        }
        Ok(removed)
    }

    pub async fn is_following(&self, user_id: &str, playlist_id: &str) -> ServiceResult<bool> {
        Ok(self.catalog.is_following(user_id, playlist_id).await?)
    }

    /// Current follower count of a playlist.
    pub async fn followers(&self, playlist_id: &str) -> ServiceResult<i64> {
        self.catalog
            .find_playlist(playlist_id)
            .await?
            .map(|playlist| playlist.follows)
            .ok_or_else(|| ServiceError::not_found("playlist", playlist_id))
    }

    /// Ids of the playlists a user follows, in follow order.
    pub async fn follows(&self, user_id: &str) -> ServiceResult<Vec<String>> {
        self.catalog
            .find_user(user_id)
            .await?
            .map(|user| user.play_lists)
            .ok_or_else(|| ServiceError::not_found("user", user_id))
    }

    pub async fn like(&self, user_id: &str, song_id: &str) -> ServiceResult<bool> {
        self.require_user(user_id).await?;
        if self.catalog.find_song(song_id).await?.is_none() {
            return Err(ServiceError::not_found("song", song_id));
        }
        Ok(self.catalog.like_song(user_id, song_id).await?)
    }

    /// Remove a like. Songs deleted since the like may still be unliked.
    pub async fn unlike(&self, user_id: &str, song_id: &str) -> ServiceResult<bool> {
        self.require_user(user_id).await?;
        Ok(self.catalog.unlike_song(user_id, song_id).await?)
    }

    /// Append a song to a playlist unless it is already there. A playlist
    /// without a photo adopts the song's photo.
    pub async fn add_song_to_playlist(
        &self,
        playlist_id: &str,
        song_id: &str,
    ) -> ServiceResult<AddSongOutcome> {
        self.require_playlist(playlist_id).await?;
        let song = self
            .catalog
            .find_song(song_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("song", song_id))?;

        let outcome = self
            .catalog
            .add_song_to_playlist(playlist_id, song_id, &song.photo_url)
            .await?;
        debug!(%playlist_id, %song_id, ?outcome, "add song to playlist");
        Ok(outcome)
    }
}
