//! Recomputes the curated global playlists from the live catalog.
//!
//! Both passes are idempotent: with no catalog writes in between, running a
//! pass twice stores the same result twice. Neither pass locks out
//! concurrent catalog writes; a song uploaded mid-run shows up on the next
//! run at the latest.

use crate::{
    errors::{ServiceError, ServiceResult},
    models::{
        curated::{CuratedSlot, GlobalPlayLists},
        playlist::PlayList,
    },
    services::catalog_store::CatalogStore,
};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Size of the most-followed slot.
pub const MOST_FOLLOWED_LIMIT: usize = 5;

/// Genre whose songs make up a genre-mixed playlist.
///
/// Genre-mixed playlists are named after the genre they collect, so the
/// label is the playlist name verbatim.
pub fn genre_label(playlist: &PlayList) -> &str {
    &playlist.name
}

/// Ids of the `limit` most followed playlists, highest first. Ties keep the
/// order in which `playlists` lists them.
pub fn rank_most_followed(playlists: &[PlayList], limit: usize) -> Vec<String> {
    let mut ranked: Vec<&PlayList> = playlists.iter().collect();
    ranked.sort_by(|a, b| b.follows.cmp(&a.follows));
    ranked
        .into_iter()
        .take(limit)
        .map(|playlist| playlist.id.clone())
        .collect()
}

/// Outcome of a genre-mixed pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenreMixReport {
    /// Playlists whose song list was rewritten.
    pub updated: Vec<String>,
    /// Slot references that no longer resolve to a playlist.
    pub skipped: Vec<String>,
}

#[derive(Clone)]
pub struct CurationEngine {
    catalog: Arc<dyn CatalogStore>,
}

impl CurationEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Check that every curated slot is present in the catalog.
    pub async fn verify_slots(&self) -> ServiceResult<()> {
        for slot in CuratedSlot::ALL {
            if self.catalog.curated_slot(slot).await?.is_none() {
                return Err(ServiceError::not_found("curated slot", slot.key()));
            }
        }
        Ok(())
    }

    pub async fn list_slots(&self) -> ServiceResult<Vec<GlobalPlayLists>> {
        Ok(self.catalog.list_curated().await?)
    }

    pub async fn slot(&self, slot: CuratedSlot) -> ServiceResult<GlobalPlayLists> {
        self.catalog
            .curated_slot(slot)
            .await?
            .ok_or_else(|| ServiceError::not_found("curated slot", slot.key()))
    }

    /// Playlists referenced by a slot, in slot order. Stale references are
    /// skipped.
    pub async fn slot_playlists(&self, slot: CuratedSlot) -> ServiceResult<Vec<PlayList>> {
        let curated = self.slot(slot).await?;
        let mut playlists = Vec::with_capacity(curated.play_lists.len());
        for id in &curated.play_lists {
            match self.catalog.find_playlist(id).await? {
                Some(playlist) => playlists.push(playlist),
                None => warn!(%slot, playlist_id = %id, "curated slot references a missing playlist"),
            }
        }
        Ok(playlists)
    }

    /// Operator assignment of the playlists a slot references.
    ///
    /// Only the genre-mixed slot can be assigned; the most-followed slot is
    /// always computed. Every id must resolve, duplicates collapse.
    pub async fn assign_slot(
        &self,
        slot: CuratedSlot,
        playlist_ids: Vec<String>,
    ) -> ServiceResult<GlobalPlayLists> {
        if slot == CuratedSlot::MostFollowed {
            return Err(ServiceError::BadRequest(
                "the mostFollowed slot is computed by curation".into(),
            ));
        }
        let mut ids: Vec<String> = Vec::with_capacity(playlist_ids.len());
        for id in playlist_ids {
            if ids.contains(&id) {
                continue;
            }
            if self.catalog.find_playlist(&id).await?.is_none() {
                return Err(ServiceError::not_found("playlist", id));
            }
            ids.push(id);
        }
        self.store_slot(slot, &ids).await?;
        self.slot(slot).await
    }

    /// Replace the most-followed slot with the current top playlists.
    pub async fn update_most_followed(&self) -> ServiceResult<Vec<String>> {
        let playlists = self.catalog.list_playlists().await?;
        let top = rank_most_followed(&playlists, MOST_FOLLOWED_LIMIT);
        self.store_slot(CuratedSlot::MostFollowed, &top).await?;
        info!(considered = playlists.len(), top = ?top, "most followed slot updated");
        Ok(top)
    }

    /// Rewrite every genre-mixed playlist with the songs of its genre.
    pub async fn update_genre_mixed(&self) -> ServiceResult<GenreMixReport> {
        let curated = self.slot(CuratedSlot::GenreMixed).await?;
        let mut report = GenreMixReport::default();

        for id in curated.play_lists {
            let Some(playlist) = self.catalog.find_playlist(&id).await? else {
                warn!(playlist_id = %id, "genre mixed slot references a missing playlist");
                report.skipped.push(id);
                continue;
            };
            let genre = genre_label(&playlist);
            let songs = self.catalog.song_ids_by_genre(genre).await?;
            if self.catalog.replace_playlist_songs(&id, &songs).await? {
                info!(playlist_id = %id, %genre, songs = songs.len(), "genre mixed playlist rebuilt");
                report.updated.push(id);
            } else {
                // Deleted between the lookup and the write.
                report.skipped.push(id);
            }
        }
        Ok(report)
    }

    /// Run both passes.
    pub async fn run_all(&self) -> ServiceResult<GenreMixReport> {
        self.update_most_followed().await?;
        self.update_genre_mixed().await
    }

    async fn store_slot(&self, slot: CuratedSlot, ids: &[String]) -> ServiceResult<()> {
        if self.catalog.replace_curated(slot, ids).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("curated slot", slot.key()))
        }
    }

    /// Run both passes every `period`, logging failures. The first pass
    /// runs one full period after startup.
    pub fn spawn_scheduler(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.run_all().await {
                    Ok(report) => info!(
                        updated = report.updated.len(),
                        skipped = report.skipped.len(),
                        "scheduled curation finished"
                    ),
                    Err(err) => error!(error = %err, "scheduled curation failed"),
                }
            }
        })
    }
}
