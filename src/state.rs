//! Process-wide state shared by every handler.
//!
//! Built once at startup; handlers clone the cheap `Arc` handles inside.

use crate::services::{
    blob_store::{BlobStore, LocalBlobStore},
    catalog_store::{CatalogStore, SqliteCatalog},
    curation::CurationEngine,
    media_catalog::{Buckets, MediaCatalog},
    range_stream::RangeStreamer,
    social_graph::SocialGraph,
};
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc, time::Duration};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub buckets: Buckets,
    pub media: MediaCatalog,
    pub social: SocialGraph,
    pub curation: CurationEngine,
    pub streamer: RangeStreamer,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        blobs: Arc<dyn BlobStore>,
        buckets: Buckets,
        chunk_timeout: Duration,
    ) -> Self {
        Self {
            media: MediaCatalog::new(catalog.clone(), blobs.clone(), buckets.clone()),
            social: SocialGraph::new(catalog.clone()),
            curation: CurationEngine::new(catalog.clone()),
            streamer: RangeStreamer::new(blobs.clone(), chunk_timeout),
            catalog,
            blobs,
            buckets,
        }
    }

    /// SQLite catalog and local-disk blob store sharing `pool`.
    pub fn local(
        pool: SqlitePool,
        storage_dir: impl Into<PathBuf>,
        public_base_url: &str,
        buckets: Buckets,
        chunk_timeout: Duration,
    ) -> Self {
        let blobs = Arc::new(LocalBlobStore::new(pool.clone(), storage_dir, public_base_url));
        let catalog = Arc::new(SqliteCatalog::new(pool));
        Self::new(catalog, blobs, buckets, chunk_timeout)
    }

    /// Create both buckets, check that every curated slot exists and drop
    /// song name claims no running upload can hold.
    pub async fn bootstrap(&self) -> anyhow::Result<()> {
        self.blobs.ensure_bucket(&self.buckets.audio).await?;
        self.blobs.ensure_bucket(&self.buckets.images).await?;
        self.curation.verify_slots().await?;
        let stale = self.catalog.clear_song_claims().await?;
        if stale > 0 {
            tracing::warn!(stale, "dropped song name claims left by an interrupted upload");
        }
        Ok(())
    }
}
