//! Music catalog service: song uploads with duration extraction, seekable
//! range streaming, follow/like graph upkeep and curated playlists.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::DefaultBodyLimit};
use state::AppState;

/// Build the full application router over `state`.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    routes::routes::routes()
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
