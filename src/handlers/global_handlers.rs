//! Curated global playlists and podcast collections.

use crate::{
    errors::AppError,
    models::{
        asset::{GlobalPodcasts, NewPodcasts},
        curated::{CuratedSlot, GlobalPlayLists},
        playlist::PlayList,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

fn parse_slot(raw: &str) -> Result<CuratedSlot, AppError> {
    raw.parse::<CuratedSlot>()
        .map_err(|e| AppError::not_found(e.to_string()))
}

pub async fn list_slots(
    State(state): State<AppState>,
) -> Result<Json<Vec<GlobalPlayLists>>, AppError> {
    Ok(Json(state.curation.list_slots().await?))
}

pub async fn slot_playlists(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> Result<Json<Vec<PlayList>>, AppError> {
    let slot = parse_slot(&slot)?;
    Ok(Json(state.curation.slot_playlists(slot).await?))
}

/// PUT `/globalPlayLists/{slot}/playlists`: JSON array of playlist ids.
pub async fn assign_slot(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Json(ids): Json<Vec<String>>,
) -> Result<Json<GlobalPlayLists>, AppError> {
    let slot = parse_slot(&slot)?;
    Ok(Json(state.curation.assign_slot(slot, ids).await?))
}

pub async fn update_most_followed(
    State(state): State<AppState>,
) -> Result<&'static str, AppError> {
    state.curation.update_most_followed().await?;
    Ok("Updated Successfully")
}

pub async fn update_genre_mixed(State(state): State<AppState>) -> Result<String, AppError> {
    let report = state.curation.update_genre_mixed().await?;
    Ok(format!(
        "PlayList Updated: {} rebuilt, {} skipped",
        report.updated.len(),
        report.skipped.len()
    ))
}

pub async fn list_podcasts(
    State(state): State<AppState>,
) -> Result<Json<Vec<GlobalPodcasts>>, AppError> {
    Ok(Json(state.media.list_podcasts().await?))
}

pub async fn create_podcasts(
    State(state): State<AppState>,
    Json(new): Json<NewPodcasts>,
) -> Result<Response, AppError> {
    let podcasts = state.media.create_podcasts(new).await?;
    Ok((StatusCode::CREATED, Json(podcasts)).into_response())
}
