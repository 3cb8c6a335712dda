use crate::{
    errors::AppError,
    models::{
        playlist::{EmptyPlayListReq, NewPlayList},
        song::Song,
        user::{LoginReq, User},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayListQuery {
    pub playlist_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongQuery {
    pub song_id: String,
}

/// POST `/users/login`: the user behind an external login, created on
/// first sight.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.media.login(req).await?))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.media.list_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.media.get_user(&id).await?))
}

pub async fn liked_songs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Song>>, AppError> {
    Ok(Json(state.media.liked_songs(&id).await?))
}

pub async fn follows(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.social.follows(&id).await?))
}

/// POST `/users/{id}/playlists`: an empty playlist owned by the user.
pub async fn create_empty_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EmptyPlayListReq>,
) -> Result<Response, AppError> {
    let playlist = state
        .media
        .create_playlist(NewPlayList {
            owner_id: Some(id),
            name: req.name,
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(playlist)).into_response())
}

pub async fn add_to_liked(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<SongQuery>,
) -> Result<&'static str, AppError> {
    state.social.like(&id, &q.song_id).await?;
    Ok("Song added to liked songs successfully.")
}

pub async fn delete_liked(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<SongQuery>,
) -> Result<&'static str, AppError> {
    state.social.unlike(&id, &q.song_id).await?;
    Ok("Song removed from liked songs successfully.")
}

/// POST `/users/{id}/addPlaylistToUser?playlistId=`: follow.
pub async fn add_playlist_to_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<PlayListQuery>,
) -> Result<&'static str, AppError> {
    state.social.follow(&id, &q.playlist_id).await?;
    Ok("Playlist added to user successfully.")
}

/// DELETE `/users/{id}/deletePlayListFromUser?playlistId=`: unfollow.
pub async fn delete_playlist_from_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<PlayListQuery>,
) -> Result<&'static str, AppError> {
    state.social.unfollow(&id, &q.playlist_id).await?;
    Ok("Playlist deleted from user successfully.")
}
