use crate::{
    errors::AppError,
    handlers::form::FormData,
    models::{
        playlist::{AddSongOutcome, NewPlayList, PlayList},
        song::Song,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongQuery {
    pub song_id: String,
}

pub async fn list_playlists(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlayList>>, AppError> {
    Ok(Json(state.media.list_playlists().await?))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlayList>, AppError> {
    Ok(Json(state.media.get_playlist(&id).await?))
}

pub async fn playlist_songs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Song>>, AppError> {
    Ok(Json(state.media.playlist_songs(&id).await?))
}

/// GET `/playlists/{id}/views`: total plays of the member songs.
pub async fn playlist_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<i64>, AppError> {
    Ok(Json(state.media.playlist_views(&id).await?))
}

pub async fn playlist_followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<i64>, AppError> {
    Ok(Json(state.social.followers(&id).await?))
}

pub async fn is_following(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<UserQuery>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(state.social.is_following(&q.user_id, &id).await?))
}

/// POST `/playlists?userId=`: multipart `name`, optional `photo`,
/// repeated `songs`.
pub async fn create_playlist(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = FormData::read(multipart).await?;
    let new = NewPlayList {
        owner_id: Some(q.user_id),
        name: form.require_text("name")?,
        photo: form.take_file("photo"),
        songs: form.list("songs"),
    };
    let playlist = state.media.create_playlist(new).await?;
    Ok((StatusCode::CREATED, Json(playlist)).into_response())
}

/// DELETE `/playlists/{id}?userId=`: owner only.
pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<UserQuery>,
) -> Result<&'static str, AppError> {
    state.media.delete_playlist(&id, &q.user_id).await?;
    Ok("PlayList deleted successfully.")
}

pub async fn add_song_to_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<SongQuery>,
) -> Result<&'static str, AppError> {
    match state.social.add_song_to_playlist(&id, &q.song_id).await? {
        AddSongOutcome::Added => Ok("Song added to playlist successfully."),
        AddSongOutcome::AlreadyPresent => Ok("Already Added"),
    }
}
