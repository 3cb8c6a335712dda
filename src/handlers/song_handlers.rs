//! Song endpoints: catalog reads, uploads, edits, play counts and the
//! seekable audio stream.

use crate::{
    errors::AppError,
    handlers::{
        form::FormData,
        object_handlers::{media_response, range_header},
    },
    models::song::{NewSong, Song, SongEdit},
    services::range_stream::{RangeStreamer, StreamError},
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

/// GET `/songs/stream/{*key}`: 200 with the whole file or 206 with the
/// first requested range. Read-only.
pub async fn stream_song(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, StreamError> {
    let bucket = &state.buckets.audio;
    let key = RangeStreamer::resolve_key(&raw_key, bucket)?;
    let stream = state
        .streamer
        .open(bucket, &key, range_header(&headers)?)
        .await?;
    let file_name = stream.object.filename.clone();
    Ok(media_response(stream, Some(&file_name)))
}

pub async fn list_songs(State(state): State<AppState>) -> Result<Json<Vec<Song>>, AppError> {
    Ok(Json(state.media.list_songs().await?))
}

pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Song>, AppError> {
    Ok(Json(state.media.get_song(&id).await?))
}

/// GET `/songs/genre/{genre}`: ids of songs whose genre matches exactly.
pub async fn songs_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.media.song_ids_by_genre(&genre).await?))
}

/// POST `/songs`: multipart `title`, `artist`, `genre`, optional
/// `fileName`, the audio part `file` and an optional `photo` part.
pub async fn create_song(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = FormData::read(multipart).await?;
    let audio = form
        .take_file("file")
        .or_else(|| form.take_file("audio"))
        .ok_or_else(|| AppError::bad_request("missing audio part `file`"))?;

    let new = NewSong {
        file_name: form
            .text("fileName")
            .unwrap_or_else(|| audio.file_name.clone()),
        title: form.require_text("title")?,
        artist: form.text("artist").unwrap_or_default(),
        genre: form.text("genre").unwrap_or_default(),
        audio_content_type: audio.content_type.clone(),
        photo: form.take_file("photo"),
    };

    let song = state.media.create_song(new, audio).await?;
    Ok((StatusCode::CREATED, Json(song)).into_response())
}

/// PUT `/songs/{id}`: JSON `{title?, artist?}`.
pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<SongEdit>,
) -> Result<Json<Song>, AppError> {
    Ok(Json(state.media.update_song(&id, edit).await?))
}

pub async fn increment_play_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, AppError> {
    state.media.increment_play_count(&id).await?;
    Ok(format!("Play count for song with ID {} has been incremented", id))
}
