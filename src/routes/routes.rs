//! Defines routes for the catalog, streaming and curation endpoints.
//!
//! ## Structure
//! - **Songs**
//!   - `GET    /songs`                         — all songs
//!   - `POST   /songs`                         — multipart upload
//!   - `GET    /songs/stream/{*key}`           — seekable audio stream (`Range`)
//!   - `GET    /songs/genre/{genre}`           — ids of songs in a genre
//!   - `GET|PUT /songs/{id}`                   — read / edit title and artist
//!   - `PUT    /songs/{id}/incrementPlayCount`
//!
//! - **Playlists**
//!   - `GET|POST /playlists`                   — list / multipart create (`?userId=`)
//!   - `GET|DELETE /playlists/{id}`            — read / owner delete (`?userId=`)
//!   - `GET    /playlists/{id}/songs|views|followers|isFollowing`
//!   - `POST   /playlists/{id}/addSongToPlayList?songId=`
//!
//! - **Users**
//!   - `POST   /users/login`, `GET /users`, `GET /users/{id}`
//!   - `GET    /users/{id}/likedSongs|follows`
//!   - `POST   /users/{id}/playlists`          — empty playlist
//!   - `POST   /users/{id}/addToLiked`, `DELETE /users/{id}/deleteLiked`
//!   - `POST   /users/{id}/addPlaylistToUser`, `DELETE /users/{id}/deletePlayListFromUser`
//!
//! - **Curation**: `/globalPlayLists...`, `/globalPodcasts`
//! - **Assets**: `/images...`, `/objects/{bucket}/{*key}` (public URLs)

use crate::{
    handlers::{
        global_handlers,
        health_handlers::{healthz, readyz},
        image_handlers, object_handlers, playlist_handlers, song_handlers, user_handlers,
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Build and return the router for every endpoint.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // songs
        .route(
            "/songs",
            get(song_handlers::list_songs).post(song_handlers::create_song),
        )
        .route("/songs/stream/{*key}", get(song_handlers::stream_song))
        .route("/songs/genre/{genre}", get(song_handlers::songs_by_genre))
        .route(
            "/songs/{id}",
            get(song_handlers::get_song).put(song_handlers::update_song),
        )
        .route(
            "/songs/{id}/incrementPlayCount",
            put(song_handlers::increment_play_count),
        )
        // playlists
        .route(
            "/playlists",
            get(playlist_handlers::list_playlists).post(playlist_handlers::create_playlist),
        )
        .route(
            "/playlists/{id}",
            get(playlist_handlers::get_playlist).delete(playlist_handlers::delete_playlist),
        )
        .route("/playlists/{id}/songs", get(playlist_handlers::playlist_songs))
        .route("/playlists/{id}/views", get(playlist_handlers::playlist_views))
        .route(
            "/playlists/{id}/followers",
            get(playlist_handlers::playlist_followers),
        )
        .route(
            "/playlists/{id}/isFollowing",
            get(playlist_handlers::is_following),
        )
        .route(
            "/playlists/{id}/addSongToPlayList",
            post(playlist_handlers::add_song_to_playlist),
        )
        // users
        .route("/users", get(user_handlers::list_users))
        .route("/users/login", post(user_handlers::login))
        .route("/users/{id}", get(user_handlers::get_user))
        .route("/users/{id}/likedSongs", get(user_handlers::liked_songs))
        .route("/users/{id}/follows", get(user_handlers::follows))
        .route(
            "/users/{id}/playlists",
            post(user_handlers::create_empty_playlist),
        )
        .route("/users/{id}/addToLiked", post(user_handlers::add_to_liked))
        .route(
            "/users/{id}/deleteLiked",
            delete(user_handlers::delete_liked),
        )
        .route(
            "/users/{id}/addPlaylistToUser",
            post(user_handlers::add_playlist_to_user),
        )
        .route(
            "/users/{id}/deletePlayListFromUser",
            delete(user_handlers::delete_playlist_from_user),
        )
        // curation
        .route("/globalPlayLists", get(global_handlers::list_slots))
        .route(
            "/globalPlayLists/updateMostFollowed",
            put(global_handlers::update_most_followed),
        )
        .route(
            "/globalPlayLists/updateGenreMixed",
            put(global_handlers::update_genre_mixed),
        )
        .route(
            "/globalPlayLists/{slot}/playlists",
            get(global_handlers::slot_playlists).put(global_handlers::assign_slot),
        )
        .route(
            "/globalPodcasts",
            get(global_handlers::list_podcasts).post(global_handlers::create_podcasts),
        )
        // images
        .route(
            "/images",
            get(image_handlers::list_images).post(image_handlers::upload_image),
        )
        .route(
            "/images/{id}",
            get(image_handlers::get_image).delete(image_handlers::delete_image),
        )
        // public object URLs
        .route("/objects/{bucket}", get(object_handlers::list_objects))
        .route(
            "/objects/{bucket}/{*key}",
            get(object_handlers::get_object).head(object_handlers::head_object),
        )
}
