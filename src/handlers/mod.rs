pub mod form;
pub mod global_handlers;
pub mod health_handlers;
pub mod image_handlers;
pub mod object_handlers;
pub mod playlist_handlers;
pub mod song_handlers;
pub mod user_handlers;
