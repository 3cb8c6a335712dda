//! Core data models for the media catalog.
//!
//! Catalog entities map to SQLite rows via `sqlx::FromRow` and serialize as
//! camelCase JSON via `serde`. Entities with list-valued fields have a
//! separate `*Row` shape; the lists live in join tables.

pub mod asset;
pub mod bucket;
pub mod curated;
pub mod object;
pub mod playlist;
pub mod song;
pub mod user;
