//! Users and their follow/like edges.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A catalog user, keyed externally by `email`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Followed playlist ids, in follow order.
    pub play_lists: Vec<String>,
    /// Liked song ids, in like order.
    pub liked_songs: Vec<String>,
}

#[derive(FromRow, Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl UserRow {
    pub fn with_edges(self, play_lists: Vec<String>, liked_songs: Vec<String>) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            play_lists,
            liked_songs,
        }
    }
}

/// Identity forwarded by the gateway after a successful external login.
#[derive(Deserialize, Debug, Clone)]
pub struct LoginReq {
    pub name: String,
    pub email: String,
}
