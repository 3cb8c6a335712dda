//! Image and podcast records. They reuse the blob contract but carry no
//! catalog invariants of their own.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPodcasts {
    pub id: String,
    pub title: String,
    pub play_lists: Vec<String>,
}

/// JSON body of `POST /globalPodcasts`.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewPodcasts {
    pub title: String,
    #[serde(default)]
    pub play_lists: Vec<String>,
}
