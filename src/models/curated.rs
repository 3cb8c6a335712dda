//! Curated global playlist slots.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The fixed set of curated slots. Each holds an ordered list of playlist ids.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CuratedSlot {
    /// Top playlists by follower count, recomputed by curation.
    MostFollowed,
    /// Playlists whose songs are regenerated from the genre named by the playlist.
    GenreMixed,
}

impl CuratedSlot {
    pub const ALL: [CuratedSlot; 2] = [CuratedSlot::MostFollowed, CuratedSlot::GenreMixed];

    /// Stable key stored in the catalog and used in URLs.
    pub fn key(self) -> &'static str {
        match self {
            CuratedSlot::MostFollowed => "mostFollowed",
            CuratedSlot::GenreMixed => "genreMixed",
        }
    }
}

impl fmt::Display for CuratedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSlot(pub String);

impl fmt::Display for UnknownSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown curated slot `{}`", self.0)
    }
}

impl std::error::Error for UnknownSlot {}

impl FromStr for CuratedSlot {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CuratedSlot::ALL
            .into_iter()
            .find(|slot| slot.key() == s)
            .ok_or_else(|| UnknownSlot(s.to_string()))
    }
}

/// A slot together with the playlist ids it currently references.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPlayLists {
    pub slot: CuratedSlot,
    pub title: String,
    pub play_lists: Vec<String>,
}
