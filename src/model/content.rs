//! Server-side data types: items, libraries and query results

use serde::{Deserialize, Serialize};

/// Jellyfin ticks are 100ns units
const TICKS_PER_MILLISECOND: u64 = 10_000;

/// Collection tag attached to a user view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    Music,
    Movies,
    #[serde(rename = "tvshows")]
    TvShows,
    Books,
    Playlists,
    #[serde(other)]
    Other,
}

/// A library, folder or track as returned by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub album_artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub collection_type: Option<CollectionType>,
    #[serde(default)]
    pub run_time_ticks: Option<u64>,
}

impl Item {
    pub fn is_music_library(&self) -> bool {
        self.collection_type == Some(CollectionType::Music)
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }

    pub fn duration_ms(&self) -> Option<u32> {
        self.run_time_ticks
            .map(|ticks| (ticks / TICKS_PER_MILLISECOND).min(u32::MAX as u64) as u32)
    }
}

/// Envelope of `/Views` and `/Items`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResult {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub total_record_count: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `/Users/AuthenticateByName`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub access_token: Option<String>,
    pub user: Option<UserDto>,
}
