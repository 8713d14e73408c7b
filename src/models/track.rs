use serde::{Deserialize, Serialize};

use crate::models::album::Album;
use crate::models::artist::SimplifiedArtist;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

/// A full or simplified track object. Album track listings omit `album`
/// and `popularity`.
///
/// Local files have no `id`, and neither do their album and artists.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default, deserialize_with = "album_or_none")]
    pub album: Option<Album>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub popularity: Option<u32>,
}

impl Track {
    /// The track id, or the uri for local files.
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(self.uri.as_str())
    }

    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn album_or_none<'de, D>(deserializer: D) -> Result<Option<Album>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// One entry of the listening history.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayHistory {
    pub track: Track,
    #[serde(default)]
    pub played_at: Option<String>,
}
