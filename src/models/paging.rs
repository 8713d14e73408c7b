use serde::{Deserialize, Serialize};

use crate::models::album::Album;
use crate::models::artist::Artist;
use crate::models::track::Track;

/// Offset or cursor paged listing. Only the items matter here.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FollowedArtists {
    pub artists: Page<Artist>,
}

#[derive(Debug, Deserialize)]
pub struct NewReleases {
    pub albums: Page<Album>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistTopTracks {
    #[serde(default)]
    pub tracks: Vec<Option<Track>>,
}

#[derive(Debug, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub tracks: Vec<Track>,
}
