use serde::{Deserialize, Serialize};

use crate::models::artist::SimplifiedArtist;
use crate::models::Image;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub release_date: Option<String>,
}
