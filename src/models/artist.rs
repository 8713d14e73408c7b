use serde::{Deserialize, Serialize};

use crate::models::Image;

/// `id` is null for the artists of local files.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimplifiedArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl SimplifiedArtist {
    /// A bare artist, or `None` when the artist has no id.
    pub fn to_artist(&self) -> Option<Artist> {
        Some(Artist {
            id: self.id.clone()?,
            name: self.name.clone(),
            genres: Vec::new(),
            popularity: None,
            images: Vec::new(),
        })
    }
}
