use crate::actions::artists::followed_artists;
use crate::actions::library::{top_tracks, TimeRange};
use crate::api_endpoint;
use crate::client::{ApiClient, ApiError};
use crate::models::artist::Artist;
use crate::models::paging::Recommendations;
use crate::models::track::Track;

const SEED_TRACK_COUNT: usize = 3;
const SEED_ARTIST_COUNT: usize = 2;
const MIN_POPULARITY: u32 = 30;

/// Used when the user has no listening data to seed from.
pub const FALLBACK_SEED_TRACKS: [&str; 3] = [
    "4iV5W9uYEdYUVa79Axb7Rh",
    "1301WleyT98MSxVHPZCA6M",
    "3n3Ppam7vgaVa1iaRUc9L",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seeds {
    pub tracks: Vec<String>,
    pub artists: Vec<String>,
}

impl Seeds {
    pub fn from_listening(tracks: &[Track], artists: &[Artist]) -> Self {
        let tracks: Vec<String> = tracks
            .iter()
            .filter_map(|track| track.id.clone())
            .take(SEED_TRACK_COUNT)
            .collect();
        let artists: Vec<String> = artists
            .iter()
            .take(SEED_ARTIST_COUNT)
            .map(|artist| artist.id.clone())
            .collect();
        if tracks.is_empty() && artists.is_empty() {
            return Seeds {
                tracks: FALLBACK_SEED_TRACKS.iter().map(|id| id.to_string()).collect(),
                artists: Vec::new(),
            };
        }
        Seeds { tracks, artists }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if !self.tracks.is_empty() {
            query.push(("seed_tracks", self.tracks.join(",")));
        }
        if !self.artists.is_empty() {
            query.push(("seed_artists", self.artists.join(",")));
        }
        query
    }
}

pub async fn recommendation_seeds(client: &ApiClient) -> Seeds {
    let (tracks, artists) = tokio::join!(
        top_tracks(client, TimeRange::MediumTerm, SEED_TRACK_COUNT as u32),
        followed_artists(client, SEED_ARTIST_COUNT as u32),
    );
    Seeds::from_listening(&tracks, &artists)
}

pub async fn fetch_recommendations(
    client: &ApiClient,
    seeds: &Seeds,
    limit: u32,
) -> Result<Vec<Track>, ApiError> {
    let mut query = seeds.query();
    query.push(("limit", limit.to_string()));
    query.push(("market", client.market().to_string()));
    query.push(("min_popularity", MIN_POPULARITY.to_string()));
    let recommendations: Recommendations = client
        .get_json(api_endpoint!(client.endpoints(), "/recommendations"), &query)
        .await?;
    Ok(recommendations.tracks)
}

/// Recommendations seeded from the user's top tracks and artists.
pub async fn recommendations(client: &ApiClient, limit: u32) -> Vec<Track> {
    let seeds = recommendation_seeds(client).await;
    fetch_recommendations(client, &seeds, limit)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "Error fetching recommendations");
            Vec::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist(id: &str) -> Artist {
        Artist {
            id: id.to_string(),
            name: id.to_uppercase(),
            genres: Vec::new(),
            popularity: None,
            images: Vec::new(),
        }
    }

    #[test]
    fn empty_listening_uses_fallback_tracks() {
        let seeds = Seeds::from_listening(&[], &[]);
        assert_eq!(seeds.tracks.len(), 3);
        assert!(seeds.artists.is_empty());
        assert_eq!(
            seeds.query(),
            vec![("seed_tracks", FALLBACK_SEED_TRACKS.join(","))]
        );
    }

    #[test]
    fn local_tracks_are_not_seeds() {
        let local: Track = serde_json::from_value(serde_json::json!({
            "id": null,
            "uri": "spotify:local:Band:Demo:Take+One:200",
            "name": "Take One",
            "is_local": true
        }))
        .unwrap();
        let seeds = Seeds::from_listening(&[local], &[artist("a1")]);
        assert!(seeds.tracks.is_empty());
        assert_eq!(seeds.artists, ["a1"]);
    }

    #[test]
    fn artists_only_seed() {
        let artists = [artist("a1"), artist("a2"), artist("a3")];
        let seeds = Seeds::from_listening(&[], &artists);
        assert!(seeds.tracks.is_empty());
        assert_eq!(seeds.query(), vec![("seed_artists", "a1,a2".to_string())]);
    }
}
