//! Artist lookups, including the followed-artists fallback chain.

use std::collections::HashSet;

use crate::actions::library::{recently_played, TimeRange};
use crate::api_endpoint;
use crate::client::{ApiClient, ApiError};
use crate::models::artist::{Artist, SimplifiedArtist};
use crate::models::paging::{ArtistTopTracks, FollowedArtists, Page};
use crate::models::track::Track;

const RECENT_TRACKS_FOR_ARTISTS: u32 = 20;
const TOP_ARTISTS_FOR_TRACKS: u32 = 10;
const ARTISTS_TO_EXPAND: usize = 5;
const TRACKS_PER_ARTIST: usize = 3;

pub async fn fetch_followed_artists(
    client: &ApiClient,
    limit: u32,
) -> Result<Vec<Artist>, ApiError> {
    let followed: FollowedArtists = client
        .get_json(
            api_endpoint!(client.endpoints(), "/me/following"),
            &[("type", "artist".to_string()), ("limit", limit.to_string())],
        )
        .await?;
    Ok(followed.artists.items)
}

pub async fn fetch_top_artists(
    client: &ApiClient,
    time_range: TimeRange,
    limit: u32,
) -> Result<Vec<Artist>, ApiError> {
    let page: Page<Artist> = client
        .get_json(
            api_endpoint!(client.endpoints(), "/me/top/artists"),
            &[
                ("time_range", time_range.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await?;
    Ok(page.items)
}

/// Unique artists of `tracks`, in order of first appearance. Artists
/// without an id are skipped.
pub fn unique_artists(tracks: &[Track], limit: usize) -> Vec<Artist> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .flat_map(|track| track.artists.iter())
        .filter_map(SimplifiedArtist::to_artist)
        .filter(|artist| seen.insert(artist.id.clone()))
        .take(limit)
        .collect()
}

/// Artists the user follows.
///
/// When the following endpoint fails or lists nobody, falls back to the
/// user's medium-term top artists, then to the artists of recently played
/// tracks. Returns an empty list when every source comes up empty.
pub async fn followed_artists(client: &ApiClient, limit: u32) -> Vec<Artist> {
    match fetch_followed_artists(client, limit).await {
        Ok(artists) if !artists.is_empty() => {
            tracing::debug!(count = artists.len(), "Followed artists fetched");
            return artists;
        }
        Ok(_) => tracing::warn!("No followed artists found, trying fallbacks"),
        Err(err) => tracing::warn!(error = %err, "Following endpoint failed, trying fallbacks"),
    }

    match fetch_top_artists(client, TimeRange::MediumTerm, limit).await {
        Ok(artists) if !artists.is_empty() => {
            tracing::info!(count = artists.len(), "Using top artists as fallback");
            return artists;
        }
        Ok(_) => tracing::debug!("Top artists fallback is empty"),
        Err(err) => tracing::error!(error = %err, "Top artists fallback failed"),
    }

    let recent = recently_played(client, RECENT_TRACKS_FOR_ARTISTS).await;
    let artists = unique_artists(&recent, limit as usize);
    if artists.is_empty() {
        tracing::warn!("All followed artist sources are empty");
    } else {
        tracing::info!(
            count = artists.len(),
            "Using recently played artists as fallback"
        );
    }
    artists
}

pub async fn fetch_artist_top_tracks(
    client: &ApiClient,
    artist_id: &str,
) -> Result<Vec<Track>, ApiError> {
    let top: ArtistTopTracks = client
        .get_json(
            api_endpoint!(client.endpoints(), "/artists/{}/top-tracks", artist_id),
            &[("market", client.market().to_string())],
        )
        .await?;
    Ok(top.tracks.into_iter().flatten().collect())
}

/// A few top tracks from each of the user's top artists.
pub async fn tracks_from_top_artists(client: &ApiClient, limit: u32) -> Vec<Track> {
    let artists =
        match fetch_top_artists(client, TimeRange::MediumTerm, TOP_ARTISTS_FOR_TRACKS).await {
            Ok(artists) => artists,
            Err(err) => {
                tracing::error!(error = %err, "Error getting tracks from top artists");
                return Vec::new();
            }
        };

    let mut tracks = Vec::new();
    for artist in artists.iter().take(ARTISTS_TO_EXPAND) {
        match fetch_artist_top_tracks(client, &artist.id).await {
            Ok(artist_tracks) => {
                tracks.extend(artist_tracks.into_iter().take(TRACKS_PER_ARTIST));
            }
            Err(err) => {
                tracing::warn!(artist = %artist.name, error = %err, "Skipping artist top tracks");
            }
        }
    }
    tracks.truncate(limit as usize);
    tracks
}
