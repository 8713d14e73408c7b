use crate::actions::artists::followed_artists;
use crate::api_endpoint;
use crate::client::{ApiClient, ApiError};
use crate::models::album::Album;
use crate::models::paging::{NewReleases, Page};
use crate::models::track::Track;

const FOLLOWED_ARTISTS_TO_SCAN: u32 = 20;
const ARTISTS_TO_EXPAND: usize = 5;
const ALBUMS_PER_ARTIST: u32 = 3;
const ALBUMS_TO_EXPAND: usize = 2;
const NEW_RELEASE_ALBUMS: u32 = 20;
const NEW_RELEASE_ALBUMS_TO_EXPAND: usize = 5;
const MIN_FOLLOWED_TRACKS: usize = 5;

pub async fn fetch_album_tracks(client: &ApiClient, album_id: &str) -> Result<Vec<Track>, ApiError> {
    let page: Page<Option<Track>> = client
        .get_json(
            api_endpoint!(client.endpoints(), "/albums/{}/tracks", album_id),
            &[("market", client.market().to_string())],
        )
        .await?;
    Ok(page.items.into_iter().flatten().collect())
}

pub async fn fetch_artist_albums(
    client: &ApiClient,
    artist_id: &str,
    limit: u32,
) -> Result<Vec<Album>, ApiError> {
    let page: Page<Album> = client
        .get_json(
            api_endpoint!(client.endpoints(), "/artists/{}/albums", artist_id),
            &[
                ("include_groups", "album,single".to_string()),
                ("limit", limit.to_string()),
                ("market", client.market().to_string()),
            ],
        )
        .await?;
    Ok(page.items)
}

pub async fn fetch_new_releases(client: &ApiClient, limit: u32) -> Result<Vec<Album>, ApiError> {
    let releases: NewReleases = client
        .get_json(
            api_endpoint!(client.endpoints(), "/browse/new-releases"),
            &[
                ("limit", limit.to_string()),
                ("market", client.market().to_string()),
            ],
        )
        .await?;
    Ok(releases.albums.items)
}

/// Collects the tracks of `albums`, skipping albums whose listing fails.
async fn tracks_of_albums(client: &ApiClient, albums: &[Album]) -> Vec<Track> {
    let mut tracks = Vec::new();
    for album in albums {
        match fetch_album_tracks(client, &album.id).await {
            Ok(album_tracks) => {
                tracing::debug!(album = %album.name, count = album_tracks.len(), "Added album tracks");
                tracks.extend(album_tracks);
            }
            Err(err) => {
                tracing::warn!(album = %album.name, error = %err, "Failed to get album tracks");
            }
        }
    }
    tracks
}

/// Tracks from the newest albums in the configured market.
pub async fn popular_new_releases(client: &ApiClient, limit: u32) -> Vec<Track> {
    let albums = match fetch_new_releases(client, NEW_RELEASE_ALBUMS).await {
        Ok(albums) => albums,
        Err(err) => {
            tracing::error!(error = %err, "Error fetching popular new releases");
            return Vec::new();
        }
    };
    let expand = albums.len().min(NEW_RELEASE_ALBUMS_TO_EXPAND);
    let mut tracks = tracks_of_albums(client, &albums[..expand]).await;
    tracks.truncate(limit as usize);
    tracks
}

/// Recent album and single tracks from followed artists, topped up with
/// popular new releases when the artists yield too little.
pub async fn new_releases_from_followed_artists(client: &ApiClient, limit: u32) -> Vec<Track> {
    let artists = followed_artists(client, FOLLOWED_ARTISTS_TO_SCAN).await;
    if artists.is_empty() {
        tracing::info!("No followed artists, using popular new releases");
        return popular_new_releases(client, limit).await;
    }

    let mut tracks = Vec::new();
    for artist in artists.iter().take(ARTISTS_TO_EXPAND) {
        match fetch_artist_albums(client, &artist.id, ALBUMS_PER_ARTIST).await {
            Ok(albums) => {
                let expand = albums.len().min(ALBUMS_TO_EXPAND);
                tracks.extend(tracks_of_albums(client, &albums[..expand]).await);
            }
            Err(err) => {
                tracing::warn!(artist = %artist.name, error = %err, "Failed to get artist albums");
            }
        }
    }
    tracing::debug!(count = tracks.len(), "Tracks collected from followed artists");

    if tracks.len() < MIN_FOLLOWED_TRACKS {
        let missing = (limit as usize).saturating_sub(tracks.len()) as u32;
        let popular = popular_new_releases(client, missing).await;
        tracing::debug!(count = popular.len(), "Topped up with popular new releases");
        tracks.extend(popular);
    }

    tracks.truncate(limit as usize);
    tracks
}
