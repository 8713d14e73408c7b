//! Shared fixtures for tests against a mock Spotify server.

#![allow(dead_code)]

use serde_json::{json, Value};
use soundspace::config::{SoundspaceConfig, SoundspaceConfigFile};
use soundspace::endpoints::Endpoints;
use soundspace::ApiClient;
use wiremock::MockServer;

pub const ACCESS_TOKEN: &str = "test-token";
pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
/// `client-id:client-secret`, base64 encoded.
pub const BASIC_AUTH: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";

pub fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints::new(server.uri(), format!("{}/v1", server.uri()))
}

pub fn api_client(server: &MockServer) -> ApiClient {
    ApiClient::new(reqwest::Client::new(), endpoints(server), ACCESS_TOKEN, "US")
}

pub fn config(server: &MockServer) -> SoundspaceConfig {
    SoundspaceConfig::try_from(SoundspaceConfigFile {
        client_id: Some(CLIENT_ID.to_string()),
        client_secret: Some(CLIENT_SECRET.to_string()),
        accounts_url: Some(server.uri()),
        api_url: Some(format!("{}/v1", server.uri())),
        ..Default::default()
    })
    .expect("test config is complete")
}

pub fn bearer() -> String {
    format!("Bearer {}", ACCESS_TOKEN)
}

pub fn artist_json(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name, "genres": [], "popularity": 50, "images": [] })
}

pub fn track_json(id: &str, artists: &[(&str, &str)]) -> Value {
    json!({
        "id": id,
        "uri": format!("spotify:track:{}", id),
        "name": format!("Track {}", id),
        "artists": artists
            .iter()
            .map(|(id, name)| json!({ "id": id, "name": name }))
            .collect::<Vec<_>>(),
        "duration_ms": 200000,
        "preview_url": null,
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", id) }
    })
}

/// A local file as the Web API lists it: no ids on the track, album or artists.
pub fn local_track_json(name: &str) -> Value {
    json!({
        "id": null,
        "uri": format!("spotify:local:Band:Demo:{}:200", name),
        "name": name,
        "is_local": true,
        "album": { "id": null, "name": "Demo", "artists": [], "images": [], "uri": null },
        "artists": [{ "id": null, "name": "Local Band", "uri": null }],
        "duration_ms": 200000,
        "preview_url": null,
        "external_urls": {}
    })
}

pub fn token_json() -> Value {
    json!({
        "access_token": "fresh-access",
        "token_type": "Bearer",
        "scope": "user-read-private",
        "expires_in": 3600,
        "refresh_token": "fresh-refresh"
    })
}

pub fn user_json() -> Value {
    json!({
        "id": "listener",
        "display_name": "Listener One",
        "email": "listener@example.com",
        "images": [],
        "followers": { "total": 12 },
        "country": "US",
        "product": "premium"
    })
}
