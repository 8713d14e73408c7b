//! Player endpoints of the Web API. Every call targets one device id.

use reqwest::Method;
use serde_json::json;

use crate::api_endpoint;
use crate::client::{ApiClient, ApiError};

fn device_query(device_id: &str) -> (&'static str, String) {
    ("device_id", device_id.to_string())
}

pub async fn play_uri(client: &ApiClient, device_id: &str, uri: &str) -> Result<(), ApiError> {
    client
        .send_command(
            Method::PUT,
            api_endpoint!(client.endpoints(), "/me/player/play"),
            &[device_query(device_id)],
            Some(json!({
                "uris": [uri],
                "offset": { "uri": uri },
                "position_ms": 0,
            })),
        )
        .await
}

pub async fn resume(client: &ApiClient, device_id: &str) -> Result<(), ApiError> {
    client
        .send_command(
            Method::PUT,
            api_endpoint!(client.endpoints(), "/me/player/play"),
            &[device_query(device_id)],
            None,
        )
        .await
}

pub async fn pause(client: &ApiClient, device_id: &str) -> Result<(), ApiError> {
    client
        .send_command(
            Method::PUT,
            api_endpoint!(client.endpoints(), "/me/player/pause"),
            &[device_query(device_id)],
            None,
        )
        .await
}

pub async fn seek(client: &ApiClient, device_id: &str, position_ms: u64) -> Result<(), ApiError> {
    client
        .send_command(
            Method::PUT,
            api_endpoint!(client.endpoints(), "/me/player/seek"),
            &[
                ("position_ms", position_ms.to_string()),
                device_query(device_id),
            ],
            None,
        )
        .await
}

pub async fn set_volume(client: &ApiClient, device_id: &str, percent: u8) -> Result<(), ApiError> {
    client
        .send_command(
            Method::PUT,
            api_endpoint!(client.endpoints(), "/me/player/volume"),
            &[
                ("volume_percent", percent.to_string()),
                device_query(device_id),
            ],
            None,
        )
        .await
}

pub async fn next_track(client: &ApiClient, device_id: &str) -> Result<(), ApiError> {
    client
        .send_command(
            Method::POST,
            api_endpoint!(client.endpoints(), "/me/player/next"),
            &[device_query(device_id)],
            None,
        )
        .await
}

pub async fn previous_track(client: &ApiClient, device_id: &str) -> Result<(), ApiError> {
    client
        .send_command(
            Method::POST,
            api_endpoint!(client.endpoints(), "/me/player/previous"),
            &[device_query(device_id)],
            None,
        )
        .await
}
