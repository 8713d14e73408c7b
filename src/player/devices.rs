//! Binding a [`Player`](super::Player) to a Connect device.

use tokio::sync::mpsc::UnboundedSender;

use crate::api_endpoint;
use crate::client::{ApiClient, ApiError};
use crate::models::playback::{Device, DeviceList, PlaybackState};
use crate::player::PlayerEvent;

pub async fn list_devices(client: &ApiClient) -> Result<Vec<Device>, ApiError> {
    let list: DeviceList = client
        .get_json(api_endpoint!(client.endpoints(), "/me/player/devices"), &[])
        .await?;
    Ok(list.devices)
}

/// Picks the device named `name`, else the active one. Restricted devices
/// and devices without an id are never picked.
pub fn select_device<'a>(devices: &'a [Device], name: &str) -> Option<&'a Device> {
    let usable = |device: &&Device| device.id.is_some() && !device.is_restricted;
    devices
        .iter()
        .filter(usable)
        .find(|device| device.name == name)
        .or_else(|| devices.iter().filter(usable).find(|device| device.is_active))
}

/// Looks up the playback device and announces it on `events`.
///
/// Emits `Ready` for the selected device, or `NotReady` for the previously
/// known `last_device` when nothing usable is found. Listing failures are
/// reported as an `InitializationError`.
pub async fn connect(
    client: &ApiClient,
    name: &str,
    last_device: Option<&str>,
    events: &UnboundedSender<PlayerEvent>,
) -> Option<Device> {
    let (selected, event) = match list_devices(client).await {
        Ok(devices) => {
            let selected = select_device(&devices, name).cloned();
            let event = match selected.as_ref().and_then(|device| device.id.clone()) {
                Some(device_id) => Some(PlayerEvent::Ready { device_id }),
                None => {
                    tracing::warn!(device_name = %name, available = devices.len(), "No playback device found");
                    last_device.map(|device_id| PlayerEvent::NotReady {
                        device_id: device_id.to_string(),
                    })
                }
            };
            (selected, event)
        }
        Err(err) => (None, Some(PlayerEvent::InitializationError(err.to_string()))),
    };
    if let Some(event) = event {
        // A closed channel means the player is gone.
        let _ = events.send(event);
    }
    selected
}

pub async fn fetch_playback_state(client: &ApiClient) -> Result<Option<PlaybackState>, ApiError> {
    client
        .get_optional_json(api_endpoint!(client.endpoints(), "/me/player"), &[])
        .await
}

/// Reads the current playback snapshot and forwards it as `StateChanged`.
pub async fn poll_state(client: &ApiClient, events: &UnboundedSender<PlayerEvent>) {
    let event = match fetch_playback_state(client).await {
        Ok(state) => PlayerEvent::StateChanged(state),
        Err(err) => PlayerEvent::PlaybackError(err.to_string()),
    };
    let _ = events.send(event);
}
