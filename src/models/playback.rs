use serde::{Deserialize, Serialize};

use crate::models::track::Track;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Device {
    /// Absent for restricted devices, which cannot be targeted.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_restricted: bool,
    #[serde(rename = "type", default)]
    pub device_type: String,
    #[serde(default)]
    pub volume_percent: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Playback snapshot as reported for the bound device.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackState {
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    /// `None` for podcast episodes and ads.
    #[serde(default, deserialize_with = "track_or_none")]
    pub item: Option<Track>,
    #[serde(default)]
    pub shuffle_state: bool,
    #[serde(default)]
    pub repeat_state: Option<String>,
}

impl PlaybackState {
    pub fn paused(&self) -> bool {
        !self.is_playing
    }
}

fn track_or_none<'de, D>(deserializer: D) -> Result<Option<Track>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}
