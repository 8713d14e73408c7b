//! Playback device coordination.
//!
//! A [`Player`] tracks the state of one playback device. Device readiness and
//! playback snapshots arrive as [`PlayerEvent`]s on a channel; commands go out
//! through the Web API, addressed to the bound device id.

pub mod commands;
pub mod devices;

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::client::{ApiClient, ApiError};
use crate::models::playback::PlaybackState;
use crate::models::track::Track;

pub const DEFAULT_VOLUME: u8 = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Ready { device_id: String },
    NotReady { device_id: String },
    StateChanged(Option<PlaybackState>),
    InitializationError(String),
    AuthenticationError(String),
    AccountError(String),
    PlaybackError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub is_ready: bool,
    pub is_playing: bool,
    pub is_paused: bool,
    pub current_track: Option<Track>,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub volume: u8,
    pub device_id: Option<String>,
}

impl Default for PlayerState {
    fn default() -> Self {
        PlayerState {
            is_ready: false,
            is_playing: false,
            is_paused: true,
            current_track: None,
            position_ms: 0,
            duration_ms: 0,
            volume: DEFAULT_VOLUME,
            device_id: None,
        }
    }
}

impl PlayerState {
    pub fn apply(&mut self, event: &PlayerEvent) {
        match event {
            PlayerEvent::Ready { device_id } => {
                tracing::info!(%device_id, "Player is ready");
                self.device_id = Some(device_id.clone());
                self.is_ready = true;
            }
            PlayerEvent::NotReady { device_id } => {
                tracing::info!(%device_id, "Player has gone offline");
                self.is_ready = false;
            }
            PlayerEvent::StateChanged(None) => {}
            PlayerEvent::StateChanged(Some(state)) => {
                tracing::debug!(playing = state.is_playing, "Player state changed");
                self.is_playing = state.is_playing;
                self.is_paused = state.paused();
                self.position_ms = state.progress_ms.unwrap_or(0);
                self.duration_ms = state
                    .item
                    .as_ref()
                    .map(|track| track.duration_ms)
                    .unwrap_or(0);
                self.current_track = state.item.clone();
                if let Some(volume) = state.device.as_ref().and_then(|d| d.volume_percent) {
                    self.volume = volume;
                }
            }
            PlayerEvent::InitializationError(message) => {
                tracing::error!(%message, "Failed to initialize player");
            }
            PlayerEvent::AuthenticationError(message) => {
                tracing::error!(%message, "Failed to authenticate player");
            }
            PlayerEvent::AccountError(message) => {
                tracing::error!(%message, "Failed to validate account");
            }
            PlayerEvent::PlaybackError(message) => {
                tracing::error!(%message, "Failed to perform playback");
            }
        }
    }

    /// The device every command is addressed to, when it is usable.
    pub fn ready_device(&self) -> Option<&str> {
        match (&self.device_id, self.is_ready) {
            (Some(device_id), true) => Some(device_id.as_str()),
            _ => None,
        }
    }

    pub fn can_play(&self) -> bool {
        self.ready_device().is_some()
    }
}

#[derive(Clone)]
pub struct Player {
    client: ApiClient,
    state: Arc<RwLock<PlayerState>>,
}

impl Player {
    pub fn new(client: ApiClient) -> Self {
        Player {
            client,
            state: Arc::new(RwLock::new(PlayerState::default())),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn handle_event(&self, event: &PlayerEvent) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(event);
    }

    /// Applies events until every sender is dropped.
    pub fn spawn_listener(&self, mut events: UnboundedReceiver<PlayerEvent>) -> JoinHandle<()> {
        let player = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                player.handle_event(&event);
            }
            tracing::debug!("Player event channel closed");
        })
    }

    fn device(&self) -> Result<String, ApiError> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ready_device()
            .map(str::to_string)
            .ok_or(ApiError::NoDevice)
    }

    fn update(&self, f: impl FnOnce(&mut PlayerState)) {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner));
    }

    pub async fn play_track(&self, track: &Track) -> Result<(), ApiError> {
        let device_id = self.device()?;
        tracing::info!(track = %track.name, %device_id, "Playing track");
        commands::play_uri(&self.client, &device_id, &track.uri).await
    }

    pub async fn play_uri(&self, uri: &str) -> Result<(), ApiError> {
        let device_id = self.device()?;
        tracing::info!(%uri, %device_id, "Playing uri");
        commands::play_uri(&self.client, &device_id, uri).await
    }

    pub async fn pause(&self) -> Result<(), ApiError> {
        let device_id = self.device()?;
        commands::pause(&self.client, &device_id).await?;
        self.update(|state| {
            state.is_playing = false;
            state.is_paused = true;
        });
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), ApiError> {
        let device_id = self.device()?;
        commands::resume(&self.client, &device_id).await?;
        self.update(|state| {
            state.is_playing = true;
            state.is_paused = false;
        });
        Ok(())
    }

    pub async fn toggle_play(&self) -> Result<(), ApiError> {
        if self.state().is_paused {
            self.resume().await
        } else {
            self.pause().await
        }
    }

    pub async fn seek(&self, position_ms: u64) -> Result<(), ApiError> {
        let device_id = self.device()?;
        commands::seek(&self.client, &device_id, position_ms).await?;
        self.update(|state| state.position_ms = position_ms);
        Ok(())
    }

    /// Sets the volume in percent, clamped to 100.
    pub async fn set_volume(&self, percent: u8) -> Result<(), ApiError> {
        let percent = percent.min(100);
        let device_id = self.device()?;
        commands::set_volume(&self.client, &device_id, percent).await?;
        self.update(|state| state.volume = percent);
        Ok(())
    }

    pub async fn next_track(&self) -> Result<(), ApiError> {
        let device_id = self.device()?;
        commands::next_track(&self.client, &device_id).await
    }

    pub async fn previous_track(&self) -> Result<(), ApiError> {
        let device_id = self.device()?;
        commands::previous_track(&self.client, &device_id).await
    }

    /// Forgets the bound device. Commands fail until the next `Ready`.
    pub fn disconnect(&self) {
        self.update(|state| {
            let volume = state.volume;
            *state = PlayerState {
                volume,
                ..PlayerState::default()
            };
        });
        tracing::debug!("Player disconnected");
    }
}
