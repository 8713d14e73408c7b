pub mod actions;
pub mod authorize;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod logging;
pub mod models;
pub mod player;
pub mod session;
pub mod storage;
pub mod user_info;

pub use client::{ApiClient, ApiError};
pub use config::SoundspaceConfig;
pub use session::Session;
