use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::endpoints::{Endpoints, DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL};

pub const DEFAULT_CONFIG_PATH: &str = "soundspace.config";
pub const DEFAULT_TOKEN_PATH: &str = "soundspace.tokens.json";
pub const DEFAULT_DEVICE_NAME: &str = "SoundSpace Player";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MARKET: &str = "US";

const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";
const REDIRECT_URI_VAR: &str = "SPOTIFY_REDIRECT_URI";
pub const CALLBACK_PATH: &str = "/auth/callback";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No client id configured (set `client_id` or SPOTIFY_CLIENT_ID).")]
    MissingClientId,
    #[error("No client secret configured (set `client_secret` or SPOTIFY_CLIENT_SECRET).")]
    MissingClientSecret,
}

/// On-disk shape of the configuration. Everything but the client
/// credentials is optional.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SoundspaceConfigFile {
    pub address: Option<IpAddr>,
    pub port: Option<u16>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub token_path: Option<PathBuf>,
    pub market: Option<String>,
    pub device_name: Option<String>,
    pub accounts_url: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoundspaceConfig {
    pub address: IpAddr,
    pub port: u16,
    pub client_id: String,
    client_secret: String,
    pub redirect_uri: String,
    pub token_path: PathBuf,
    pub market: String,
    pub device_name: String,
    pub endpoints: Endpoints,
}

impl From<&SoundspaceConfig> for SoundspaceConfigFile {
    fn from(config: &SoundspaceConfig) -> Self {
        SoundspaceConfigFile {
            address: Some(config.address),
            port: Some(config.port),
            client_id: Some(config.client_id.clone()),
            client_secret: Some(config.client_secret.clone()),
            redirect_uri: Some(config.redirect_uri.clone()),
            token_path: Some(config.token_path.clone()),
            market: Some(config.market.clone()),
            device_name: Some(config.device_name.clone()),
            accounts_url: Some(config.endpoints.accounts.clone()),
            api_url: Some(config.endpoints.api.clone()),
        }
    }
}

impl TryFrom<SoundspaceConfigFile> for SoundspaceConfig {
    type Error = ConfigError;

    fn try_from(file_config: SoundspaceConfigFile) -> Result<Self, Self::Error> {
        let address = file_config
            .address
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        // Without an explicit port the server listens where the redirect points.
        let port = file_config
            .port
            .or_else(|| file_config.redirect_uri.as_deref().and_then(redirect_port))
            .unwrap_or(DEFAULT_PORT);
        let redirect_uri = file_config
            .redirect_uri
            .unwrap_or_else(|| format!("http://{}:{}{}", address, port, CALLBACK_PATH));
        Ok(SoundspaceConfig {
            address,
            port,
            client_id: file_config.client_id.ok_or(ConfigError::MissingClientId)?,
            client_secret: file_config
                .client_secret
                .ok_or(ConfigError::MissingClientSecret)?,
            redirect_uri,
            token_path: file_config
                .token_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH)),
            market: file_config
                .market
                .unwrap_or_else(|| DEFAULT_MARKET.to_string()),
            device_name: file_config
                .device_name
                .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string()),
            endpoints: Endpoints::new(
                file_config
                    .accounts_url
                    .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
                file_config
                    .api_url
                    .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            ),
        })
    }
}

impl SoundspaceConfigFile {
    /// Reads the config file. A missing file yields an empty config so that
    /// credentials can come from the environment alone.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(SoundspaceConfigFile::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Applies environment overrides through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = lookup(CLIENT_ID_VAR) {
            self.client_id = Some(client_id);
        }
        if let Some(client_secret) = lookup(CLIENT_SECRET_VAR) {
            self.client_secret = Some(client_secret);
        }
        if let Some(redirect_uri) = lookup(REDIRECT_URI_VAR) {
            self.redirect_uri = Some(redirect_uri);
        }
        self
    }
}

fn redirect_port(redirect_uri: &str) -> Option<u16> {
    Url::parse(redirect_uri).ok()?.port_or_known_default()
}

impl SoundspaceConfig {
    /// Whether the redirect uri reaches the local callback server.
    pub fn redirect_reaches_server(&self) -> bool {
        match Url::parse(&self.redirect_uri) {
            Ok(url) => url.port_or_known_default() == Some(self.port) && url.path() == CALLBACK_PATH,
            Err(_) => false,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        SoundspaceConfigFile::read(path)?
            .with_overrides(|key| std::env::var(key).ok())
            .try_into()
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}
