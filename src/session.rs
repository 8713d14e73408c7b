//! Authentication state shared by the CLI and the callback server.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use reqwest::{Client, Url};

use crate::authorize::{self, AuthorizeError};
use crate::client::ApiClient;
use crate::config::SoundspaceConfig;
use crate::storage::{now_millis, StorageError, TokenStore};
use crate::user_info::{self, User};

pub struct Session {
    config: SoundspaceConfig,
    http: Client,
    tokens: Mutex<TokenStore>,
    user: RwLock<Option<User>>,
}

impl Session {
    pub fn new(config: SoundspaceConfig, tokens: TokenStore) -> Self {
        Self::with_client(config, tokens, Client::new())
    }

    pub fn with_client(config: SoundspaceConfig, tokens: TokenStore, http: Client) -> Self {
        Session {
            config,
            http,
            tokens: Mutex::new(tokens),
            user: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &SoundspaceConfig {
        &self.config
    }

    fn tokens(&self) -> MutexGuard<'_, TokenStore> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    pub fn user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().is_authenticated()
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.tokens().expires_at()
    }

    pub fn login_url(&self, state: &str) -> Result<Url, AuthorizeError> {
        authorize::authorize_url(&self.config, state)
    }

    /// Exchanges the callback code and stores the resulting tokens.
    pub async fn handle_auth_callback(&self, code: &str) -> bool {
        tracing::info!("Exchanging authorization code for access token");
        let access = match authorize::exchange_code(&self.http, &self.config, code).await {
            Ok(access) => access,
            Err(err) => {
                tracing::error!(error = %err, "Spotify auth error");
                return false;
            }
        };
        let saved = self.tokens().save(&access, now_millis());
        match saved {
            Ok(()) => {
                tracing::info!("Successfully obtained access token");
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "Could not persist tokens");
                false
            }
        }
    }

    pub async fn refresh_tokens(&self) -> Result<(), AuthorizeError> {
        let refresh_token = self
            .tokens()
            .refresh_token()
            .ok_or(AuthorizeError::MissingRefreshToken)?;
        let access =
            authorize::refresh_access_token(&self.http, &self.config, &refresh_token).await?;
        self.tokens().save(&access, now_millis())?;
        tracing::info!("Access token refreshed");
        Ok(())
    }

    /// An authorized API client, unless the stored token is missing or expired.
    pub fn api_client(&self) -> Option<ApiClient> {
        let tokens = self.tokens();
        if !tokens.is_authenticated() {
            return None;
        }
        let access_token = tokens.access_token()?;
        Some(ApiClient::new(
            self.http.clone(),
            self.config.endpoints.clone(),
            access_token,
            self.config.market.clone(),
        ))
    }

    /// Re-reads the stored tokens and reloads the user. A session whose user
    /// cannot be fetched is treated as signed out.
    pub async fn refresh_auth_state(&self) -> bool {
        let Some(client) = self.api_client() else {
            self.set_user(None);
            return false;
        };
        match user_info::get_user_info(&client).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Authenticated");
                self.set_user(Some(user));
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "Error fetching user data");
                self.set_user(None);
                false
            }
        }
    }

    pub async fn refresh_user(&self) -> Option<User> {
        let client = self.api_client()?;
        let user = user_info::current_user(&client).await;
        self.set_user(user.clone());
        user
    }

    pub fn logout(&self) -> Result<(), StorageError> {
        self.tokens().clear()?;
        self.set_user(None);
        tracing::info!("Logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorize::Access;
    use crate::config::SoundspaceConfigFile;

    fn session() -> Session {
        let config = SoundspaceConfig::try_from(SoundspaceConfigFile {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            ..Default::default()
        })
        .unwrap();
        Session::new(config, TokenStore::in_memory())
    }

    fn grant(expires_in: i64) -> Access {
        Access {
            access_token: "token".into(),
            token_type: "Bearer".into(),
            scope: String::new(),
            expires_in,
            refresh_token: Some("refresh".into()),
        }
    }

    #[test]
    fn no_client_without_tokens() {
        let session = session();
        assert!(!session.is_authenticated());
        assert!(session.api_client().is_none());
    }

    #[test]
    fn no_client_once_expired() {
        let session = session();
        session.tokens().save(&grant(60), 0).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.api_client().is_none());
    }

    #[test]
    fn client_uses_configured_market() {
        let session = session();
        session.tokens().save(&grant(3600), now_millis()).unwrap();
        let client = session.api_client().unwrap();
        assert_eq!(client.market(), "US");
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_fails() {
        let session = session();
        let err = session.refresh_tokens().await.unwrap_err();
        assert!(matches!(err, AuthorizeError::MissingRefreshToken));
    }

    #[tokio::test]
    async fn auth_state_is_false_when_signed_out() {
        let session = session();
        assert!(!session.refresh_auth_state().await);
        assert!(session.user().is_none());
    }
}
