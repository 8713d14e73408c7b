use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use reqwest::{Client, Request, Url};
use rocket::response::content::RawHtml;
use rocket::response::status::BadRequest;
use rocket::response::Redirect;
use rocket::{get, routes, Build, Rocket, Shutdown, State};
use serde::Deserialize;
use thiserror::Error;

use crate::authorization_endpoint;
use crate::config::SoundspaceConfig;
use crate::session::Session;
use crate::storage::StorageError;

pub const AUTHORIZATION_SCOPES: &str = "user-read-private user-read-email user-top-read \
user-read-recently-played user-follow-read playlist-read-private playlist-read-collaborative \
user-library-read user-read-playback-state user-modify-playback-state streaming";

/// Token grant returned by the accounts service.
#[derive(Debug, Clone, Deserialize)]
pub struct Access {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthorizeError {
    #[error("Have not received user authorization yet.")]
    NoUserAuthCode,
    #[error("No refresh token stored, log in again.")]
    MissingRefreshToken,
    #[error("Failed to exchange code for token: {0}")]
    TokenExchange(String),
    #[error("Invalid accounts URL: {0}")]
    InvalidUrl(String),
    #[error("Request error: {0}")]
    RequestError(reqwest::Error),
    #[error("Could not store tokens: {0}")]
    Storage(StorageError),
}

impl From<reqwest::Error> for AuthorizeError {
    fn from(err: reqwest::Error) -> Self {
        AuthorizeError::RequestError(err)
    }
}

impl From<StorageError> for AuthorizeError {
    fn from(err: StorageError) -> Self {
        AuthorizeError::Storage(err)
    }
}

pub fn random_state() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

/// The URL the user is sent to in order to grant access.
pub fn authorize_url(config: &SoundspaceConfig, state: &str) -> Result<Url, AuthorizeError> {
    Url::parse_with_params(
        &authorization_endpoint!(config.endpoints, "/authorize"),
        &[
            ("response_type", "code"),
            ("client_id", config.client_id.as_str()),
            ("scope", AUTHORIZATION_SCOPES),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("show_dialog", "true"),
            ("state", state),
        ],
    )
    .map_err(|err| AuthorizeError::InvalidUrl(err.to_string()))
}

fn token_request(
    http: &Client,
    config: &SoundspaceConfig,
    form: &[(&str, &str)],
) -> Result<Request, AuthorizeError> {
    Ok(http
        .post(authorization_endpoint!(config.endpoints, "/api/token"))
        .form(form)
        .basic_auth(config.client_id.as_str(), Some(config.client_secret()))
        .build()?)
}

async fn execute_token_request(http: &Client, request: Request) -> Result<Access, AuthorizeError> {
    let resp = http.execute(request).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let reason = match serde_json::from_str::<TokenErrorBody>(&body) {
            Ok(err) => err.error_description.unwrap_or(err.error),
            Err(_) => format!("{} {}", status.as_u16(), body),
        };
        tracing::error!(status = status.as_u16(), %reason, "Token request failed");
        return Err(AuthorizeError::TokenExchange(reason));
    }
    Ok(resp.json::<Access>().await?)
}

pub async fn exchange_code(
    http: &Client,
    config: &SoundspaceConfig,
    code: &str,
) -> Result<Access, AuthorizeError> {
    if code.is_empty() {
        return Err(AuthorizeError::NoUserAuthCode);
    }
    let request = token_request(
        http,
        config,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
        ],
    )?;
    execute_token_request(http, request).await
}

pub async fn refresh_access_token(
    http: &Client,
    config: &SoundspaceConfig,
    refresh_token: &str,
) -> Result<Access, AuthorizeError> {
    let request = token_request(
        http,
        config,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )?;
    execute_token_request(http, request).await
}

/// Anti-forgery value for one run of the callback server.
pub struct LoginState(pub String);

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn failure_page(message: &str) -> BadRequest<RawHtml<String>> {
    BadRequest(RawHtml(format!(
        "<!doctype html>\n<html>\n<head><title>SoundSpace</title></head>\n<body>\n\
         <h1>Connection failed</h1>\n<p>{}</p>\n<p><a href=\"/login\">Try again</a></p>\n\
         </body>\n</html>\n",
        escape_html(message)
    )))
}

#[get("/")]
pub fn index(session: &State<Arc<Session>>) -> Redirect {
    if session.is_authenticated() {
        Redirect::to("/done")
    } else {
        Redirect::to("/login")
    }
}

#[get("/login")]
pub fn login(
    session: &State<Arc<Session>>,
    login_state: &State<LoginState>,
) -> Result<Redirect, BadRequest<RawHtml<String>>> {
    match session.login_url(&login_state.0) {
        Ok(url) => Ok(Redirect::to(url.to_string())),
        Err(err) => Err(failure_page(&err.to_string())),
    }
}

#[get("/auth/callback?<code>&<error>&<state>")]
pub async fn callback(
    session: &State<Arc<Session>>,
    login_state: &State<LoginState>,
    code: Option<String>,
    error: Option<String>,
    state: Option<String>,
) -> Result<Redirect, BadRequest<RawHtml<String>>> {
    if let Some(error) = error {
        tracing::warn!(%error, "User declined or Spotify reported an error");
        return Err(failure_page(&format!(
            "Spotify authentication failed: {}",
            error
        )));
    }
    if state.as_deref() != Some(login_state.0.as_str()) {
        tracing::warn!(?state, "Callback state does not match");
        return Err(failure_page("Invalid login state, please start over"));
    }
    let Some(code) = code else {
        return Err(failure_page("No authorization code received"));
    };
    if !session.handle_auth_callback(&code).await {
        return Err(failure_page("Failed to authenticate with Spotify"));
    }
    session.refresh_auth_state().await;
    Ok(Redirect::to("/done"))
}

#[get("/done")]
pub fn done(session: &State<Arc<Session>>, shutdown: Shutdown) -> Result<String, Redirect> {
    if !session.is_authenticated() {
        return Err(Redirect::to("/login"));
    }
    let name = session
        .user()
        .and_then(|user| user.display_name)
        .unwrap_or_else(|| "your account".to_string());
    shutdown.notify();
    Ok(format!(
        "Connected to Spotify as {}. The login server is stopping, you can close this window now.",
        name
    ))
}

/// Local web server that completes the authorization-code flow.
pub fn callback_server(session: Arc<Session>, login_state: LoginState) -> Rocket<Build> {
    let config = session.config();
    if !config.redirect_reaches_server() {
        tracing::warn!(
            redirect_uri = %config.redirect_uri,
            address = %config.address,
            port = config.port,
            "Redirect uri does not point at the callback server"
        );
    }
    let figment = rocket::Config::figment()
        .merge(("address", config.address))
        .merge(("port", config.port))
        .merge(("log_level", rocket::config::LogLevel::Critical));
    rocket::custom(figment)
        .manage(session)
        .manage(login_state)
        .mount("/", routes![index, login, callback, done])
}
