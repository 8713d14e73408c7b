use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::endpoints::Endpoints;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Spotify responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("No playback device is ready.")]
    NoDevice,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Web API access on behalf of the signed-in user.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    endpoints: Endpoints,
    access_token: String,
    market: String,
}

impl ApiClient {
    pub fn new(
        http: Client,
        endpoints: Endpoints,
        access_token: impl Into<String>,
        market: impl Into<String>,
    ) -> Self {
        ApiClient {
            http,
            endpoints,
            access_token: access_token.into(),
            market: market.into(),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn authorize(&self, request_builder: RequestBuilder) -> RequestBuilder {
        request_builder.bearer_auth(self.access_token.as_str())
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let resp = self.execute(Method::GET, url, query, None).await?;
        Ok(resp.json::<T>().await?)
    }

    /// Like [`get_json`](Self::get_json) but maps `204 No Content` to `None`.
    pub async fn get_optional_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ApiError> {
        let resp = self.execute(Method::GET, url, query, None).await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(resp.json::<T>().await?))
    }

    pub async fn send_command(
        &self,
        method: Method,
        url: String,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<(), ApiError> {
        self.execute(method, url, query, body).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: Method,
        url: String,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<Response, ApiError> {
        tracing::trace!(%method, %url, "API request");
        let mut request_builder = self.authorize(self.http.request(method, url)).query(query);
        if let Some(body) = body {
            request_builder = request_builder.json(&body);
        }
        let request = request_builder.build()?;
        let resp = self.http.execute(request).await?;
        check_status(resp).await
    }
}

async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.error.message,
        Err(_) => text,
    };
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
