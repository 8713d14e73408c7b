use serde::{Deserialize, Serialize};

use crate::api_endpoint;
use crate::client::{ApiClient, ApiError};
use crate::models::Image;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Followers {
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub followers: Followers,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
}

impl User {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.id.as_str())
    }
}

pub async fn get_user_info(client: &ApiClient) -> Result<User, ApiError> {
    client
        .get_json::<User>(api_endpoint!(client.endpoints(), "/me"), &[])
        .await
}

/// The current user, or `None` when the request fails.
pub async fn current_user(client: &ApiClient) -> Option<User> {
    match get_user_info(client).await {
        Ok(user) => Some(user),
        Err(err) => {
            tracing::error!(error = %err, "Error fetching user");
            None
        }
    }
}
