use serde::{Deserialize, Serialize};

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Base URLs of the accounts service and the Web API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Endpoints {
    pub accounts: String,
    pub api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            accounts: DEFAULT_ACCOUNTS_URL.to_string(),
            api: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn new(accounts: impl Into<String>, api: impl Into<String>) -> Self {
        Endpoints {
            accounts: accounts.into().trim_end_matches('/').to_string(),
            api: api.into().trim_end_matches('/').to_string(),
        }
    }
}

#[macro_export]
macro_rules! authorization_endpoint {
    ( $base: expr, $( $x: expr),+ ) => {{
        format!("{}{}", $base.accounts, format_args!($($x),+))
    }};
}

#[macro_export]
macro_rules! api_endpoint {
    ( $base: expr, $( $x: expr),+ ) => {{
        format!("{}{}", $base.api, format_args!($($x),+))
    }};
}
