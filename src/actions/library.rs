use std::fmt::Display;
use std::str::FromStr;

use crate::api_endpoint;
use crate::client::{ApiClient, ApiError};
use crate::models::paging::Page;
use crate::models::track::{PlayHistory, Track};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRange::ShortTerm => write!(f, "short_term"),
            TimeRange::MediumTerm => write!(f, "medium_term"),
            TimeRange::LongTerm => write!(f, "long_term"),
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" | "short_term" => Ok(TimeRange::ShortTerm),
            "medium" | "medium_term" => Ok(TimeRange::MediumTerm),
            "long" | "long_term" => Ok(TimeRange::LongTerm),
            other => Err(format!("unknown time range `{other}`")),
        }
    }
}

pub async fn fetch_top_tracks(
    client: &ApiClient,
    time_range: TimeRange,
    limit: u32,
) -> Result<Vec<Track>, ApiError> {
    let page: Page<Track> = client
        .get_json(
            api_endpoint!(client.endpoints(), "/me/top/tracks"),
            &[
                ("time_range", time_range.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await?;
    Ok(page.items)
}

pub async fn fetch_recently_played(
    client: &ApiClient,
    limit: u32,
) -> Result<Vec<Track>, ApiError> {
    let page: Page<PlayHistory> = client
        .get_json(
            api_endpoint!(client.endpoints(), "/me/player/recently-played"),
            &[("limit", limit.to_string())],
        )
        .await?;
    Ok(page.items.into_iter().map(|item| item.track).collect())
}

/// The user's top tracks; empty when the request fails.
pub async fn top_tracks(client: &ApiClient, time_range: TimeRange, limit: u32) -> Vec<Track> {
    fetch_top_tracks(client, time_range, limit)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, %time_range, "Error fetching top tracks");
            Vec::new()
        })
}

/// Tracks from the listening history, newest first; empty when the request fails.
pub async fn recently_played(client: &ApiClient, limit: u32) -> Vec<Track> {
    fetch_recently_played(client, limit)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "Error fetching recently played");
            Vec::new()
        })
}
