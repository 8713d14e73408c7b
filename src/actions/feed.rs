//! Feed items: tracks from several library sources merged into one list.

use std::collections::HashSet;
use std::fmt::Display;

use serde::Serialize;

use crate::actions::library::{recently_played, top_tracks, TimeRange};
use crate::actions::recommendations::recommendations;
use crate::actions::releases::new_releases_from_followed_artists;
use crate::client::ApiClient;
use crate::models::track::Track;
use crate::user_info::User;

const SOURCE_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    RecentlyPlayed,
    TopTrack,
    Recommendation,
    NewRelease,
}

impl Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::RecentlyPlayed => write!(f, "recently played"),
            FeedSource::TopTrack => write!(f, "top track"),
            FeedSource::Recommendation => write!(f, "recommended"),
            FeedSource::NewRelease => write!(f, "new release"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub id: String,
    pub track: Track,
    pub source: FeedSource,
    /// Who shared the track; `None` for suggestions.
    pub shared_by: Option<String>,
    pub likes: u32,
    pub comments: u32,
    pub is_liked: bool,
}

impl FeedItem {
    pub fn new(track: Track, source: FeedSource, shared_by: Option<String>) -> Self {
        FeedItem {
            id: format!("{}-{}", source_key(source), track.key()),
            track,
            source,
            shared_by,
            likes: 0,
            comments: 0,
            is_liked: false,
        }
    }
}

fn source_key(source: FeedSource) -> &'static str {
    match source {
        FeedSource::RecentlyPlayed => "recent",
        FeedSource::TopTrack => "top",
        FeedSource::Recommendation => "rec",
        FeedSource::NewRelease => "new",
    }
}

/// Interleaves the sources round-robin, keeping the first item seen for
/// each track id (or uri, for local files).
pub fn merge_sources(sources: Vec<Vec<FeedItem>>, limit: usize) -> Vec<FeedItem> {
    let mut iters: Vec<_> = sources.into_iter().map(Vec::into_iter).collect();
    let mut seen = HashSet::new();
    let mut feed = Vec::new();
    loop {
        let mut progressed = false;
        for iter in iters.iter_mut() {
            if let Some(item) = iter.next() {
                progressed = true;
                if seen.insert(item.track.key().to_string()) {
                    feed.push(item);
                }
            }
        }
        if !progressed || feed.len() >= limit {
            break;
        }
    }
    feed.truncate(limit);
    feed
}

fn tag(tracks: Vec<Track>, source: FeedSource, shared_by: Option<&str>) -> Vec<FeedItem> {
    tracks
        .into_iter()
        .map(|track| FeedItem::new(track, source, shared_by.map(str::to_string)))
        .collect()
}

pub async fn build_feed(client: &ApiClient, user: Option<&User>, limit: usize) -> Vec<FeedItem> {
    let (recent, top, recommended, releases) = tokio::join!(
        recently_played(client, SOURCE_LIMIT),
        top_tracks(client, TimeRange::MediumTerm, SOURCE_LIMIT),
        recommendations(client, SOURCE_LIMIT),
        new_releases_from_followed_artists(client, SOURCE_LIMIT),
    );
    let me = user.map(User::name);
    let feed = merge_sources(
        vec![
            tag(recent, FeedSource::RecentlyPlayed, me),
            tag(top, FeedSource::TopTrack, me),
            tag(recommended, FeedSource::Recommendation, None),
            tag(releases, FeedSource::NewRelease, None),
        ],
        limit,
    );
    tracing::debug!(count = feed.len(), "Feed built");
    feed
}
