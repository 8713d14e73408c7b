//! Library queries: degradation to empty results, releases and recommendations.

mod common;

use serde_json::json;
use soundspace::actions::artists::tracks_from_top_artists;
use soundspace::actions::feed::{build_feed, FeedSource};
use soundspace::actions::library::{recently_played, top_tracks, TimeRange};
use soundspace::actions::recommendations::recommendations;
use soundspace::actions::releases::{new_releases_from_followed_artists, popular_new_releases};
use soundspace::user_info::{current_user, User};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{api_client, artist_json, local_track_json, track_json, user_json};

fn ids(tracks: &[soundspace::models::track::Track]) -> Vec<&str> {
    tracks.iter().map(|track| track.key()).collect()
}

#[tokio::test]
async fn top_tracks_pass_range_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .and(query_param("time_range", "short_term"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_json("t1", &[]), track_json("t2", &[])]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = top_tracks(&api_client(&server), TimeRange::ShortTerm, 2).await;
    assert_eq!(ids(&tracks), ["t1", "t2"]);
}

#[tokio::test]
async fn failures_degrade_to_empty_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = api_client(&server);
    assert!(top_tracks(&client, TimeRange::MediumTerm, 20).await.is_empty());
    assert!(recently_played(&client, 20).await.is_empty());
    assert!(popular_new_releases(&client, 20).await.is_empty());
    assert!(current_user(&client).await.is_none());
}

#[tokio::test]
async fn current_user_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(&server)
        .await;

    let user = current_user(&api_client(&server)).await.unwrap();
    assert_eq!(user.id, "listener");
    assert_eq!(user.product.as_deref(), Some("premium"));
}

#[tokio::test]
async fn popular_new_releases_expand_first_albums() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/browse/new-releases"))
        .and(query_param("market", "US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "albums": { "items": [
                { "id": "al1", "name": "First" },
                { "id": "al2", "name": "Second" }
            ] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/albums/al1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_json("x1", &[]), null, track_json("x2", &[])]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/albums/al2/tracks"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let tracks = popular_new_releases(&api_client(&server), 20).await;
    assert_eq!(ids(&tracks), ["x1", "x2"]);
}

#[tokio::test]
async fn followed_artist_releases_are_topped_up_when_sparse() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/following"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": { "items": [artist_json("a1", "Alpha")] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/artists/a1/albums"))
        .and(query_param("include_groups", "album,single"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "own", "name": "Own Album" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/albums/own/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_json("o1", &[("a1", "Alpha")])]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/browse/new-releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "albums": { "items": [{ "id": "pop", "name": "Popular" }] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/albums/pop/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_json("p1", &[]), track_json("p2", &[]), track_json("p3", &[])]
        })))
        .mount(&server)
        .await;

    let tracks = new_releases_from_followed_artists(&api_client(&server), 3).await;
    assert_eq!(ids(&tracks), ["o1", "p1", "p2"]);
}

#[tokio::test]
async fn recommendations_are_seeded_from_listening() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_json("s1", &[]), track_json("s2", &[])]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/following"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": { "items": [artist_json("a1", "Alpha"), artist_json("a2", "Beta")] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/recommendations"))
        .and(query_param("seed_tracks", "s1,s2"))
        .and(query_param("seed_artists", "a1,a2"))
        .and(query_param("min_popularity", "30"))
        .and(query_param("market", "US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": [track_json("r1", &[])]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = recommendations(&api_client(&server), 10).await;
    assert_eq!(ids(&tracks), ["r1"]);
}

#[tokio::test]
async fn recommendation_errors_degrade_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/v1/(me/.*|recommendations)$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "status": 404, "message": "Not found" }
        })))
        .mount(&server)
        .await;

    assert!(recommendations(&api_client(&server), 10).await.is_empty());
}

#[tokio::test]
async fn local_files_are_kept_in_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/recently-played"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "track": track_json("t1", &[("a1", "Alpha")]) },
                { "track": local_track_json("Take One") }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [local_track_json("Take Two"), track_json("t2", &[])]
        })))
        .mount(&server)
        .await;

    let client = api_client(&server);
    let recent = recently_played(&client, 20).await;
    assert_eq!(ids(&recent), ["t1", "spotify:local:Band:Demo:Take One:200"]);
    assert!(recent[1].is_local);

    let top = top_tracks(&client, TimeRange::MediumTerm, 20).await;
    assert_eq!(ids(&top), ["spotify:local:Band:Demo:Take Two:200", "t2"]);
}

async fn mount_artist_top_tracks(
    server: &MockServer,
    artist: &str,
    response: ResponseTemplate,
    calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/artists/{}/top-tracks", artist)))
        .and(query_param("market", "US"))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

fn tracks_page(ids: &[&str]) -> ResponseTemplate {
    let tracks: Vec<_> = ids.iter().map(|id| track_json(id, &[])).collect();
    ResponseTemplate::new(200).set_body_json(json!({ "tracks": tracks }))
}

#[tokio::test]
async fn top_artist_tracks_take_three_from_the_first_five_artists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/artists"))
        .and(query_param("time_range", "medium_term"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                artist_json("a1", "One"),
                artist_json("a2", "Two"),
                artist_json("a3", "Three"),
                artist_json("a4", "Four"),
                artist_json("a5", "Five"),
                artist_json("a6", "Six")
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;
    mount_artist_top_tracks(&server, "a1", tracks_page(&["x1", "x2", "x3", "x4"]), 2).await;
    mount_artist_top_tracks(&server, "a2", ResponseTemplate::new(500), 2).await;
    mount_artist_top_tracks(&server, "a3", tracks_page(&["y1"]), 2).await;
    mount_artist_top_tracks(&server, "a4", tracks_page(&["z1", "z2"]), 2).await;
    mount_artist_top_tracks(&server, "a5", tracks_page(&["w1"]), 2).await;
    mount_artist_top_tracks(&server, "a6", tracks_page(&["v1"]), 0).await;

    let client = api_client(&server);
    let tracks = tracks_from_top_artists(&client, 20).await;
    assert_eq!(ids(&tracks), ["x1", "x2", "x3", "y1", "z1", "z2", "w1"]);

    let tracks = tracks_from_top_artists(&client, 4).await;
    assert_eq!(ids(&tracks), ["x1", "x2", "x3", "y1"]);
}

#[tokio::test]
async fn top_artist_tracks_are_empty_without_top_artists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/artists"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(tracks_from_top_artists(&api_client(&server), 20).await.is_empty());
}

#[tokio::test]
async fn feed_merges_all_sources_and_attributes_own_listening() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/recently-played"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "track": track_json("r1", &[("a1", "Alpha")]) }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_json("t1", &[]), track_json("r1", &[("a1", "Alpha")])]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/following"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": { "items": [artist_json("a1", "Alpha")] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": [track_json("c1", &[]), track_json("t1", &[])]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/artists/a1/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "al1", "name": "Alpha Album" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/albums/al1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_json("n1", &[("a1", "Alpha")])]
        })))
        .mount(&server)
        .await;

    let user: User = serde_json::from_value(user_json()).unwrap();
    let feed = build_feed(&api_client(&server), Some(&user), 10).await;

    let entries: Vec<_> = feed
        .iter()
        .map(|item| (item.id.as_str(), item.source, item.shared_by.as_deref()))
        .collect();
    assert_eq!(
        entries,
        [
            ("recent-r1", FeedSource::RecentlyPlayed, Some("Listener One")),
            ("top-t1", FeedSource::TopTrack, Some("Listener One")),
            ("rec-c1", FeedSource::Recommendation, None),
            ("new-n1", FeedSource::NewRelease, None),
        ]
    );
    assert!(feed.iter().all(|item| item.likes == 0 && item.comments == 0 && !item.is_liked));
}

#[tokio::test]
async fn feed_without_user_has_no_attribution() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_json("t1", &[])]
        })))
        .mount(&server)
        .await;

    let feed = build_feed(&api_client(&server), None, 10).await;
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].source, FeedSource::TopTrack);
    assert!(feed[0].shared_by.is_none());
}
