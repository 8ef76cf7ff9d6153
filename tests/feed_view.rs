//! Integration tests for the feed view: fetch against a mock provider, apply
//! to the view, and check the reveal subscriptions that follow.

use pretty_assertions::assert_eq;
use scrollfeed::app::App;
use scrollfeed::config::Config;
use scrollfeed::feed::{fetch_batch, FeedClient, FeedState};
use scrollfeed::reveal::{CapabilityFlag, CapabilityUnavailable, Phase, ScrollDriver};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FRAME: Duration = Duration::from_millis(16);

fn provider_body(items: &[(&str, &str)]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = items
        .iter()
        .map(|(title, link)| {
            serde_json::json!({
                "title": title,
                "description": "Summary of the day",
                "link": link,
                "thumbnail": "",
                "pubDate": "2025-01-15 10:30:00"
            })
        })
        .collect();
    serde_json::json!({
        "status": "ok",
        "feed": { "title": "Markets" },
        "items": items
    })
}

async fn mock_provider(items: &[(&str, &str)]) -> (MockServer, FeedClient) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/api.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_body(items)))
        .mount(&server)
        .await;
    let client = FeedClient::new(
        reqwest::Client::new(),
        &format!("{}/v1/api.json", server.uri()),
        "https://news.example.com/rss.xml",
        Duration::from_secs(5),
    )
    .unwrap();
    (server, client)
}

async fn load(app: &mut App, client: &FeedClient, reset: bool) {
    assert!(app.begin_fetch());
    let result = client.fetch_batch().await;
    app.apply_fetch(reset, result);
}

fn run_frames(app: &mut App, total: Duration) {
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        app.tick(FRAME);
        elapsed += FRAME;
    }
}

// ============================================================================
// Fetch lifecycle
// ============================================================================

#[tokio::test]
async fn test_reset_then_append_grows_list() {
    let (_server, client) = mock_provider(&[
        ("Stocks rally", "https://news.example.com/a"),
        ("Oil slips", "https://news.example.com/b"),
    ])
    .await;
    let mut state = FeedState::default();

    let added = fetch_batch(&mut state, &client, true).await.unwrap();
    assert_eq!(added, 2);
    assert!(!state.loading);

    let added = fetch_batch(&mut state, &client, false).await.unwrap();
    assert_eq!(added, 2);
    assert_eq!(state.articles.len(), 4);
    assert_eq!(state.articles[0].title, "Stocks rally");
    assert_eq!(state.articles[2].title, "Stocks rally");
    assert_eq!(state.articles[0].source_name, "Markets");
    assert_eq!(state.articles[0].description.as_deref(), Some("Summary of the day"));
    assert!(!state.loading);
}

#[tokio::test]
async fn test_failed_fetch_keeps_articles() {
    let (server, client) = mock_provider(&[("Stocks rally", "https://news.example.com/a")]).await;
    let mut state = FeedState::default();
    fetch_batch(&mut state, &client, true).await.unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = fetch_batch(&mut state, &client, true).await;
    assert!(result.is_err());
    assert_eq!(state.articles.len(), 1);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_concurrent_fetch_is_refused() {
    let (_server, client) = mock_provider(&[("Stocks rally", "https://news.example.com/a")]).await;
    let mut state = FeedState::default();
    assert!(state.begin_fetch());

    let added = fetch_batch(&mut state, &client, true).await.unwrap();
    assert_eq!(added, 0);
    assert!(state.articles.is_empty());
    assert!(state.loading);
}

// ============================================================================
// Reveal across the view
// ============================================================================

#[tokio::test]
async fn test_fallback_reveals_every_card_once() {
    let (_server, client) = mock_provider(&[
        ("Stocks rally", "https://news.example.com/a"),
        ("Oil slips", "https://news.example.com/b"),
    ])
    .await;
    let mut app = App::new(&Config::default());
    app.set_list_area(80, 18);
    load(&mut app, &client, true).await;

    // Nothing animates before the probe settles
    run_frames(&mut app, Duration::from_millis(500));
    let first = app.handles()[0].key.clone();
    assert_eq!(app.reveal.phase(&first), Some(Phase::Pending));

    app.resolve_capability(Err(CapabilityUnavailable::new("no driver")));
    assert_eq!(app.capability(), CapabilityFlag::Unavailable);
    run_frames(&mut app, Duration::from_secs(3));

    for handle in app.handles() {
        assert_eq!(app.reveal.phase(&handle.key), Some(Phase::Revealed));
        assert_eq!(app.reveal.reveal_count(&handle.key), 1);
    }
    // Fired cards are unobserved
    assert_eq!(app.reveal.active_subscriptions(), 0);
}

#[tokio::test]
async fn test_new_list_replaces_subscriptions() {
    let (server, client) = mock_provider(&[
        ("A", "https://news.example.com/a"),
        ("B", "https://news.example.com/b"),
        ("C", "https://news.example.com/c"),
    ])
    .await;
    let mut app = App::new(&Config::default());
    app.set_list_area(80, 40);
    app.resolve_capability(Ok(ScrollDriver::new()));
    load(&mut app, &client, true).await;
    assert_eq!(app.reveal.active_subscriptions(), 3);

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_body(&[(
            "X",
            "https://news.example.com/x",
        )])))
        .mount(&server)
        .await;
    load(&mut app, &client, true).await;

    assert_eq!(app.visible().len(), 1);
    assert_eq!(app.reveal.handle_count(), 1);
    assert_eq!(app.reveal.active_subscriptions(), 1);
}

#[tokio::test]
async fn test_reload_with_same_urls_recreates_handles() {
    let (_server, client) = mock_provider(&[
        ("A", "https://news.example.com/a"),
        ("B", "https://news.example.com/b"),
        ("C", "https://news.example.com/c"),
    ])
    .await;
    let mut app = App::new(&Config::default());
    app.set_list_area(80, 40);
    app.resolve_capability(Err(CapabilityUnavailable::new("no driver")));
    load(&mut app, &client, true).await;
    run_frames(&mut app, Duration::from_secs(3));
    let first = app.handles()[0].key.clone();
    assert_eq!(app.reveal.phase(&first), Some(Phase::Revealed));

    load(&mut app, &client, true).await;

    assert_eq!(app.handles()[0].key, first);
    assert_eq!(app.reveal.phase(&first), Some(Phase::Pending));
    assert_eq!(app.reveal.active_subscriptions(), 3);

    run_frames(&mut app, Duration::from_secs(3));
    for handle in app.handles() {
        assert_eq!(app.reveal.reveal_count(&handle.key), 1);
    }
}

#[tokio::test]
async fn test_append_keeps_keys_unique() {
    let (_server, client) = mock_provider(&[
        ("A", "https://news.example.com/a"),
        ("B", "https://news.example.com/b"),
    ])
    .await;
    let mut app = App::new(&Config::default());
    app.set_list_area(80, 40);
    load(&mut app, &client, true).await;
    load(&mut app, &client, false).await;

    let mut keys: Vec<String> = app.handles().iter().map(|h| h.key.to_string()).collect();
    assert_eq!(keys.len(), 4);
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 4);
    assert_eq!(app.reveal.handle_count(), 4);
}

#[tokio::test]
async fn test_search_narrows_rendered_cards() {
    let (_server, client) = mock_provider(&[
        ("Stocks rally", "https://news.example.com/a"),
        ("Oil slips", "https://news.example.com/b"),
    ])
    .await;
    let mut app = App::new(&Config::default());
    app.set_list_area(80, 40);
    app.resolve_capability(Ok(ScrollDriver::new()));
    load(&mut app, &client, true).await;

    app.enter_search();
    for c in "OIL".chars() {
        app.search_push(c);
    }
    app.commit_search();

    assert_eq!(app.visible().len(), 1);
    assert_eq!(app.visible()[0].title, "Oil slips");
    assert_eq!(app.reveal.active_subscriptions(), 1);

    app.cancel_search();
    assert_eq!(app.visible().len(), 2);
}
