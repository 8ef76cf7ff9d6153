//! Background task spawning and small formatting helpers for the UI layer.

use crate::app::{App, AppEvent};
use crate::feed::FeedClient;
use crate::reveal::acquire_scroll_driver;
use crate::util::validate_url;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panicking background task would otherwise vanish and leave the view
/// waiting forever (e.g. `loading` stuck on).
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Start a fetch unless one is already in flight.
///
/// The result comes back as [`AppEvent::FeedLoaded`]. Returns false when the
/// request was ignored.
pub fn spawn_fetch(
    app: &mut App,
    client: &FeedClient,
    reset: bool,
    event_tx: &mpsc::Sender<AppEvent>,
) -> bool {
    if !app.begin_fetch() {
        tracing::debug!(reset, "Fetch already in flight, ignoring request");
        return false;
    }

    let client = client.clone();
    let tx = event_tx.clone();
    tracing::debug!(reset, feed_url = %client.feed_url(), "Spawning feed fetch");

    tokio::spawn(async move {
        let event = match catch_task_panic(client.fetch_batch()).await {
            Ok(result) => AppEvent::FeedLoaded { reset, result },
            Err(error) => {
                tracing::error!(error = %error, "Feed fetch task panicked");
                AppEvent::TaskPanicked {
                    task: "fetch",
                    error,
                }
            }
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send fetch result (receiver dropped)");
        }
    });
    true
}

/// Run the scroll-driver capability probe once, in the background.
pub fn spawn_probe(app: &mut App, enabled: bool, event_tx: &mpsc::Sender<AppEvent>) {
    if !app.probe.begin() {
        return;
    }
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let outcome = acquire_scroll_driver(enabled).await;
        if let Err(e) = tx.send(AppEvent::CapabilityResolved(outcome)).await {
            tracing::warn!(error = %e, "Failed to send capability result (receiver dropped)");
        }
    });
}

/// Open the selected article in the system browser.
pub(super) fn open_selected(app: &mut App) {
    let Some(url) = app.selected_article().map(|a| a.url.clone()) else {
        return;
    };
    // Validate before handing anything to the OS opener
    match validate_url(&url) {
        Err(e) => app.set_status(format!("Refusing to open link: {}", e)),
        Ok(url) => match open::that(url.as_str()) {
            Ok(()) => app.set_status("Opening in browser..."),
            Err(e) => app.set_status(format!("Failed to open browser: {}", e)),
        },
    }
}

/// Publication time relative to `now`.
///
/// Under an hour (or in the future) is "just now", under a day is "Nh ago",
/// anything older is the calendar date. Unparseable timestamps are shown raw.
pub fn format_relative_time(
    published: Option<DateTime<Utc>>,
    raw: &str,
    now: DateTime<Utc>,
) -> String {
    let Some(published) = published else {
        return raw.trim().to_string();
    };

    let hours = (now - published).num_hours();
    if hours < 1 {
        "just now".to_string()
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        published.format("%Y-%m-%d").to_string()
    }
}
