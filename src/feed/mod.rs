//! Feed acquisition and the article list model.
//!
//! - [`client`] - HTTP client for the RSS-to-JSON translation endpoint
//! - [`state`] - Article list with reset/append semantics and the loading flag
//! - [`types`] - The [`Article`] value type and the provider wire format
//!
//! # Example
//!
//! ```ignore
//! use scrollfeed::feed::{fetch_batch, FeedClient, FeedState};
//!
//! let mut state = FeedState::default();
//! let added = fetch_batch(&mut state, &client, true).await?;
//! ```

mod client;
mod state;
mod types;

pub use client::{FeedClient, FetchError, DEFAULT_ENDPOINT, DEFAULT_FEED_URL};
pub use state::FeedState;
pub use types::{parse_timestamp, Article};

/// Fetch one batch and apply it to `state`.
///
/// `loading` is true for the duration of the call and false afterwards,
/// whatever the outcome. With `reset` the batch replaces the list, otherwise
/// it is appended. Returns the number of articles added.
///
/// A call made while another fetch is in flight returns `Ok(0)` without
/// touching the network.
pub async fn fetch_batch(
    state: &mut FeedState,
    client: &FeedClient,
    reset: bool,
) -> Result<usize, FetchError> {
    if !state.begin_fetch() {
        tracing::debug!("Fetch already in flight, ignoring request");
        return Ok(0);
    }
    let result = client.fetch_batch().await;
    state.settle(reset, result)
}
