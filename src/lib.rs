//! A terminal news feed with live search and scroll-driven reveal animation.
//!
//! - [`feed`] - fetching and normalising articles from an RSS-to-JSON endpoint
//! - [`search`] - memoized, debounced substring filter
//! - [`reveal`] - capability-probed progressive reveal of rendered cards
//! - [`app`] - the feed view state composing the above
//! - [`ui`] - ratatui rendering and the event loop

pub mod app;
pub mod config;
pub mod feed;
pub mod reveal;
pub mod search;
pub mod ui;
pub mod util;
