//! Terminal User Interface module.
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Frame layout and the animated header
//! - `cards` - Article card list with reveal visuals
//! - `status` - Status bar widget
//! - `helpers` - Task spawning and formatting helpers

mod cards;
mod events;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;

pub use helpers::{format_relative_time, spawn_fetch, spawn_probe};
pub use loop_runner::{run, Action};
