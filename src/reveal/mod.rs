//! Progressive reveal of feed items as they scroll into view.
//!
//! Two interchangeable strategies animate cards from a hidden state to fully
//! visible:
//!
//! - **Scroll-linked** ([`trigger::ScrollDriver`]): one trigger per card,
//!   played when the card's top crosses 85% of the viewport and reversed when
//!   scrolled back below that line. Starts are staggered by render index.
//! - **Intersection** ([`watcher::IntersectionWatcher`]): a single shared
//!   watcher; each card reveals once on its first qualifying intersection
//!   and is then unobserved.
//!
//! [`capability::CapabilityProbe`] decides which one is used, once, and the
//! [`controller::RevealController`] owns the per-card animation state and
//! the subscription lifecycle across list changes.

pub mod capability;
pub mod controller;
pub mod handle;
pub mod motion;
pub mod strategy;
pub mod trigger;
pub mod watcher;

pub use capability::{acquire_scroll_driver, CapabilityFlag, CapabilityProbe, CapabilityUnavailable};
pub use controller::{Phase, RevealController};
pub use handle::{assign_handles, ArticleKey, Bounds, HandleRegistry, ItemHandle, Viewport};
pub use motion::{Easing, Tween, VisualState};
pub use trigger::{ScrollDriver, ToggleAction, ToggleActions};

use serde::Deserialize;
use std::time::Duration;

/// Tunables for both reveal strategies and the hover micro-interaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Reveal tween length.
    pub duration_secs: f32,
    /// Per-index start delay.
    pub stagger_secs: f32,
    /// Scroll-linked start line, as a fraction of viewport height from the top.
    pub start_ratio: f32,
    /// Scroll-linked end line.
    pub end_ratio: f32,
    /// onEnter, onLeave, onEnterBack, onLeaveBack.
    pub toggle_actions: ToggleActions,
    /// Fallback: minimum visible fraction.
    pub threshold: f32,
    /// Fallback: rows cut from the bottom of the viewport.
    pub bottom_margin_rows: u32,
    pub hover_scale: f32,
    pub hover_duration_secs: f32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            duration_secs: 1.2,
            stagger_secs: 0.1,
            start_ratio: 0.85,
            end_ratio: 0.2,
            toggle_actions: ToggleActions::default(),
            threshold: 0.1,
            bottom_margin_rows: 2,
            hover_scale: 1.02,
            hover_duration_secs: 0.3,
        }
    }
}

fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::ZERO)
}

impl RevealConfig {
    pub fn duration(&self) -> Duration {
        secs(self.duration_secs)
    }

    pub fn stagger(&self) -> Duration {
        secs(self.stagger_secs)
    }

    pub fn hover_duration(&self) -> Duration {
        secs(self.hover_duration_secs)
    }
}
