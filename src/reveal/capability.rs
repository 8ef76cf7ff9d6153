use super::trigger::ScrollDriver;
use std::future::Future;
use std::io::IsTerminal;
use thiserror::Error;

/// The scroll-linked driver could not be acquired.
///
/// Expected in plenty of environments; it selects the fallback strategy and
/// is never shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Scroll-linked driver unavailable: {reason}")]
pub struct CapabilityUnavailable {
    pub reason: String,
}

impl CapabilityUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Outcome of probing for the scroll-linked driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityFlag {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

/// One-shot capability detection.
///
/// [`CapabilityProbe::begin`] succeeds once per probe; [`CapabilityProbe::resolve`]
/// accepts the first outcome and ignores any later one.
#[derive(Debug, Default)]
pub struct CapabilityProbe {
    started: bool,
    flag: CapabilityFlag,
}

impl CapabilityProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&self) -> CapabilityFlag {
        self.flag
    }

    /// Claim the single probe run. Returns false if it was already claimed.
    pub fn begin(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    /// Record the acquisition outcome.
    ///
    /// Returns the outcome for the controller to commit to, or `None` if the
    /// probe had already resolved.
    pub fn resolve(
        &mut self,
        outcome: Result<ScrollDriver, CapabilityUnavailable>,
    ) -> Option<Result<ScrollDriver, CapabilityUnavailable>> {
        if self.flag != CapabilityFlag::Unknown {
            tracing::debug!("Capability already resolved, ignoring late outcome");
            return None;
        }
        self.started = true;
        match &outcome {
            Ok(_) => {
                self.flag = CapabilityFlag::Available;
                tracing::info!("Scroll-linked driver registered");
            }
            Err(e) => {
                self.flag = CapabilityFlag::Unavailable;
                tracing::debug!(
                    reason = %e.reason,
                    "Scroll-linked driver unavailable, using intersection fallback"
                );
            }
        }
        Some(outcome)
    }

    /// Run `acquire` and resolve with its outcome, at most once.
    pub async fn probe<F>(
        &mut self,
        acquire: F,
    ) -> Option<Result<ScrollDriver, CapabilityUnavailable>>
    where
        F: Future<Output = Result<ScrollDriver, CapabilityUnavailable>>,
    {
        if !self.begin() {
            return None;
        }
        self.resolve(acquire.await)
    }
}

/// Try to acquire the scroll-linked driver for the current terminal.
///
/// Runs the environment checks on a blocking task. Any failure, including a
/// panicked or cancelled check, comes back as [`CapabilityUnavailable`].
pub async fn acquire_scroll_driver(enabled: bool) -> Result<ScrollDriver, CapabilityUnavailable> {
    if !enabled {
        return Err(CapabilityUnavailable::new("disabled by configuration"));
    }

    tokio::task::spawn_blocking(|| {
        if !std::io::stdout().is_terminal() {
            return Err(CapabilityUnavailable::new("stdout is not a terminal"));
        }
        if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
            return Err(CapabilityUnavailable::new("TERM=dumb"));
        }
        crossterm::terminal::size()
            .map_err(|e| CapabilityUnavailable::new(format!("terminal size unreadable: {}", e)))?;
        Ok(ScrollDriver::new())
    })
    .await
    .unwrap_or_else(|e| Err(CapabilityUnavailable::new(format!("probe task failed: {}", e))))
}
