//! Background task event processing.

use crate::app::{App, AppEvent};

/// Apply one background event to the view.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::FeedLoaded { reset, result } => {
            app.apply_fetch(reset, result);
        }
        AppEvent::CapabilityResolved(outcome) => {
            app.resolve_capability(outcome);
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            if task == "fetch" {
                app.abandon_fetch();
            }
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}
