//! Keyboard input handling.
//!
//! Search mode captures every key until Esc or Enter; otherwise keys drive
//! navigation and fetches.

use crate::app::{App, AppEvent};
use crate::feed::FeedClient;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{open_selected, spawn_fetch};
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    client: &FeedClient,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if app.search_mode {
        handle_search_input(app, code);
        return Action::Continue;
    }

    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('/') => app.enter_search(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::PageDown | KeyCode::Char(' ') => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('o') | KeyCode::Enter => open_selected(app),
        KeyCode::Char('r') => {
            if !spawn_fetch(app, client, true, event_tx) {
                app.set_status("Already loading...");
            }
        }
        KeyCode::Char('m') => {
            if !spawn_fetch(app, client, false, event_tx) {
                app.set_status("Already loading...");
            }
        }
        KeyCode::Esc if !app.feed.search_term.is_empty() => app.cancel_search(),
        _ => {}
    }
    Action::Continue
}

fn handle_search_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.commit_search(),
        KeyCode::Backspace => app.search_backspace(),
        KeyCode::Char(c) => {
            app.search_push(c);
        }
        _ => {}
    }
}
