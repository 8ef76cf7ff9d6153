//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, background task events and a frame tick that
//! drives the reveal animations and the search debounce.

use crate::app::{App, AppEvent};
use crate::feed::FeedClient;
use anyhow::Result;
use crossterm::{
    event::{Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::input::handle_input;
use super::render::{list_area, render};

/// Frame period while anything is animating (~30 fps).
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// Tick period when the view is at rest.
const IDLE_INTERVAL: Duration = Duration::from_millis(250);

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Runs the TUI application event loop.
///
/// Uses `tokio::select!` over:
/// - **Signals**: SIGTERM/SIGINT shut down gracefully
/// - **Terminal input**: crossterm's async event stream
/// - **Background tasks**: fetch and probe results via the `AppEvent` channel
/// - **Frame tick**: animations, debounced search, status expiry
///
/// Installs a panic hook that restores the terminal before unwinding.
pub async fn run(
    app: &mut App,
    client: &FeedClient,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();

    let mut period = FRAME_INTERVAL;
    let mut frame = tick_interval(period, Duration::ZERO);
    let mut last_frame = Instant::now();
    let mut animating = true;

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        if app.needs_redraw {
            let size = terminal.size()?;
            let list = list_area(Rect::new(0, 0, size.width, size.height));
            app.set_list_area(list.width, list.height);
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        // Drain pending results before handling more input
        while let Ok(event) = event_rx.try_recv() {
            handle_app_event(app, event);
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.needs_redraw = true;
                        let action =
                            handle_input(app, key.code, key.modifiers, client, &event_tx);
                        if let Action::Quit = action {
                            break;
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                    Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                    None => break,
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                handle_app_event(app, event);
            }

            _ = frame.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame);
                last_frame = now;
                animating = handle_tick(app, dt);
            }
        }

        let next = frame_period(app, animating);
        if next != period {
            tracing::trace!(period_ms = next.as_millis() as u64, "Frame period changed");
            period = next;
            frame = tick_interval(period, period);
            // Input may have started motion that the next tick must pick up
            animating = true;
        }
    }

    app.reveal.dispose();
    restore_terminal(terminal)?;
    Ok(())
}

/// Returns whether any animation is still moving.
fn handle_tick(app: &mut App, dt: Duration) -> bool {
    let animating = app.tick(dt);
    if app.poll_search() {
        app.needs_redraw = true;
    }
    if app.clear_expired_status() {
        app.needs_redraw = true;
    }
    animating
}

/// Full frame rate while something moves or is about to, the slow tick
/// otherwise.
fn frame_period(app: &App, animating: bool) -> Duration {
    if animating || app.needs_redraw || app.is_loading() || app.debounce.is_pending() {
        FRAME_INTERVAL
    } else {
        IDLE_INTERVAL
    }
}

fn tick_interval(period: Duration, first_in: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + first_in, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state.
fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
