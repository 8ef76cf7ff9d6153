//! Frame layout: header, card list, status bar.

use crate::app::App;
use crate::reveal::VisualState;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{cards, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Title, tagline and a three-row search box.
const HEADER_HEIGHT: u16 = 5;
/// Cards never grow wider than this.
const MAX_LIST_WIDTH: u16 = 88;

struct Regions {
    header: Rect,
    list: Rect,
    status: Rect,
}

fn regions(area: Rect) -> Regions {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Regions {
        header: centered(chunks[0]),
        list: centered(chunks[1]),
        status: chunks[2],
    }
}

fn centered(area: Rect) -> Rect {
    let width = area.width.min(MAX_LIST_WIDTH);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

/// The card list area for a terminal of the given size.
pub(super) fn list_area(area: Rect) -> Rect {
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        return Rect::default();
    }
    regions(area).list
}

/// Main render function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let regions = regions(area);
    render_header(f, app, regions.header);
    cards::render(f, app, regions.list);
    status::render(f, app, regions.status);
}

/// Header with its entrance animation: rows slide in from above while the
/// colours fade up.
fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let visual = app.header.value();
    if visual.opacity < 0.05 {
        return;
    }

    let (title, muted, badge) = header_styles(visual);
    let live = "● Live updates";
    let title_text = "Scrollfeed";
    let gap = (area.width as usize).saturating_sub(title_text.len() + live.chars().count());

    let mut lines = vec![
        Line::from(vec![
            Span::styled(title_text, title),
            Span::raw(" ".repeat(gap)),
            Span::styled(live, badge),
        ]),
        Line::from(Span::styled("Discover the world, spark ideas", muted)),
    ];

    let (query, query_style) = if app.search_mode {
        (format!("{}_", app.search_input), Style::default())
    } else if !app.feed.search_term.is_empty() {
        (app.feed.search_term.clone(), Style::default())
    } else {
        ("Search news... (/)".to_string(), muted)
    };
    let search_border = if app.search_mode {
        Style::default().fg(Color::Cyan)
    } else {
        muted
    };

    // Upward offset: -50 units pushes the top rows out of the header area
    let hidden_rows = ((-visual.y) / 20.0).round().max(0.0) as usize;
    let text_rows = lines.len().saturating_sub(hidden_rows) as u16;
    lines.drain(..hidden_rows.min(lines.len()));
    let text_area = Rect {
        height: area.height.min(text_rows),
        ..area
    };
    f.render_widget(Paragraph::new(lines), text_area);

    // The search box only appears once it has fully slid in
    if hidden_rows <= 2 && area.height >= text_rows + 3 {
        let box_area = Rect {
            y: area.y + text_rows,
            height: 3,
            ..area
        };
        let search = Paragraph::new(Span::styled(query, query_style)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(search_border),
        );
        f.render_widget(search, box_area);
    }
}

fn header_styles(visual: VisualState) -> (Style, Style, Style) {
    if visual.opacity < 0.5 {
        let faded = Style::default().fg(Color::DarkGray);
        return (faded, faded, faded);
    }
    (
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Style::default().fg(Color::DarkGray),
        Style::default().fg(Color::Green),
    )
}
