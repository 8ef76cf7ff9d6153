//! Article card list.
//!
//! Cards are drawn as plain lines into a row buffer covering the list area,
//! so a card straddling the viewport edge is clipped row by row. Each card's
//! [`VisualState`] is mapped onto the terminal: opacity picks the colour
//! ramp, `y` shifts whole rows, scale below 1 insets the card horizontally,
//! scale above 1 (hover) thickens the border, and a strong tilt italicises.

use crate::app::{App, CardLayout};
use crate::feed::Article;
use crate::reveal::VisualState;
use crate::util::{display_width, strip_control_chars, truncate_to_width};
use chrono::Utc;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::helpers::format_relative_time;

/// Vertical offset units per terminal row.
const Y_UNITS_PER_ROW: f32 = 20.0;
/// Below this opacity a card is not drawn at all.
const MIN_VISIBLE_OPACITY: f32 = 0.05;
const TILT_ITALIC_DEGREES: f32 = 7.5;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub(super) fn spinner_glyph(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

/// Render the card list (or its loading / empty placeholder).
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    if app.cards().is_empty() {
        render_placeholder(f, app, area);
        return;
    }

    let mut rows: Vec<Line<'static>> = vec![Line::default(); area.height as usize];
    let scroll_top = app.scroll_top as i64;
    let now = Utc::now();

    for (index, (card, article)) in app.cards().iter().zip(app.visible().iter()).enumerate() {
        let visual = app.card_visual(&card.key);
        if visual.opacity < MIN_VISIBLE_OPACITY {
            continue;
        }

        let shift = (visual.y / Y_UNITS_PER_ROW).round() as i64;
        let screen_top = card.bounds.top as i64 - scroll_top + shift;
        let screen_bottom = screen_top + card.bounds.height as i64;
        if screen_bottom <= 0 || screen_top >= area.height as i64 {
            continue;
        }

        let selected = index == app.selected;
        let lines = card_lines(card, article, area.width, visual, selected, now);
        for (offset, line) in lines.into_iter().enumerate() {
            let row = screen_top + offset as i64;
            if (0..area.height as i64).contains(&row) {
                rows[row as usize] = line;
            }
        }
    }

    f.render_widget(Paragraph::new(rows), area);
}

fn render_placeholder(f: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(Color::DarkGray);
    let lines = if app.is_loading() {
        vec![Line::from(vec![
            Span::styled(spinner_glyph(app.spinner_frame), Style::default().fg(Color::Cyan)),
            Span::raw("  Loading stories..."),
        ])]
    } else if app.feed.articles.is_empty() {
        vec![
            Line::from(Span::styled("No stories yet", bold)),
            Line::from(Span::styled("Press r to reload", muted)),
        ]
    } else {
        vec![
            Line::from(Span::styled("No matching news", bold)),
            Line::from(Span::styled("Try another keyword", muted)),
        ]
    };

    let top = area.height.saturating_sub(lines.len() as u16) / 2;
    let centered = Rect {
        y: area.y + top,
        height: area.height - top,
        ..area
    };
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), centered);
}

/// Base style for a given reveal opacity.
fn fade_style(visual: VisualState) -> Style {
    let style = if visual.opacity < 0.35 {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    } else if visual.opacity < 0.75 {
        Style::default().fg(Color::Gray)
    } else {
        Style::default()
    };
    if visual.rotation_x > TILT_ITALIC_DEGREES {
        style.add_modifier(Modifier::ITALIC)
    } else {
        style
    }
}

/// Only fully faded-in cards get their own accent colours.
fn accent(base: Style, visual: VisualState, accent: Style) -> Style {
    if visual.opacity >= 0.75 {
        base.patch(accent)
    } else {
        base
    }
}

fn card_lines(
    card: &CardLayout,
    article: &Article,
    width: u16,
    visual: VisualState,
    selected: bool,
    now: chrono::DateTime<Utc>,
) -> Vec<Line<'static>> {
    let shrink = (1.0 - visual.scale.min(1.0)).max(0.0);
    let inset = ((shrink * width as f32) / 2.0).round() as usize;
    let outer = (width as usize).saturating_sub(inset * 2).max(4);
    let inner = outer - 4;

    let base = fade_style(visual);
    let mut border = base;
    if selected {
        border = accent(border, visual, Style::default().fg(Color::Cyan));
    }
    if visual.scale > 1.0 {
        border = border.add_modifier(Modifier::BOLD);
    }

    let mut lines = Vec::with_capacity(card.bounds.height as usize);
    lines.push(edge(inset, outer, '╭', '╮', border));

    // Meta: source · time, HOT badge when the story has an image
    let source = strip_control_chars(&article.source_name).into_owned();
    let when = format_relative_time(article.published, &article.published_at, now);
    let source_style = Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD);
    let mut meta = vec![
        Span::styled(source, accent(base, visual, source_style)),
        Span::styled(" · ", base),
        Span::styled(when, accent(base, visual, Style::default().fg(Color::DarkGray))),
    ];
    if article.image_url.is_some() {
        let badge = Style::default().fg(Color::Black).bg(Color::Yellow);
        meta.push(Span::styled("  HOT ", accent(base, visual, badge)));
    }
    lines.push(framed(inset, inner, meta, border));

    let title_style = accent(
        base.add_modifier(Modifier::BOLD),
        visual,
        if selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        },
    );
    for title in &card.title {
        let content = vec![Span::styled(title.clone(), title_style)];
        lines.push(framed(inset, inner, content, border));
    }
    if card.title.is_empty() {
        lines.push(framed(inset, inner, Vec::new(), border));
    }

    let description_style = accent(base, visual, Style::default().fg(Color::Gray));
    for description in &card.description {
        let content = vec![Span::styled(description.clone(), description_style)];
        lines.push(framed(inset, inner, content, border));
    }

    let link = format!("Read more ↗ {}", strip_control_chars(&article.url));
    let link_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
    lines.push(framed(
        inset,
        inner,
        vec![Span::styled(
            truncate_to_width(&link, inner).into_owned(),
            accent(base, visual, link_style),
        )],
        border,
    ));

    lines.push(edge(inset, outer, '╰', '╯', border));
    lines
}

fn edge(inset: usize, outer: usize, left: char, right: char, style: Style) -> Line<'static> {
    let mut text = String::with_capacity(outer * 3);
    text.push(left);
    text.extend(std::iter::repeat('─').take(outer.saturating_sub(2)));
    text.push(right);
    Line::from(vec![Span::raw(" ".repeat(inset)), Span::styled(text, style)])
}

/// One bordered content row, padded to `inner` columns.
fn framed(inset: usize, inner: usize, content: Vec<Span<'static>>, border: Style) -> Line<'static> {
    let used: usize = content.iter().map(|s| display_width(&s.content)).sum();
    let mut spans = Vec::with_capacity(content.len() + 4);
    spans.push(Span::raw(" ".repeat(inset)));
    spans.push(Span::styled("│ ", border));
    spans.extend(content);
    spans.push(Span::raw(" ".repeat(inner.saturating_sub(used))));
    spans.push(Span::styled(" │", border));
    Line::from(spans)
}
