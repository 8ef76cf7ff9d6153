use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

use super::cards::spinner_glyph;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.is_loading() && !app.visible().is_empty() {
        Cow::Owned(format!("{} Loading more stories...", spinner_glyph(app.spinner_frame)))
    } else if app.search_mode {
        Cow::Borrowed("Type to search | ESC clear | ENTER confirm")
    } else {
        Cow::Owned(format!(
            "{}/{} | [/]search [j/k]move [o]pen [r]eload [m]ore [q]uit",
            (app.selected + 1).min(app.visible().len()),
            app.visible().len()
        ))
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
