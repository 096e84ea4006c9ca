//! Draft editor panel.

use ratatui::{
    Frame,
    layout::{Position, Rect},
    text::Line,
    widgets::Paragraph,
};

use crate::app::Mode;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Renders the draft and, in Insert mode, places the terminal cursor after its last character.
///
/// The panel keeps the last lines of a long draft in view.
pub fn render_editor(frame: &mut Frame, area: Rect, draft: &str, mode: Mode, theme: &Theme) {
    let editing = mode == Mode::Insert;
    let title = if editing { " Draft [editing, Esc to stop] " } else { " Draft (i to edit) " };
    let block = panel_block(title, editing, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = draft.split('\n').map(Line::raw).collect();
    let scroll = lines.len().saturating_sub(inner.height as usize) as u16;

    if editing && inner.width > 0 && inner.height > 0 {
        let last = lines.last().map(Line::width).unwrap_or(0) as u16;
        let row = (lines.len() as u16).saturating_sub(1).saturating_sub(scroll);
        frame.set_cursor_position(Position {
            x: inner.x + last.min(inner.width - 1),
            y: inner.y + row.min(inner.height - 1),
        });
    }

    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}
