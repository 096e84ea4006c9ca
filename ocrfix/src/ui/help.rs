//! Help overlay renderer for ocrfix.
//!
//! Draws a centred modal over the panel layout. `Clear` erases the background first,
//! inside the same `terminal.draw()` closure as every other panel.

use ratatui::{
    Frame,
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay as a centred modal on top of the panels.
///
/// Skipped on terminals narrower than 60 columns.
///
/// # Arguments
///
/// * `frame` - current render frame provided by `terminal.draw()`
/// * `theme` - active color theme (supplies `border_active` for the modal border)
/// * `help_scroll` - vertical scroll offset; j/k in HelpOverlay mode mutate this field
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help: j/k scroll, ? or Esc to dismiss ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Any mode"),
        Line::from("  Ctrl-Enter    Save the draft and move to the next segment"),
        Line::from("  Alt-Enter     Same as Ctrl-Enter (for terminals that send it as Enter)"),
        Line::from("  Ctrl-s        Skip this segment"),
        Line::from("  Ctrl-z        Undo the last save (once it is acknowledged)"),
        Line::from(""),
        Line::from("Normal mode"),
        Line::from("  Enter         Save the draft"),
        Line::from("  s / u         Skip / undo"),
        Line::from("  1 .. 9        Copy a suggestion into the draft (nothing is submitted)"),
        Line::from("  i             Edit the draft"),
        Line::from("  r             Retry loading, or check for new work when done"),
        Line::from("  j / k         Scroll the segment panel"),
        Line::from("  Ctrl-d / u    Scroll half a page down / up"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q / Esc       Quit"),
        Line::from(""),
        Line::from("Insert mode"),
        Line::from("  Enter         New line"),
        Line::from("  Backspace     Delete the last character"),
        Line::from("  Ctrl-u        Clear the draft"),
        Line::from("  Ctrl-r        Reset the draft to the segment's text"),
        Line::from("  Esc           Back to normal mode"),
    ])
}
