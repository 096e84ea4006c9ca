//! UI rendering module for ocrfix.
//!
//! `render()` is the single entry point called by the event loop's `terminal.draw()`
//! closure. It reads the controller through [`SessionController::view`] and never
//! mutates review state. Layout arithmetic lives in `layout.rs`.

mod editor;
mod layout;
mod segment_view;
mod suggestions;
pub mod help;
pub mod keybindings;

use ratatui::{Frame, style::Style, widgets::Block};

use ocrfix_core::SessionController;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, editor_lines, inner_rect, render_status_bar};

/// Renders one complete frame: segment, suggestions, editor and status bar.
///
/// Called exactly once per `AppEvent::Render` inside `terminal.draw()`. The segment
/// panel's viewport height is written back into `state` so half-page scrolling on the
/// next keypress uses the current size.
///
/// # Arguments
///
/// * `frame` - current render frame provided by `terminal.draw()`
/// * `state` - presenter state (viewport height is cached here)
/// * `controller` - the review session
/// * `theme` - active color theme
pub fn render(frame: &mut Frame, state: &mut AppState, controller: &SessionController, theme: &Theme) {
    let view = controller.view();
    let rects = compute_layout(frame, editor_lines(&view), view.suggestions.len());

    state.ocr_viewport_height = inner_rect(rects.segment).height;

    frame.render_widget(Block::new().style(Style::default().bg(theme.background)), frame.area());
    segment_view::render_segment(frame, rects.segment, &view, state, theme);
    suggestions::render_suggestions(frame, rects.suggestions, view.suggestions, view.draft, theme);
    editor::render_editor(frame, rects.editor, view.draft, state.mode, theme);
    render_status_bar(frame, rects.status_bar, state, &view, theme);

    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
}
