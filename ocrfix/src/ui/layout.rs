//! Responsive panel layout for ocrfix.
//!
//! Pure layout arithmetic; it is called inside `terminal.draw()` on every render so
//! each frame reflects the current terminal size.
//!
//! # Panel geometry
//!
//! | Terminal width | Layout                                                        |
//! |----------------|---------------------------------------------------------------|
//! | `>= 100` cols  | segment (65%) beside suggestions (35%), editor below, status |
//! | `< 100` cols   | segment, suggestions and editor stacked, status              |
//!
//! `Spacing::Overlap(1)` combined with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes adjacent panel borders share a single column.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use ocrfix_core::{ReviewView, SessionState};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Outer rectangles of every panel for the current frame.
#[derive(Debug, Clone, Copy)]
pub struct PanelRects {
    pub segment: Rect,
    pub suggestions: Rect,
    pub editor: Rect,
    pub status_bar: Rect,
}

/// Splits the frame for the current terminal size.
///
/// # Arguments
///
/// * `frame` - current render frame (provides `frame.area()` with live terminal size)
/// * `editor_rows` - text rows the editor should show (see [`editor_lines`]); capped at 8
/// * `suggestion_count` - rows needed by the suggestions list when stacked
pub fn compute_layout(frame: &Frame, editor_rows: usize, suggestion_count: usize) -> PanelRects {
    let term_width = frame.area().width;
    let editor_height = (editor_rows.clamp(1, 8) + 2) as u16;

    let [body, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));
    let [main_area, editor] = body.layout(
        &Layout::vertical([Constraint::Fill(1), Constraint::Length(editor_height)])
            .spacing(Spacing::Overlap(1)),
    );

    let (segment, suggestions) = if term_width >= 100 {
        let [segment, suggestions] = main_area.layout(
            &Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
                .spacing(Spacing::Overlap(1)),
        );
        (segment, suggestions)
    } else {
        let list_height = (suggestion_count.clamp(1, 9) + 2) as u16;
        let [segment, suggestions] = main_area.layout(
            &Layout::vertical([Constraint::Fill(1), Constraint::Length(list_height)])
                .spacing(Spacing::Overlap(1)),
        );
        (segment, suggestions)
    };

    PanelRects { segment, suggestions, editor, status_bar }
}

/// Rows for the editor: the segment's line-count hint, or more if the draft has grown.
pub fn editor_lines(view: &ReviewView<'_>) -> usize {
    let hint = view.segment.map_or(1, |s| usize::from(s.text_line_count()));
    hint.max(view.draft.split('\n').count())
}

/// Returns the inner `Rect` of a panel after removing the 1-cell border on each side.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Builds a bordered `Block` for a panel.
///
/// Active panels get a thick border in `border_active`. `MergeStrategy::Fuzzy` is used
/// because `Exact` produces incorrect junctions when mixing thick and plain borders.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_active: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_active {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_active { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Short description of the session for the status bar.
pub fn state_label(view: &ReviewView<'_>) -> String {
    match (view.state, view.position) {
        (SessionState::Empty, _) => "starting".to_owned(),
        (SessionState::AwaitingPrefetch, _) => "loading segments".to_owned(),
        (SessionState::Exhausted, _) if view.segment.is_none() => {
            "no more segments (r to check again)".to_owned()
        }
        (_, Some((pos, len))) => format!("segment {pos}/{len}"),
        (_, None) => "reviewing".to_owned(),
    }
}

/// Renders the 1-row status bar: mode, session state, spinner, undo hint and notice.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    view: &ReviewView<'_>,
    theme: &Theme,
) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Normal | Mode::HelpOverlay => (" NORMAL ", theme.status_mode_normal),
    };

    let mut spans = vec![
        Span::styled(mode_text, Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::raw(state_label(view)),
    ];
    if view.is_busy {
        spans.push(Span::styled(format!(" {}", state.spinner()), Style::default().fg(theme.status_busy)));
    }
    if view.can_undo {
        spans.push(Span::raw("  [u] undo"));
    }
    if state.retry_pending() {
        spans.push(Span::styled("  retrying soon", Style::default().fg(theme.notice_info)));
    }
    if let Some(notice) = view.notice {
        spans.push(Span::styled(format!("  {notice}"), Style::default().fg(theme.notice_error)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
