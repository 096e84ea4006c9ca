//! Segment panel: where the text comes from, what OCR read, and how the draft differs.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use similar::{ChangeTag, TextDiff};

use ocrfix_core::{ReviewView, Segment, SessionState};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Renders the segment panel, or a placeholder when nothing awaits a decision.
///
/// # Arguments
///
/// * `frame` - current render frame
/// * `area` - outer `Rect` of the panel (includes borders)
/// * `view` - controller projection supplying the segment and draft
/// * `state` - supplies `ocr_scroll`
/// * `theme` - active color theme
pub fn render_segment(
    frame: &mut Frame,
    area: Rect,
    view: &ReviewView<'_>,
    state: &AppState,
    theme: &Theme,
) {
    let block = panel_block(" Segment ", false, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let lines = match view.segment {
        Some(segment) => segment_lines(segment, view.draft, theme),
        None => vec![Line::styled(placeholder(view.state), Style::default().fg(theme.notice_info))],
    };

    frame.render_widget(Paragraph::new(lines).scroll((state.ocr_scroll, 0)), inner);
}

fn placeholder(state: SessionState) -> &'static str {
    match state {
        SessionState::Empty | SessionState::AwaitingPrefetch => "Loading segments...",
        SessionState::Exhausted => "All segments reviewed. Press r to check for new work.",
        SessionState::Displaying => "Waiting for the next segment...",
    }
}

fn segment_lines(segment: &Segment, draft: &str, theme: &Theme) -> Vec<Line<'static>> {
    let bbox = segment.bounding_box();
    let meta = format!(
        "doc {}  page {}  box ({}, {})-({}, {})  {}x{}  {} line(s)",
        segment.doc_id(),
        segment.page(),
        bbox.x1,
        bbox.y1,
        bbox.x2,
        bbox.y2,
        bbox.width(),
        bbox.height(),
        segment.text_line_count(),
    );

    let mut lines = vec![
        Line::styled(meta, Style::default().fg(theme.segment_meta)),
        Line::raw(""),
        Line::styled("OCR", Style::default().add_modifier(Modifier::BOLD)),
    ];
    lines.extend(segment.ocr_text().lines().map(|l| Line::raw(l.to_owned())));
    lines.push(Line::raw(""));

    if draft == segment.ocr_text() {
        lines.push(Line::styled("Draft matches OCR", Style::default().fg(theme.segment_meta)));
    } else {
        lines.push(Line::styled("Changes", Style::default().add_modifier(Modifier::BOLD)));
        lines.extend(word_diff_lines(segment.ocr_text(), draft, theme));
    }
    lines
}

/// Word-level comparison of `old` and `new` as styled lines.
///
/// Removed words are struck through in `diff_removed`, inserted words use
/// `diff_added`, and unchanged words use `diff_context`. Newlines inside either text
/// start a new output line.
pub fn word_diff_lines(old: &str, new: &str, theme: &Theme) -> Vec<Line<'static>> {
    let diff = TextDiff::from_words(old, new);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();

    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            let base = match change.tag() {
                ChangeTag::Delete => Style::default()
                    .fg(theme.diff_removed)
                    .add_modifier(Modifier::CROSSED_OUT),
                ChangeTag::Insert => Style::default().fg(theme.diff_added),
                ChangeTag::Equal => Style::default().fg(theme.diff_context),
            };
            for (emphasized, value) in change.iter_strings_lossy() {
                let style = if emphasized { base.add_modifier(Modifier::BOLD) } else { base };
                let mut parts = value.split('\n');
                if let Some(first) = parts.next() {
                    if !first.is_empty() {
                        current.push(Span::styled(first.to_owned(), style));
                    }
                }
                for part in parts {
                    lines.push(Line::from(std::mem::take(&mut current)));
                    if !part.is_empty() {
                        current.push(Span::styled(part.to_owned(), style));
                    }
                }
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}
