//! Numbered suggestion list. Keys `1`..`9` copy an entry into the draft.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Entries past the ninth have no shortcut key and are not shown.
pub const MAX_SHORTCUTS: usize = 9;

pub fn render_suggestions(
    frame: &mut Frame,
    area: Rect,
    suggestions: &[String],
    draft: &str,
    theme: &Theme,
) {
    let block = panel_block(" Suggestions ", false, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let items: Vec<ListItem> = suggestion_lines(suggestions, draft, theme)
        .into_iter()
        .map(ListItem::new)
        .collect();
    frame.render_widget(List::new(items), inner);
}

/// One line per suggestion. Blank entries read `(blank)`; the entry matching the draft is bold.
pub fn suggestion_lines(suggestions: &[String], draft: &str, theme: &Theme) -> Vec<Line<'static>> {
    suggestions
        .iter()
        .take(MAX_SHORTCUTS)
        .enumerate()
        .map(|(i, text)| {
            let key = Span::styled(format!("{} ", i + 1), Style::default().fg(theme.suggestion_key));
            let first_line = text.lines().next().unwrap_or("");
            let body = if text.is_empty() {
                Span::styled("(blank)", Style::default().fg(theme.suggestion_blank))
            } else {
                Span::raw(first_line.to_owned())
            };
            let line = Line::from(vec![key, body]);
            if text == draft {
                line.patch_style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                line
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn blank_suggestion_is_labelled() {
        let lines = suggestion_lines(&["1,234".into(), String::new()], "x", &Theme::dark());
        assert_eq!(text_of(&lines[0]), "1 1,234");
        assert_eq!(text_of(&lines[1]), "2 (blank)");
    }

    #[test]
    fn only_nine_shortcuts_are_listed() {
        let many: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        assert_eq!(suggestion_lines(&many, "", &Theme::dark()).len(), MAX_SHORTCUTS);
    }

    #[test]
    fn suggestion_equal_to_draft_is_bold() {
        let lines = suggestion_lines(&["a".into(), "b".into()], "b", &Theme::dark());
        assert!(lines[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(!lines[0].style.add_modifier.contains(Modifier::BOLD));
    }
}
