//! Color theme system for ocrfix.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every UI surface
//! ocrfix renders. Two built-in themes are provided:
//!
//! - `dark`: ANSI 16 colors, works on any terminal.
//! - `catppuccin_mocha`: Catppuccin Mocha palette in RGB; requires truecolor.

use ratatui::style::Color;

/// All color values used across ocrfix's UI surfaces.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    /// Border color for the panel receiving input.
    pub border_active: Color,
    pub border_inactive: Color,

    // OCR vs draft comparison
    /// Words present in the draft but not in the OCR text.
    pub diff_added: Color,
    /// Words present in the OCR text but not in the draft.
    pub diff_removed: Color,
    /// Words common to both.
    pub diff_context: Color,

    // Segment details
    /// Document / page / bounding-box header line.
    pub segment_meta: Color,

    // Suggestions
    /// The `1`..`9` shortcut number in front of each suggestion.
    pub suggestion_key: Color,
    /// Placeholder text for a blank suggestion.
    pub suggestion_blank: Color,

    // Notices
    /// Failed gateway calls and rejected commands.
    pub notice_error: Color,
    /// Session lifecycle messages (exhausted, waiting).
    pub notice_info: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    /// Mode indicator color when in NORMAL mode.
    pub status_mode_normal: Color,
    /// Mode indicator color when in INSERT mode.
    pub status_mode_insert: Color,
    /// Spinner shown while a fetch or undo is outstanding.
    pub status_busy: Color,

    // General
    /// Application background (used for clearing areas).
    pub background: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            diff_added: Color::Green,
            diff_removed: Color::Red,
            diff_context: Color::Reset,

            segment_meta: Color::DarkGray,

            suggestion_key: Color::Yellow,
            suggestion_blank: Color::DarkGray,

            notice_error: Color::Red,
            notice_info: Color::Blue,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            status_busy: Color::Yellow,

            background: Color::Reset,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161);    // #a6e3a1
        let red = Color::Rgb(243, 139, 168);      // #f38ba8
        let yellow = Color::Rgb(249, 226, 175);   // #f9e2af
        let blue = Color::Rgb(137, 180, 250);     // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90);    // #45475a
        let base = Color::Rgb(30, 30, 46);        // #1e1e2e
        let text = Color::Rgb(205, 214, 244);     // #cdd6f4
        let peach = Color::Rgb(250, 179, 135);    // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            diff_added: green,
            diff_removed: red,
            diff_context: text,

            segment_meta: overlay1,

            suggestion_key: peach,
            suggestion_blank: overlay1,

            notice_error: red,
            notice_info: blue,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
            status_busy: yellow,

            background: base,
        }
    }

    /// Resolves a theme name string to the corresponding built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents startup.
    ///
    /// # Arguments
    ///
    /// * `name` - theme name from config or `--theme`, e.g. `"dark"` or `"catppuccin-mocha"`
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_falls_back_to_dark() {
        assert_eq!(Theme::from_name("solarized").border_active, Theme::dark().border_active);
    }

    #[test]
    fn both_spellings_of_catppuccin_resolve() {
        let a = Theme::from_name("catppuccin-mocha");
        let b = Theme::from_name("catppuccin_mocha");
        assert_eq!(a.background, b.background);
        assert_eq!(a.background, Color::Rgb(30, 30, 46));
    }
}
