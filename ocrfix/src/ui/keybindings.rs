//! Keybinding dispatcher for ocrfix.
//!
//! Translates crossterm `KeyEvent`s into `SessionController` operations and
//! `AppState` mutations, and returns a `KeyAction` telling the event loop whether to
//! continue or quit. The review chords (`Ctrl-Enter`/`Alt-Enter`, `Ctrl-s`, `Ctrl-z`) work in both
//! Normal and Insert mode; everything else branches on `state.mode`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use ocrfix_core::{SessionController, SessionState};

use crate::app::{AppState, Mode};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Continue the event loop normally.
    Continue,
    /// Exit cleanly.
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
///
/// Rejected controller commands are not errors here: the controller records them as
/// its notice and the status bar shows it.
///
/// # Arguments
///
/// * `key` - the raw crossterm key event (code + modifiers)
/// * `state` - presenter state
/// * `controller` - the review session
pub fn handle_key(key: KeyEvent, state: &mut AppState, controller: &mut SessionController) -> KeyAction {
    if state.mode == Mode::HelpOverlay {
        return handle_help(key, state);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }
    if handle_review_chord(key, controller) {
        state.sync_segment(controller);
        return KeyAction::Continue;
    }
    let action = match state.mode {
        Mode::Insert => handle_insert(key, state, controller),
        _ => handle_normal(key, state, controller),
    };
    state.sync_segment(controller);
    action
}

// ---------------------------------------------------------------------------
// Review chords (Normal and Insert)
// ---------------------------------------------------------------------------

/// Handles `Ctrl-Enter` / `Alt-Enter` save, `Ctrl-s` skip and `Ctrl-z` undo. Returns
/// whether the key was consumed.
///
/// `Alt-Enter` covers terminals that report `Ctrl-Enter` as a plain `Enter`.
fn handle_review_chord(key: KeyEvent, controller: &mut SessionController) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Enter if ctrl || alt => save_draft(controller),
        KeyCode::Char('s') if ctrl => {
            controller.clear_notice();
            let _ = controller.skip();
        }
        KeyCode::Char('z') if ctrl => {
            controller.clear_notice();
            let _ = controller.undo();
        }
        _ => return false,
    }
    true
}

fn save_draft(controller: &mut SessionController) {
    controller.clear_notice();
    let text = controller.draft().to_owned();
    let _ = controller.save(text);
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState, controller: &mut SessionController) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),

        KeyCode::Enter => save_draft(controller),
        KeyCode::Char('s') => {
            controller.clear_notice();
            let _ = controller.skip();
        }
        KeyCode::Char('u') => {
            controller.clear_notice();
            let _ = controller.undo();
        }
        KeyCode::Char(c @ '1'..='9') => {
            controller.clear_notice();
            let index = (c as usize) - ('1' as usize);
            let _ = controller.select_suggestion(index);
        }
        KeyCode::Char('i') => state.mode = Mode::Insert,
        KeyCode::Char('r') => {
            controller.clear_notice();
            if controller.state() == SessionState::Exhausted {
                controller.restart();
            } else {
                controller.retry_prefetch();
            }
        }

        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

fn handle_insert(key: KeyEvent, state: &mut AppState, controller: &mut SessionController) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Char('u') if ctrl => controller.set_draft(String::new()),
        KeyCode::Char('r') if ctrl => {
            let original = controller
                .view()
                .segment
                .map(|s| s.edited_text().to_owned())
                .unwrap_or_default();
            controller.set_draft(original);
        }
        KeyCode::Char(_) if ctrl => {}
        KeyCode::Char(c) => controller.draft_mut().push(c),
        KeyCode::Enter => controller.draft_mut().push('\n'),
        KeyCode::Backspace => {
            controller.draft_mut().pop();
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Scroll wheel moves the help overlay when it is open, otherwise the segment panel.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) {
    let help = state.mode == Mode::HelpOverlay;
    match mouse.kind {
        MouseEventKind::ScrollUp if help => state.help_scroll = state.help_scroll.saturating_sub(3),
        MouseEventKind::ScrollDown if help => state.help_scroll = state.help_scroll.saturating_add(3),
        MouseEventKind::ScrollUp => state.scroll_up(3),
        MouseEventKind::ScrollDown => state.scroll_down(3),
        _ => {}
    }
}
