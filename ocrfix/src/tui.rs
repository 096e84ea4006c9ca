//! Terminal setup and teardown for the review screen.
//!
//! The screen renders to stderr so stdout stays free for `--import` summaries and shell
//! pipelines (`ocrfix --import page.json | tee import.log`).
//!
//! Plain terminals send `Ctrl-Enter` as a bare carriage return, which is
//! indistinguishable from `Enter`. When the terminal speaks the kitty keyboard
//! protocol, [`init_tui`] turns on escape-code disambiguation so the save chord
//! arrives with its modifier; [`restore_tui`] turns it off again. `Alt-Enter` is bound
//! as well for terminals without the protocol.

use std::io::{stderr, BufWriter, Stderr};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::SIGTERM;
use signal_hook::flag::register;

/// CrosstermBackend over a buffered stderr writer.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Set while keyboard enhancement flags are pushed, so teardown pops exactly once.
static KEYBOARD_ENHANCED: AtomicBool = AtomicBool::new(false);

/// Enables raw mode, enters the alternate screen with mouse capture and, where the
/// terminal supports it, keyboard enhancement. Call [`restore_tui`] on every exit path.
///
/// # Errors
///
/// Returns `Err` if raw mode, the escape sequences, or `Terminal::new` fail.
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;

    // The capability query answers through the input stream, so it needs raw mode.
    if supports_keyboard_enhancement().unwrap_or(false) {
        execute!(
            out,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        KEYBOARD_ENHANCED.store(true, Ordering::SeqCst);
        tracing::info!("keyboard enhancement enabled; Ctrl-Enter saves in every mode");
    } else {
        tracing::info!("keyboard enhancement unavailable; use Alt-Enter to save while editing");
    }

    Terminal::new(CrosstermBackend::new(out))
}

/// Puts the terminal back the way [`init_tui`] found it.
///
/// Safe to call more than once; the panic hook and the normal exit path may both run it.
///
/// # Errors
///
/// Returns `Err` if `disable_raw_mode` or the escape sequences fail.
pub fn restore_tui() -> std::io::Result<()> {
    let mut err = stderr();
    if KEYBOARD_ENHANCED.swap(false, Ordering::SeqCst) {
        execute!(err, PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(err, LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Restores the terminal before the default panic message prints. Install before
/// [`init_tui`].
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_tui();
        previous(info);
    }));
}

/// Returns a flag that flips to `true` when SIGTERM arrives; the event loop polls it.
///
/// # Errors
///
/// Returns `Err` if the handler cannot be registered.
pub fn register_sigterm() -> std::io::Result<Arc<AtomicBool>> {
    let term = Arc::new(AtomicBool::new(false));
    register(SIGTERM, Arc::clone(&term))?;
    Ok(term)
}
