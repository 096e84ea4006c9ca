//! Presenter-side UI state for ocrfix.
//!
//! Review state (queue, draft, undo) lives in `ocrfix_core::SessionController`. This
//! module only owns what the terminal needs on top of it: the input mode, scroll
//! offsets, the busy spinner and the automatic fetch-retry timer. No ratatui rendering
//! logic lives here.

use std::time::{Duration, Instant};

use ocrfix_core::{SegmentId, SessionController, SessionState};

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single-key review commands (default).
    #[default]
    Normal,
    /// Keys edit the draft text.
    Insert,
    /// Full-screen help overlay is shown above all panels.
    HelpOverlay,
}

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub struct AppState {
    pub mode: Mode,
    pub help_scroll: u16,
    /// Vertical scroll offset of the segment panel.
    pub ocr_scroll: u16,
    /// Inner height of the segment panel, cached after each render.
    pub ocr_viewport_height: u16,
    spinner_frame: usize,
    /// Segment the scroll offset belongs to; a new segment resets it.
    shown_segment: Option<SegmentId>,
    auto_retry: Option<Duration>,
    retry_at: Option<Instant>,
}

impl AppState {
    /// # Arguments
    ///
    /// * `auto_retry` - delay before a failed fetch is re-issued; `None` disables it
    pub fn new(auto_retry: Option<Duration>) -> Self {
        Self {
            mode: Mode::default(),
            help_scroll: 0,
            ocr_scroll: 0,
            ocr_viewport_height: 0,
            spinner_frame: 0,
            shown_segment: None,
            auto_retry,
            retry_at: None,
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.ocr_scroll = self.ocr_scroll.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.ocr_scroll = self.ocr_scroll.saturating_sub(lines);
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.ocr_viewport_height / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.ocr_viewport_height / 2).max(1));
    }

    /// Resets the segment scroll offset when a different segment comes on screen.
    pub fn sync_segment(&mut self, controller: &SessionController) {
        let shown = controller.view().segment.map(|s| s.segment_id());
        if shown != self.shown_segment {
            self.shown_segment = shown;
            self.ocr_scroll = 0;
        }
    }

    /// Arms the retry timer when the controller is waiting on data but no fetch is in
    /// flight (the last one failed). Called after every gateway reply.
    pub fn after_reply(&mut self, controller: &SessionController, now: Instant) {
        self.sync_segment(controller);
        let stalled =
            controller.state() == SessionState::AwaitingPrefetch && !controller.prefetch_outstanding();
        self.retry_at = match (stalled, self.auto_retry) {
            (true, Some(delay)) => Some(self.retry_at.unwrap_or(now + delay)),
            _ => None,
        };
    }

    /// Advances the spinner. Returns `true` when the retry timer has fired.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        match self.retry_at {
            Some(at) if now >= at => {
                self.retry_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocrfix_core::{GatewayCommand, GatewayError, GatewayReply};

    fn stalled_controller() -> SessionController {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut controller = SessionController::new(tx);
        controller.start();
        let Ok(GatewayCommand::FetchPage { seq }) = rx.try_recv() else {
            panic!("expected initial fetch");
        };
        controller.apply(GatewayReply::PageLoaded {
            seq,
            result: Err(GatewayError::Transport("offline".into())),
        });
        controller
    }

    #[test]
    fn failed_fetch_arms_retry_after_delay() {
        let controller = stalled_controller();
        let mut state = AppState::new(Some(Duration::from_secs(5)));
        let now = Instant::now();
        state.after_reply(&controller, now);
        assert!(state.retry_pending());
        assert!(!state.on_tick(now + Duration::from_secs(1)));
        assert!(state.on_tick(now + Duration::from_secs(6)));
        assert!(!state.retry_pending());
    }

    #[test]
    fn retry_disabled_without_delay() {
        let controller = stalled_controller();
        let mut state = AppState::new(None);
        state.after_reply(&controller, Instant::now());
        assert!(!state.retry_pending());
    }

    #[test]
    fn spinner_cycles() {
        let mut state = AppState::new(None);
        let first = state.spinner();
        for _ in 0..SPINNER.len() {
            state.on_tick(Instant::now());
        }
        assert_eq!(state.spinner(), first);
    }
}
