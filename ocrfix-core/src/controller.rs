//! The operator-facing review state machine.
//!
//! `SessionController` owns the `SegmentQueue`, the draft edit text and the single
//! level of undo. It never awaits the backend: each operation dispatches a
//! [`GatewayCommand`] and returns immediately, and the outcome comes back later
//! through [`SessionController::apply`]. Every command carries a monotonic sequence
//! number so superseded replies can be recognised and dropped.
//!
//! # States
//!
//! | State              | Meaning                                                    |
//! |--------------------|------------------------------------------------------------|
//! | `Empty`            | nothing requested yet                                      |
//! | `Displaying`       | a segment is on screen                                     |
//! | `AwaitingPrefetch` | the queue ran dry, a fetch must land before anything shows |
//! | `Exhausted`        | the backend returned an empty page                         |

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{GatewayAction, GatewayError, ReviewError, UndoRejection};
use crate::gateway::{GatewayCommand, GatewayReply, Page, SaveReceipt};
use crate::queue::SegmentQueue;
use crate::types::{RevisionId, Segment, SegmentId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Empty,
    Displaying,
    AwaitingPrefetch,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActionKind {
    /// Keeps the segment's `edited_text` from before the save so undo can restore it.
    Save { prior_text: String },
    Skip,
}

/// The most recent save or skip.
#[derive(Debug, Clone)]
struct TerminalAction {
    seq: u64,
    index: usize,
    segment_id: SegmentId,
    kind: ActionKind,
}

#[derive(Debug, Clone, Copy)]
struct PendingUndo {
    seq: u64,
    revision_id: RevisionId,
    /// Sequence number of the save being reversed.
    action_seq: u64,
}

/// Read-only projection handed to the presenter after every event.
#[derive(Debug, Clone, Copy)]
pub struct ReviewView<'a> {
    /// The segment awaiting a decision, if any.
    pub segment: Option<&'a Segment>,
    pub suggestions: &'a [String],
    /// Operator's edit buffer for `segment`.
    pub draft: &'a str,
    pub is_busy: bool,
    pub state: SessionState,
    pub can_undo: bool,
    /// 1-based cursor position and number of loaded segments.
    pub position: Option<(usize, usize)>,
    pub notice: Option<&'a ReviewError>,
}

pub struct SessionController {
    session_id: Uuid,
    queue: SegmentQueue,
    state: SessionState,
    commands: UnboundedSender<GatewayCommand>,
    next_seq: u64,
    /// Sequence number of the outstanding fetch, if any.
    prefetch: Option<u64>,
    exhausted: bool,
    /// Highest queue index that received a save or skip.
    resolved_through: Option<usize>,
    last_action: Option<TerminalAction>,
    last_revision: Option<RevisionId>,
    pending_undo: Option<PendingUndo>,
    draft: String,
    notice: Option<ReviewError>,
}

impl SessionController {
    /// Creates a controller with an empty queue. Call [`start`](Self::start) to load work.
    pub fn new(commands: UnboundedSender<GatewayCommand>) -> Self {
        Self::with_queue(SegmentQueue::new(), commands)
    }

    /// Creates a controller over an already-populated queue (cursor untouched).
    pub fn with_queue(queue: SegmentQueue, commands: UnboundedSender<GatewayCommand>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            queue,
            state: SessionState::Empty,
            commands,
            next_seq: 1,
            prefetch: None,
            exhausted: false,
            resolved_through: None,
            last_action: None,
            last_revision: None,
            pending_undo: None,
            draft: String::new(),
            notice: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Issues the first fetch. Only valid from `Empty`; returns whether anything happened.
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Empty {
            return false;
        }
        tracing::info!(session = %self.session_id, "review session starting");
        self.last_revision = None;
        self.state = SessionState::AwaitingPrefetch;
        if self.queue.is_near_end() {
            self.request_prefetch();
        } else {
            self.advance();
        }
        true
    }

    /// Asks the backend for more work after it reported exhaustion.
    ///
    /// Any fetch still outstanding is superseded; its reply will be discarded.
    pub fn restart(&mut self) -> bool {
        if self.state != SessionState::Exhausted {
            return false;
        }
        tracing::info!(session = %self.session_id, "restarting exhausted session");
        self.exhausted = false;
        self.prefetch = None;
        self.state = SessionState::AwaitingPrefetch;
        if !self.issue_fetch() {
            self.state = SessionState::Exhausted;
            self.exhausted = true;
        }
        true
    }

    /// Re-issues a failed fetch while the controller is waiting for data.
    pub fn retry_prefetch(&mut self) -> bool {
        if self.state != SessionState::AwaitingPrefetch || self.prefetch.is_some() {
            return false;
        }
        self.issue_fetch()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Moves to the next loaded segment and runs the prefetch check.
    ///
    /// The cursor does not move past a segment that has not been saved or skipped.
    /// When no loaded segment is left the controller waits for the fetch
    /// (`AwaitingPrefetch`), or settles in `Exhausted` if the backend is drained.
    pub fn advance(&mut self) -> bool {
        let blocked = self.queue.current().is_some() && !self.current_resolved();
        let moved = !blocked && self.queue.advance();

        if moved {
            self.state = SessionState::Displaying;
            self.reset_draft();
        } else if !blocked {
            self.state = if self.exhausted {
                SessionState::Exhausted
            } else {
                SessionState::AwaitingPrefetch
            };
        }

        self.request_prefetch();
        moved
    }

    /// Issues a fetch when the cursor has reached the last loaded segment.
    ///
    /// Idempotent: at most one fetch is outstanding, and nothing is requested once
    /// the backend has reported exhaustion.
    pub fn request_prefetch(&mut self) -> bool {
        if self.prefetch.is_some() || self.exhausted || !self.queue.is_near_end() {
            return false;
        }
        self.issue_fetch()
    }

    /// Returns every loaded segment that was never saved or skipped to the backend's
    /// pool. Called once when the session ends; the segment on screen is included, as is
    /// one whose save is being undone.
    ///
    /// Returns how many segments were handed back (0 means nothing was sent).
    pub fn release_unresolved(&mut self) -> usize {
        let first_open = self.resolved_through.map_or(0, |r| r + 1);
        let mut segment_ids: Vec<SegmentId> = (first_open..self.queue.len())
            .filter_map(|i| self.queue.get(i).map(Segment::segment_id))
            .collect();
        if let Some(pending) = self.pending_undo {
            let undoing = self.last_action.as_ref().filter(|a| a.seq == pending.action_seq);
            segment_ids.extend(undoing.map(|a| a.segment_id));
        }
        if segment_ids.is_empty() {
            return 0;
        }

        let count = segment_ids.len();
        let sent = self.dispatch(GatewayAction::ReleaseClaims, None, |seq| {
            GatewayCommand::ReleaseClaims { seq, segment_ids }
        });
        tracing::info!(session = %self.session_id, count, ?sent, "releasing unresolved segments");
        if sent.is_some() { count } else { 0 }
    }

    /// Ends the session: releases unresolved segments, closes the command channel and
    /// waits up to `grace` for the worker to finish every call already queued.
    ///
    /// Returns `false` when the worker was still busy (or had panicked) at the deadline;
    /// any calls left at that point are lost.
    pub async fn close(mut self, worker: JoinHandle<()>, grace: Duration) -> bool {
        self.release_unresolved();
        let session = self.session_id;
        drop(self);

        match tokio::time::timeout(grace, worker).await {
            Ok(Ok(())) => {
                tracing::info!(%session, "gateway worker drained");
                true
            }
            Ok(Err(err)) => {
                tracing::error!(%session, error = %err, "gateway worker failed");
                false
            }
            Err(_) => {
                tracing::warn!(%session, ?grace, "gateway worker still busy at shutdown");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Terminal actions
    // -----------------------------------------------------------------------

    /// Stores `text` on the current segment, submits it, and advances.
    ///
    /// The advance is optimistic: it does not wait for the acknowledgment.
    pub fn save(&mut self, text: impl Into<String>) -> Result<(), ReviewError> {
        let (index, segment_id) = self.actionable()?;
        let text = text.into();
        let prior_text = match self.queue.get_mut(index) {
            Some(segment) => segment.replace_edited_text(text.clone()),
            None => return self.reject(ReviewError::NoCurrentSegment),
        };

        let seq = self.dispatch(GatewayAction::Save, Some(segment_id), |seq| {
            GatewayCommand::Save { seq, segment_id, text }
        });
        tracing::debug!(%segment_id, ?seq, "save dispatched");

        self.record_action(index, segment_id, seq, ActionKind::Save { prior_text });
        self.advance();
        Ok(())
    }

    /// Marks the current segment skipped and advances. Skips are never undoable.
    pub fn skip(&mut self) -> Result<(), ReviewError> {
        let (index, segment_id) = self.actionable()?;

        let seq = self.dispatch(GatewayAction::Skip, Some(segment_id), |seq| {
            GatewayCommand::Skip { seq, segment_id }
        });
        tracing::debug!(%segment_id, ?seq, "skip dispatched");

        self.record_action(index, segment_id, seq, ActionKind::Skip);
        self.advance();
        Ok(())
    }

    /// Reverses the most recent save once its acknowledgment has arrived.
    ///
    /// The cursor moves back only when the backend confirms the undo.
    pub fn undo(&mut self) -> Result<(), ReviewError> {
        if self.pending_undo.is_some() {
            return self.reject(ReviewError::InvalidUndo(UndoRejection::UndoInFlight));
        }
        let target = self.last_action.as_ref().and_then(|action| match action.kind {
            ActionKind::Save { .. } => Some((action.seq, action.segment_id)),
            ActionKind::Skip => None,
        });
        let Some((action_seq, segment_id)) = target else {
            return self.reject(ReviewError::InvalidUndo(UndoRejection::NothingToUndo));
        };
        let Some(revision_id) = self.last_revision.take() else {
            return self.reject(ReviewError::InvalidUndo(UndoRejection::AwaitingAcknowledgement));
        };

        match self.dispatch(GatewayAction::Undo, Some(segment_id), |seq| {
            GatewayCommand::Undo { seq, segment_id, revision_id }
        }) {
            Some(seq) => {
                tracing::debug!(%segment_id, %revision_id, seq, "undo dispatched");
                self.pending_undo = Some(PendingUndo { seq, revision_id, action_seq });
            }
            None => self.last_revision = Some(revision_id),
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Copies suggestion `index` into the draft. Nothing is submitted.
    pub fn select_suggestion(&mut self, index: usize) -> Result<(), ReviewError> {
        let Some(segment) = self.displayed() else {
            return self.reject(ReviewError::NoCurrentSegment);
        };
        let suggestions = segment.suggestions();
        let Some(text) = suggestions.get(index).cloned() else {
            let len = suggestions.len();
            return self.reject(ReviewError::SuggestionOutOfRange { index, len });
        };
        self.draft = text;
        Ok(())
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Mutable access to the edit buffer for character-level editing.
    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    // -----------------------------------------------------------------------
    // Gateway replies
    // -----------------------------------------------------------------------

    /// Applies one reply from the gateway worker.
    pub fn apply(&mut self, reply: GatewayReply) {
        match reply {
            GatewayReply::PageLoaded { seq, result } => self.on_page(seq, result),
            GatewayReply::Saved { seq, segment_id, result } => {
                self.on_saved(seq, segment_id, result)
            }
            GatewayReply::Skipped { seq, segment_id, result } => {
                if let Err(err) = result {
                    tracing::warn!(%segment_id, seq, error = %err, "skip failed");
                    self.notice =
                        Some(ReviewError::transient(GatewayAction::Skip, Some(segment_id), &err));
                }
            }
            GatewayReply::Undone { seq, segment_id, result } => {
                self.on_undone(seq, segment_id, result)
            }
            GatewayReply::ClaimsReleased { seq, count, result } => match result {
                Ok(()) => tracing::debug!(seq, count, "claims released"),
                Err(err) => tracing::warn!(seq, count, error = %err, "releasing claims failed"),
            },
        }
    }

    fn on_page(&mut self, seq: u64, result: Result<Page, GatewayError>) {
        if self.prefetch != Some(seq) {
            let stale = ReviewError::StaleResponse { seq };
            tracing::debug!(error = %stale, "ignoring page");
            return;
        }
        self.prefetch = None;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(seq, error = %err, "fetch failed");
                self.notice = Some(ReviewError::transient(GatewayAction::FetchPage, None, &err));
                return;
            }
        };

        if page.segments.is_empty() {
            tracing::info!(session = %self.session_id, "backend has no more segments");
            self.exhausted = true;
            self.state = SessionState::Exhausted;
            return;
        }

        tracing::debug!(seq, count = page.segments.len(), "page loaded");
        self.queue.append(page.segments);
        if matches!(self.state, SessionState::AwaitingPrefetch | SessionState::Empty) {
            self.advance();
        }
    }

    fn on_saved(&mut self, seq: u64, segment_id: SegmentId, result: Result<SaveReceipt, GatewayError>) {
        let is_latest = self.last_action.as_ref().is_some_and(|a| a.seq == seq);
        match result {
            Ok(receipt) if is_latest => {
                tracing::debug!(%segment_id, revision = %receipt.revision_id, "save acknowledged");
                self.last_revision = Some(receipt.revision_id);
            }
            Ok(_) => {
                let stale = ReviewError::StaleResponse { seq };
                tracing::debug!(%segment_id, error = %stale, "superseded save ack");
            }
            Err(err) => {
                tracing::warn!(%segment_id, seq, error = %err, "save failed");
                if is_latest {
                    self.last_action = None;
                }
                self.notice =
                    Some(ReviewError::transient(GatewayAction::Save, Some(segment_id), &err));
            }
        }
    }

    fn on_undone(&mut self, seq: u64, segment_id: SegmentId, result: Result<(), GatewayError>) {
        let Some(pending) = self.pending_undo.filter(|p| p.seq == seq) else {
            let stale = ReviewError::StaleResponse { seq };
            tracing::debug!(%segment_id, error = %stale, "ignoring undo reply");
            return;
        };
        self.pending_undo = None;

        if let Err(err) = result {
            tracing::warn!(%segment_id, seq, error = %err, "undo failed");
            self.last_revision = Some(pending.revision_id);
            self.notice = Some(ReviewError::transient(GatewayAction::Undo, Some(segment_id), &err));
            return;
        }

        let Some(action) = self.last_action.take_if(|a| a.seq == pending.action_seq) else {
            tracing::debug!(%segment_id, "undo confirmed after a newer action; cursor kept");
            return;
        };
        let ActionKind::Save { prior_text } = action.kind else {
            return;
        };

        // Step back onto the saved segment: one position when the save advanced,
        // none when the queue was drained and the cursor stayed put.
        while self.queue.cursor().is_some_and(|c| c > action.index) {
            self.queue.retreat();
        }
        if let Some(segment) = self.queue.current_mut() {
            segment.replace_edited_text(prior_text);
        }
        self.resolved_through = action.index.checked_sub(1);
        self.last_revision = None;
        self.state = SessionState::Displaying;
        self.reset_draft();
        tracing::info!(%segment_id, revision = %pending.revision_id, "save undone");
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn view(&self) -> ReviewView<'_> {
        let segment = self.displayed();
        ReviewView {
            segment,
            suggestions: segment.map(Segment::suggestions).unwrap_or(&[]),
            draft: &self.draft,
            is_busy: self.state == SessionState::AwaitingPrefetch || self.pending_undo.is_some(),
            state: self.state,
            can_undo: self.can_undo(),
            position: self.queue.cursor().map(|c| (c + 1, self.queue.len())),
            notice: self.notice.as_ref(),
        }
    }

    /// The segment under the cursor, resolved or not.
    pub fn current(&self) -> Option<&Segment> {
        self.queue.current()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_revision(&self) -> Option<RevisionId> {
        self.last_revision
    }

    pub fn can_undo(&self) -> bool {
        self.pending_undo.is_none()
            && self.last_revision.is_some()
            && matches!(
                self.last_action,
                Some(TerminalAction { kind: ActionKind::Save { .. }, .. })
            )
    }

    pub fn prefetch_outstanding(&self) -> bool {
        self.prefetch.is_some()
    }

    pub fn queue(&self) -> &SegmentQueue {
        &self.queue
    }

    pub fn notice(&self) -> Option<&ReviewError> {
        self.notice.as_ref()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn current_resolved(&self) -> bool {
        match (self.queue.cursor(), self.resolved_through) {
            (Some(c), Some(r)) => c <= r,
            _ => false,
        }
    }

    /// The current segment when it still awaits a save or skip.
    fn displayed(&self) -> Option<&Segment> {
        if self.current_resolved() {
            None
        } else {
            self.queue.current()
        }
    }

    fn actionable(&mut self) -> Result<(usize, SegmentId), ReviewError> {
        if self.pending_undo.is_some() {
            return self.reject(ReviewError::Busy);
        }
        let (Some(index), Some(segment)) = (self.queue.cursor(), self.queue.current()) else {
            return self.reject(ReviewError::NoCurrentSegment);
        };
        let segment_id = segment.segment_id();
        if self.current_resolved() {
            return self.reject(ReviewError::AlreadyResolved { segment_id });
        }
        Ok((index, segment_id))
    }

    fn record_action(&mut self, index: usize, segment_id: SegmentId, seq: Option<u64>, kind: ActionKind) {
        self.resolved_through = Some(index);
        self.last_revision = None;
        // An action whose command never left the process can neither be acknowledged nor undone.
        self.last_action = seq.map(|seq| TerminalAction { seq, index, segment_id, kind });
    }

    fn issue_fetch(&mut self) -> bool {
        match self.dispatch(GatewayAction::FetchPage, None, |seq| GatewayCommand::FetchPage { seq }) {
            Some(seq) => {
                tracing::debug!(seq, "prefetch dispatched");
                self.prefetch = Some(seq);
                true
            }
            None => false,
        }
    }

    /// Allocates a sequence number and sends the command built from it.
    ///
    /// Returns `None` (and records a notice) when the worker is gone.
    fn dispatch(
        &mut self,
        action: GatewayAction,
        segment_id: Option<SegmentId>,
        build: impl FnOnce(u64) -> GatewayCommand,
    ) -> Option<u64> {
        let seq = self.next_seq;
        self.next_seq += 1;
        match self.commands.send(build(seq)) {
            Ok(()) => Some(seq),
            Err(_) => {
                tracing::error!(%action, "gateway worker is not running");
                self.notice =
                    Some(ReviewError::transient(action, segment_id, &GatewayError::WorkerStopped));
                None
            }
        }
    }

    fn reset_draft(&mut self) {
        self.draft = self
            .queue
            .current()
            .map(|s| s.edited_text().to_owned())
            .unwrap_or_default();
    }

    fn reject<T>(&mut self, err: ReviewError) -> Result<T, ReviewError> {
        tracing::debug!(error = %err, "command rejected");
        self.notice = Some(err.clone());
        Err(err)
    }
}
