//! Typed errors for the review workflow.
//!
//! - `GatewayError`: a single backend call failed (network, HTTP status, decoding, SQLite).
//! - `ReviewError`: what the controller reports to the presenter. Every variant is
//!   recoverable by further operator action.

use thiserror::Error;

use crate::types::SegmentId;

/// Failure of one `ReviewGateway` call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned HTTP {code}")]
    Status { code: u16 },

    #[error("backend rejected the request (status '{status}')")]
    Rejected { status: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("segment {segment_id} has no matching record")]
    NotFound { segment_id: SegmentId },

    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("gateway worker has stopped")]
    WorkerStopped,
}

/// Which gateway call a `TransientNetwork` error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayAction {
    FetchPage,
    Save,
    Skip,
    Undo,
    ReleaseClaims,
}

impl std::fmt::Display for GatewayAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GatewayAction::FetchPage => "fetch",
            GatewayAction::Save => "save",
            GatewayAction::Skip => "skip",
            GatewayAction::Undo => "undo",
            GatewayAction::ReleaseClaims => "release",
        };
        f.write_str(name)
    }
}

/// Why an undo request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoRejection {
    /// The last terminal action was a skip, an undo, or nothing at all.
    NothingToUndo,
    /// A save was issued but its revision id has not come back yet.
    AwaitingAcknowledgement,
    /// An undo is already on its way to the backend.
    UndoInFlight,
}

impl std::fmt::Display for UndoRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            UndoRejection::NothingToUndo => "nothing to undo",
            UndoRejection::AwaitingAcknowledgement => "nothing to undo yet (save not acknowledged)",
            UndoRejection::UndoInFlight => "undo already in progress",
        };
        f.write_str(msg)
    }
}

/// Errors surfaced to the presenter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("{action} failed{}: {message}", segment_suffix(.segment_id))]
    TransientNetwork {
        action: GatewayAction,
        segment_id: Option<SegmentId>,
        message: String,
    },

    #[error("discarded stale reply #{seq}")]
    StaleResponse { seq: u64 },

    #[error("{0}")]
    InvalidUndo(UndoRejection),

    #[error("no segment is being displayed")]
    NoCurrentSegment,

    #[error("segment {segment_id} was already saved or skipped")]
    AlreadyResolved { segment_id: SegmentId },

    #[error("suggestion {index} does not exist ({len} available)")]
    SuggestionOutOfRange { index: usize, len: usize },

    #[error("waiting for the backend to confirm undo")]
    Busy,
}

fn segment_suffix(segment_id: &Option<SegmentId>) -> String {
    match segment_id {
        Some(id) => format!(" for segment {id}"),
        None => String::new(),
    }
}

impl ReviewError {
    pub(crate) fn transient(
        action: GatewayAction,
        segment_id: Option<SegmentId>,
        err: &GatewayError,
    ) -> Self {
        ReviewError::TransientNetwork { action, segment_id, message: err.to_string() }
    }
}
