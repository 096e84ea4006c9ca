//! Backend boundary of the review workflow.
//!
//! The controller never awaits the backend. It sends sequence-numbered
//! [`GatewayCommand`]s to a background worker ([`worker`]) that owns an
//! `Arc<dyn ReviewGateway>`, and receives each outcome later as a [`GatewayReply`]
//! carrying the same sequence number.
pub mod http;
pub mod sqlite;
pub mod worker;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{RevisionId, Segment, SegmentId};

/// One page of work. An empty page means the backend has nothing left.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub segments: Vec<Segment>,
}

/// Acknowledgment of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReceipt {
    pub revision_id: RevisionId,
}

/// Remote (or local) persistence of review decisions.
///
/// Real implementations: `SqliteGateway`, `HttpGateway`. Tests script their own.
#[async_trait]
pub trait ReviewGateway: Send + Sync {
    async fn fetch_page(&self) -> Result<Page, GatewayError>;

    async fn submit_save(
        &self,
        segment_id: SegmentId,
        text: &str,
    ) -> Result<SaveReceipt, GatewayError>;

    async fn submit_skip(&self, segment_id: SegmentId) -> Result<(), GatewayError>;

    async fn submit_undo(
        &self,
        segment_id: SegmentId,
        revision_id: RevisionId,
    ) -> Result<(), GatewayError>;

    /// Hands segments this reviewer loaded but never resolved back to the pool.
    ///
    /// Backends without reservations have nothing to do.
    async fn release_claims(&self, _segment_ids: &[SegmentId]) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Requests sent from the controller to the gateway worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCommand {
    FetchPage { seq: u64 },
    Save { seq: u64, segment_id: SegmentId, text: String },
    Skip { seq: u64, segment_id: SegmentId },
    Undo { seq: u64, segment_id: SegmentId, revision_id: RevisionId },
    ReleaseClaims { seq: u64, segment_ids: Vec<SegmentId> },
}

impl GatewayCommand {
    pub fn seq(&self) -> u64 {
        match self {
            GatewayCommand::FetchPage { seq }
            | GatewayCommand::Save { seq, .. }
            | GatewayCommand::Skip { seq, .. }
            | GatewayCommand::Undo { seq, .. }
            | GatewayCommand::ReleaseClaims { seq, .. } => *seq,
        }
    }
}

/// Outcomes delivered back to the controller, tagged with the command's sequence number.
#[derive(Debug)]
pub enum GatewayReply {
    PageLoaded {
        seq: u64,
        result: Result<Page, GatewayError>,
    },
    Saved {
        seq: u64,
        segment_id: SegmentId,
        result: Result<SaveReceipt, GatewayError>,
    },
    Skipped {
        seq: u64,
        segment_id: SegmentId,
        result: Result<(), GatewayError>,
    },
    Undone {
        seq: u64,
        segment_id: SegmentId,
        result: Result<(), GatewayError>,
    },
    ClaimsReleased {
        seq: u64,
        count: usize,
        result: Result<(), GatewayError>,
    },
}

impl GatewayReply {
    pub fn seq(&self) -> u64 {
        match self {
            GatewayReply::PageLoaded { seq, .. }
            | GatewayReply::Saved { seq, .. }
            | GatewayReply::Skipped { seq, .. }
            | GatewayReply::Undone { seq, .. }
            | GatewayReply::ClaimsReleased { seq, .. } => *seq,
        }
    }
}
