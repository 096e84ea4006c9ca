//! `ReviewGateway` backed by a local SQLite file.

use std::time::Duration;

use async_trait::async_trait;
use tokio_rusqlite::Connection;

use super::{Page, ReviewGateway, SaveReceipt};
use crate::db;
use crate::error::GatewayError;
use crate::types::{RevisionId, SegmentId};

pub struct SqliteGateway {
    conn: Connection,
    page_size: usize,
    lease: Duration,
}

impl SqliteGateway {
    /// Wraps an already-migrated connection (see [`db::open_db`]).
    ///
    /// # Arguments
    ///
    /// * `page_size` - maximum number of segments claimed per fetch
    /// * `lease` - how long a claimed segment stays reserved for this reviewer
    pub fn new(conn: Connection, page_size: usize, lease: Duration) -> Self {
        Self { conn, page_size: page_size.max(1), lease }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[async_trait]
impl ReviewGateway for SqliteGateway {
    async fn fetch_page(&self) -> Result<Page, GatewayError> {
        let lease_secs = i64::try_from(self.lease.as_secs()).unwrap_or(i64::MAX);
        let segments = db::claim_page(&self.conn, self.page_size, lease_secs).await?;
        tracing::debug!(count = segments.len(), "claimed segments from local store");
        Ok(Page { segments })
    }

    async fn submit_save(
        &self,
        segment_id: SegmentId,
        text: &str,
    ) -> Result<SaveReceipt, GatewayError> {
        match db::record_review(&self.conn, segment_id, text).await? {
            Some(revision_id) => Ok(SaveReceipt { revision_id }),
            None => Err(GatewayError::NotFound { segment_id }),
        }
    }

    async fn submit_skip(&self, segment_id: SegmentId) -> Result<(), GatewayError> {
        if db::record_skip(&self.conn, segment_id).await? {
            Ok(())
        } else {
            Err(GatewayError::NotFound { segment_id })
        }
    }

    async fn submit_undo(
        &self,
        segment_id: SegmentId,
        revision_id: RevisionId,
    ) -> Result<(), GatewayError> {
        if db::delete_review(&self.conn, segment_id, revision_id).await? {
            Ok(())
        } else {
            Err(GatewayError::NotFound { segment_id })
        }
    }

    async fn release_claims(&self, segment_ids: &[SegmentId]) -> Result<(), GatewayError> {
        let released = db::release_claims(&self.conn, segment_ids).await?;
        tracing::debug!(requested = segment_ids.len(), released, "released segment claims");
        Ok(())
    }
}
