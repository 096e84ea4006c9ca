use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::suggest::suggestions_for;
use crate::types::{BoundingBox, NewSegment, RevisionId, Segment, SegmentId};

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// This function is the single entry point for all database connections.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: impl AsRef<Path>) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path.as_ref()).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}

/// Returns the current Unix timestamp in seconds.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Bulk-inserts OCR segments. Rows matching an existing `(doc_id, page, box)` are ignored.
///
/// Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the write transaction fails.
pub async fn import_segments(
    conn: &Connection,
    segments: Vec<NewSegment>,
) -> Result<usize, tokio_rusqlite::Error> {
    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO segments (doc_id, page, x1, y1, x2, y2, ocr_text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for s in &segments {
                inserted += stmt.execute(rusqlite::params![
                    s.doc_id, s.page, s.x1, s.y1, s.x2, s.y2, &s.ocr_text
                ])?;
            }
        }
        tx.commit()?;
        Ok::<_, rusqlite::Error>(inserted)
    })
    .await
}

/// Hands out up to `limit` segments that still need a review.
///
/// Candidates have non-empty OCR text, no review row, and no live claim (a claim
/// older than `lease_secs` has expired). Least-viewed segments come first. The
/// selected rows are stamped with the current time inside the same `BEGIN IMMEDIATE`
/// transaction, so two reviewers never receive the same segment.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query or write transaction fails.
pub async fn claim_page(
    conn: &Connection,
    limit: usize,
    lease_secs: i64,
) -> Result<Vec<Segment>, tokio_rusqlite::Error> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    conn.call(move |db| {
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let segments = {
            let mut stmt = tx.prepare(
                "SELECT s.id, s.doc_id, s.page, s.x1, s.y1, s.x2, s.y2, s.ocr_text
                 FROM segments s
                 WHERE s.ocr_text IS NOT NULL AND s.ocr_text != ''
                   AND NOT EXISTS (SELECT 1 FROM reviews r WHERE r.segment_id = s.id)
                   AND (s.claimed_at IS NULL OR s.claimed_at <= ?1)
                 ORDER BY s.view_count, s.id
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![now - lease_secs, limit], |r| {
                    let ocr_text: String = r.get(7)?;
                    let bounding_box = BoundingBox {
                        x1: r.get(3)?,
                        y1: r.get(4)?,
                        x2: r.get(5)?,
                        y2: r.get(6)?,
                    };
                    Ok(Segment::new(SegmentId(r.get(0)?), r.get(1)?, r.get(2)?, bounding_box, ocr_text.clone())
                        .with_suggestions(suggestions_for(&ocr_text)))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        {
            let mut claim = tx.prepare("UPDATE segments SET claimed_at = ?1 WHERE id = ?2")?;
            for segment in &segments {
                claim.execute(rusqlite::params![now, segment.segment_id().0])?;
            }
        }
        tx.commit()?;
        Ok::<_, rusqlite::Error>(segments)
    })
    .await
}

/// Stores `text` as the next revision of `segment_id` and bumps its view count.
///
/// Returns the new review row id, or `None` when the segment does not exist.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the write transaction fails.
pub async fn record_review(
    conn: &Connection,
    segment_id: SegmentId,
    text: &str,
) -> Result<Option<RevisionId>, tokio_rusqlite::Error> {
    let text = text.to_owned();

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let exists = tx
            .query_row("SELECT 1 FROM segments WHERE id = ?1", [segment_id.0], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let rev: i64 = tx.query_row(
            "SELECT COALESCE(MAX(rev), 0) + 1 FROM reviews WHERE segment_id = ?1",
            [segment_id.0],
            |r| r.get(0),
        )?;
        tx.execute(
            "INSERT INTO reviews (segment_id, rev, text, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![segment_id.0, rev, &text, now_secs()],
        )?;
        let revision = RevisionId(tx.last_insert_rowid());
        tx.execute(
            "UPDATE segments SET view_count = view_count + 1 WHERE id = ?1",
            [segment_id.0],
        )?;
        tx.commit()?;
        Ok::<_, rusqlite::Error>(Some(revision))
    })
    .await
}

/// Counts a skip against `segment_id` and releases its claim so it can be offered again.
///
/// Returns `false` when the segment does not exist.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the update fails.
pub async fn record_skip(
    conn: &Connection,
    segment_id: SegmentId,
) -> Result<bool, tokio_rusqlite::Error> {
    conn.call(move |db| {
        let changed = db.execute(
            "UPDATE segments SET view_count = view_count + 1, claimed_at = NULL WHERE id = ?1",
            [segment_id.0],
        )?;
        Ok::<_, rusqlite::Error>(changed > 0)
    })
    .await
}

/// Drops the claim on each of `segment_ids` that has not been reviewed, so the next
/// `claim_page` can hand it out again without waiting for the lease to expire.
///
/// Returns how many claims were cleared.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the write transaction fails.
pub async fn release_claims(
    conn: &Connection,
    segment_ids: &[SegmentId],
) -> Result<usize, tokio_rusqlite::Error> {
    let ids: Vec<i64> = segment_ids.iter().map(|id| id.0).collect();

    conn.call(move |db| {
        let tx = db.transaction()?;
        let mut released = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE segments SET claimed_at = NULL
                 WHERE id = ?1 AND claimed_at IS NOT NULL
                   AND NOT EXISTS (SELECT 1 FROM reviews r WHERE r.segment_id = segments.id)",
            )?;
            for id in ids {
                released += stmt.execute([id])?;
            }
        }
        tx.commit()?;
        Ok::<_, rusqlite::Error>(released)
    })
    .await
}

/// Deletes review `revision_id` of `segment_id`. Returns `false` if no such row exists.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the delete fails.
pub async fn delete_review(
    conn: &Connection,
    segment_id: SegmentId,
    revision_id: RevisionId,
) -> Result<bool, tokio_rusqlite::Error> {
    conn.call(move |db| {
        let changed = db.execute(
            "DELETE FROM reviews WHERE id = ?1 AND segment_id = ?2",
            [revision_id.0, segment_id.0],
        )?;
        Ok::<_, rusqlite::Error>(changed > 0)
    })
    .await
}

/// Newest review of `segment_id` as `(revision, text)`, if it has any.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn latest_review(
    conn: &Connection,
    segment_id: SegmentId,
) -> Result<Option<(RevisionId, String)>, tokio_rusqlite::Error> {
    conn.call(move |db| {
        db.query_row(
            "SELECT id, text FROM reviews WHERE segment_id = ?1 ORDER BY rev DESC LIMIT 1",
            [segment_id.0],
            |r| Ok((RevisionId(r.get(0)?), r.get(1)?)),
        )
        .optional()
    })
    .await
}
