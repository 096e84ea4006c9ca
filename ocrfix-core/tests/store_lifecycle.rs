//! Integration tests for the local SQLite store and its gateway.
//!
//! Exercises: open_db, migrate, import_segments, claim_page, record_review,
//! record_skip, delete_review, and `SqliteGateway` on top of them.

use std::time::Duration;

use ocrfix_core::db;
use ocrfix_core::gateway::sqlite::SqliteGateway;
use ocrfix_core::{GatewayError, NewSegment, ReviewGateway, SegmentId};

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("test.db");
    path.to_string_lossy().to_string()
}

fn new_segment(doc_id: i64, y: i64, text: &str) -> NewSegment {
    NewSegment { doc_id, page: 1, x1: 0, y1: y, x2: 200, y2: y + 20, ocr_text: text.to_owned() }
}

async fn seeded(texts: &[&str]) -> tokio_rusqlite::Connection {
    let conn = db::open_db(temp_db_path()).await.unwrap();
    let rows = texts
        .iter()
        .enumerate()
        .map(|(i, t)| new_segment(1, i as i64 * 30, t))
        .collect();
    db::import_segments(&conn, rows).await.unwrap();
    conn
}

#[tokio::test]
async fn open_db_applies_schema_and_wal() {
    let conn = db::open_db(temp_db_path()).await.unwrap();

    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?)
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");
}

#[tokio::test]
async fn reopening_keeps_data() {
    let path = temp_db_path();
    {
        let conn = db::open_db(&path).await.unwrap();
        db::import_segments(&conn, vec![new_segment(1, 0, "kept")]).await.unwrap();
    }
    let conn = db::open_db(&path).await.unwrap();
    let page = db::claim_page(&conn, 10, 600).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].ocr_text(), "kept");
}

#[tokio::test]
async fn import_ignores_duplicate_boxes() {
    let conn = db::open_db(temp_db_path()).await.unwrap();
    let first = db::import_segments(&conn, vec![new_segment(1, 0, "a"), new_segment(1, 30, "b")])
        .await
        .unwrap();
    let again = db::import_segments(&conn, vec![new_segment(1, 0, "a")]).await.unwrap();
    assert_eq!((first, again), (2, 0));
}

#[tokio::test]
async fn claims_prevent_handing_out_twice() {
    let conn = seeded(&["one", "two", "three"]).await;

    let first = db::claim_page(&conn, 2, 600).await.unwrap();
    let second = db::claim_page(&conn, 2, 600).await.unwrap();
    let third = db::claim_page(&conn, 2, 600).await.unwrap();

    let ids = |segs: &[ocrfix_core::Segment]| segs.iter().map(|s| s.ocr_text().to_owned()).collect::<Vec<_>>();
    assert_eq!(ids(&first), vec!["one", "two"]);
    assert_eq!(ids(&second), vec!["three"]);
    assert!(third.is_empty());
}

#[tokio::test]
async fn expired_claims_are_offered_again() {
    let conn = seeded(&["only"]).await;
    assert_eq!(db::claim_page(&conn, 5, 600).await.unwrap().len(), 1);
    // A zero-second lease expires immediately.
    assert_eq!(db::claim_page(&conn, 5, 0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn blank_ocr_text_is_never_offered() {
    let conn = seeded(&["", "real"]).await;
    let page = db::claim_page(&conn, 10, 600).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].ocr_text(), "real");
}

#[tokio::test]
async fn claimed_segments_carry_suggestions() {
    let conn = seeded(&["1 234.567"]).await;
    let page = db::claim_page(&conn, 1, 600).await.unwrap();
    assert_eq!(page[0].suggestions(), ["1,234,567", "1 234.567", ""]);
    assert_eq!(page[0].edited_text(), "1 234.567");
}

#[tokio::test]
async fn revisions_increase_per_segment() {
    let conn = seeded(&["x"]).await;
    let seg = db::claim_page(&conn, 1, 600).await.unwrap()[0].segment_id();

    let r1 = db::record_review(&conn, seg, "first").await.unwrap().unwrap();
    let r2 = db::record_review(&conn, seg, "second").await.unwrap().unwrap();
    assert_ne!(r1, r2);

    let (latest, text) = db::latest_review(&conn, seg).await.unwrap().unwrap();
    assert_eq!((latest, text.as_str()), (r2, "second"));

    assert!(db::delete_review(&conn, seg, r2).await.unwrap());
    let (latest, _) = db::latest_review(&conn, seg).await.unwrap().unwrap();
    assert_eq!(latest, r1);
}

#[tokio::test]
async fn gateway_save_then_undo_reopens_segment() {
    let conn = seeded(&["a", "b"]).await;
    let gateway = SqliteGateway::new(conn, 10, Duration::from_secs(0));

    let page = gateway.fetch_page().await.unwrap();
    let id = page.segments[0].segment_id();

    let receipt = gateway.submit_save(id, "A").await.unwrap();
    let (revision, text) = db::latest_review(gateway.connection(), id).await.unwrap().unwrap();
    assert_eq!((revision, text.as_str()), (receipt.revision_id, "A"));

    // Reviewed segments are no longer handed out.
    let again = gateway.fetch_page().await.unwrap();
    assert!(again.segments.iter().all(|s| s.segment_id() != id));

    gateway.submit_undo(id, receipt.revision_id).await.unwrap();
    assert!(db::latest_review(gateway.connection(), id).await.unwrap().is_none());
    let reopened = gateway.fetch_page().await.unwrap();
    assert!(reopened.segments.iter().any(|s| s.segment_id() == id));

    // The revision is gone, so a second undo has nothing to delete.
    assert!(matches!(
        gateway.submit_undo(id, receipt.revision_id).await,
        Err(GatewayError::NotFound { .. })
    ));
}

#[tokio::test]
async fn gateway_skip_releases_claim_and_demotes() {
    let conn = seeded(&["a", "b"]).await;
    let gateway = SqliteGateway::new(conn, 1, Duration::from_secs(600));

    let first = gateway.fetch_page().await.unwrap().segments[0].segment_id();
    gateway.submit_skip(first).await.unwrap();

    // The other segment has a lower view count now, so it comes first.
    let next = gateway.fetch_page().await.unwrap().segments[0].segment_id();
    assert_ne!(next, first);
    let after = gateway.fetch_page().await.unwrap().segments[0].segment_id();
    assert_eq!(after, first);
}

#[tokio::test]
async fn gateway_reports_unknown_segments() {
    let conn = seeded(&[]).await;
    let gateway = SqliteGateway::new(conn, 5, Duration::from_secs(600));
    assert!(gateway.fetch_page().await.unwrap().segments.is_empty());
    assert!(matches!(
        gateway.submit_save(SegmentId(404), "x").await,
        Err(GatewayError::NotFound { segment_id: SegmentId(404) })
    ));
    assert!(matches!(
        gateway.submit_skip(SegmentId(404)).await,
        Err(GatewayError::NotFound { .. })
    ));
}

#[tokio::test]
async fn released_claims_are_offered_after_relaunch() {
    let path = temp_db_path();
    let ids: Vec<SegmentId> = {
        let conn = db::open_db(&path).await.unwrap();
        let rows = vec![new_segment(1, 0, "a"), new_segment(1, 30, "b"), new_segment(1, 60, "c")];
        db::import_segments(&conn, rows).await.unwrap();
        let gateway = SqliteGateway::new(conn, 20, Duration::from_secs(1800));

        let page = gateway.fetch_page().await.unwrap();
        assert_eq!(page.segments.len(), 3);
        let ids: Vec<SegmentId> = page.segments.iter().map(|s| s.segment_id()).collect();
        gateway.submit_save(ids[0], "A").await.unwrap();
        gateway.release_claims(&ids[1..]).await.unwrap();
        ids
    };

    let conn = db::open_db(&path).await.unwrap();
    let gateway = SqliteGateway::new(conn, 20, Duration::from_secs(1800));
    let relaunch: Vec<SegmentId> =
        gateway.fetch_page().await.unwrap().segments.iter().map(|s| s.segment_id()).collect();
    assert_eq!(relaunch, ids[1..].to_vec());
}

#[tokio::test]
async fn release_skips_reviewed_and_unclaimed_segments() {
    let conn = seeded(&["a", "b", "c"]).await;
    let page = db::claim_page(&conn, 2, 600).await.unwrap();
    let (first, second) = (page[0].segment_id(), page[1].segment_id());
    db::record_review(&conn, first, "A").await.unwrap();

    // "c" was never claimed and "a" is reviewed: only "b" has a claim to drop.
    let all = [first, second, SegmentId(3), SegmentId(404)];
    assert_eq!(db::release_claims(&conn, &all).await.unwrap(), 1);

    let offered: Vec<String> = db::claim_page(&conn, 10, 600)
        .await
        .unwrap()
        .iter()
        .map(|s| s.ocr_text().to_owned())
        .collect();
    assert_eq!(offered, vec!["b", "c"]);
}
