//! End-to-end review sessions: `SessionController` driving the gateway worker over a
//! real SQLite store.

use std::sync::Arc;
use std::time::Duration;

use ocrfix_core::db;
use ocrfix_core::gateway::sqlite::SqliteGateway;
use ocrfix_core::gateway::worker::spawn_gateway_worker;
use ocrfix_core::{
    GatewayReply, NewSegment, ReviewError, ReviewGateway, SessionController, SessionState,
    UndoRejection,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

struct Harness {
    controller: SessionController,
    replies: UnboundedReceiver<GatewayReply>,
    gateway: Arc<SqliteGateway>,
    worker: JoinHandle<()>,
}

async fn harness(texts: &[&str], page_size: usize) -> Harness {
    let dir = tempfile::TempDir::new().unwrap();
    let conn = db::open_db(dir.keep().join("flow.db")).await.unwrap();
    let rows = texts
        .iter()
        .enumerate()
        .map(|(i, t)| NewSegment {
            doc_id: 7,
            page: 1,
            x1: 0,
            y1: i as i64 * 40,
            x2: 300,
            y2: i as i64 * 40 + 30,
            ocr_text: (*t).to_owned(),
        })
        .collect();
    db::import_segments(&conn, rows).await.unwrap();

    let gateway = Arc::new(SqliteGateway::new(conn, page_size, Duration::from_secs(600)));
    let (reply_tx, replies) = tokio::sync::mpsc::unbounded_channel();
    let (commands, worker) = spawn_gateway_worker(gateway.clone(), move |reply| {
        let _ = reply_tx.send(reply);
    });
    Harness { controller: SessionController::new(commands), replies, gateway, worker }
}

impl Harness {
    /// Applies replies until the worker has been quiet for a short while.
    async fn settle(&mut self) {
        while let Ok(Some(reply)) =
            tokio::time::timeout(Duration::from_millis(200), self.replies.recv()).await
        {
            self.controller.apply(reply);
        }
    }

    /// Quits the way the binary does and hands back the store for inspection.
    async fn quit(self) -> Arc<SqliteGateway> {
        assert!(self.controller.close(self.worker, Duration::from_secs(5)).await);
        self.gateway
    }

    fn current_text(&self) -> Option<String> {
        self.controller.view().segment.map(|s| s.ocr_text().to_owned())
    }
}

#[tokio::test]
async fn review_until_exhausted() {
    let mut h = harness(&["alpha", "beta", "gamma"], 2).await;
    h.controller.start();
    h.settle().await;
    assert_eq!(h.current_text().as_deref(), Some("alpha"));

    h.controller.save("Alpha").unwrap();
    h.settle().await;
    assert_eq!(h.current_text().as_deref(), Some("beta"));

    h.controller.skip().unwrap();
    h.settle().await;
    assert_eq!(h.current_text().as_deref(), Some("gamma"));

    h.controller.save("Gamma").unwrap();
    h.settle().await;

    // "beta" was skipped, so the store offers it again before reporting exhaustion.
    assert_eq!(h.current_text().as_deref(), Some("beta"));
    h.controller.save("Beta").unwrap();
    h.settle().await;
    assert_eq!(h.controller.state(), SessionState::Exhausted);
    assert!(h.controller.view().segment.is_none());

    let queue = h.controller.queue();
    for segment in (0..queue.len()).filter_map(|i| queue.get(i)) {
        let review = db::latest_review(h.gateway.connection(), segment.segment_id()).await.unwrap();
        assert!(review.is_some(), "{} should have a review", segment.ocr_text());
    }
}

#[tokio::test]
async fn undo_reopens_previous_segment() {
    let mut h = harness(&["one", "two", "three"], 10).await;
    h.controller.start();
    h.settle().await;

    h.controller.save("ONE").unwrap();
    h.settle().await;
    assert_eq!(h.current_text().as_deref(), Some("two"));
    assert!(h.controller.last_revision().is_some(), "save acknowledged");

    h.controller.undo().unwrap();
    h.settle().await;
    assert_eq!(h.current_text().as_deref(), Some("one"));
    assert_eq!(h.controller.draft(), "one");
    assert_eq!(h.controller.last_revision(), None);

    let seg = h.controller.view().segment.unwrap().segment_id();
    assert!(db::latest_review(h.gateway.connection(), seg).await.unwrap().is_none());

    assert_eq!(
        h.controller.undo(),
        Err(ReviewError::InvalidUndo(UndoRejection::NothingToUndo))
    );

    h.controller.save("One").unwrap();
    h.settle().await;
    let (_, text) = db::latest_review(h.gateway.connection(), seg).await.unwrap().unwrap();
    assert_eq!(text, "One");
    assert!(h.controller.can_undo());
    assert_eq!(h.current_text().as_deref(), Some("two"));
}

#[tokio::test]
async fn empty_store_exhausts_immediately() {
    let mut h = harness(&[], 5).await;
    h.controller.start();
    h.settle().await;
    assert_eq!(h.controller.state(), SessionState::Exhausted);
    assert!(h.controller.view().segment.is_none());
    assert!(!h.controller.view().is_busy);
}

#[tokio::test]
async fn quitting_flushes_queued_save_and_frees_unreviewed_work() {
    let mut h = harness(&["alpha", "beta", "gamma"], 20).await;
    h.controller.start();
    h.settle().await;
    let alpha = h.controller.current().unwrap().segment_id();

    // Quit straight after saving, before the worker has reported anything back.
    h.controller.save("Alpha").unwrap();
    let gateway = h.quit().await;

    let (_, text) = db::latest_review(gateway.connection(), alpha).await.unwrap().unwrap();
    assert_eq!(text, "Alpha");

    // The harness lease is ten minutes, so only released claims can be handed out again.
    let texts: Vec<String> = gateway
        .fetch_page()
        .await
        .unwrap()
        .segments
        .iter()
        .map(|s| s.ocr_text().to_owned())
        .collect();
    assert_eq!(texts, vec!["beta", "gamma"]);
}
