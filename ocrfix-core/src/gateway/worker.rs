//! Background task that owns the gateway for the lifetime of a session.
//!
//! Commands are handled one at a time in arrival order, so a save or skip for one
//! segment always reaches the backend before anything issued for the next one.
//! The task exits when every `GatewayCommand` sender has been dropped, after
//! finishing whatever was already queued; callers await the `JoinHandle` on
//! shutdown so those calls are not lost.

use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::{GatewayCommand, GatewayReply, ReviewGateway};

/// Creates the command channel and spawns the worker on the current tokio runtime.
///
/// Every reply is handed to `deliver`; the TUI wraps it into its own event type, tests
/// push it into a plain channel.
pub fn spawn_gateway_worker<F>(
    gateway: Arc<dyn ReviewGateway>,
    deliver: F,
) -> (UnboundedSender<GatewayCommand>, JoinHandle<()>)
where
    F: Fn(GatewayReply) + Send + 'static,
{
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = tokio::spawn(gateway_worker_loop(gateway, rx, deliver));
    (tx, handle)
}

/// Drains `rx` until it closes, awaiting each gateway call before taking the next command.
pub async fn gateway_worker_loop<F>(
    gateway: Arc<dyn ReviewGateway>,
    mut rx: UnboundedReceiver<GatewayCommand>,
    deliver: F,
) where
    F: Fn(GatewayReply) + Send + 'static,
{
    while let Some(command) = rx.recv().await {
        tracing::debug!(seq = command.seq(), ?command, "gateway call");
        let reply = handle_command(gateway.as_ref(), command).await;
        deliver(reply);
    }
    tracing::debug!("gateway worker exiting: command channel closed");
}

/// Runs one command against the gateway and wraps the outcome.
pub async fn handle_command(gateway: &dyn ReviewGateway, command: GatewayCommand) -> GatewayReply {
    match command {
        GatewayCommand::FetchPage { seq } => GatewayReply::PageLoaded {
            seq,
            result: gateway.fetch_page().await,
        },
        GatewayCommand::Save { seq, segment_id, text } => GatewayReply::Saved {
            seq,
            segment_id,
            result: gateway.submit_save(segment_id, &text).await,
        },
        GatewayCommand::Skip { seq, segment_id } => GatewayReply::Skipped {
            seq,
            segment_id,
            result: gateway.submit_skip(segment_id).await,
        },
        GatewayCommand::Undo { seq, segment_id, revision_id } => GatewayReply::Undone {
            seq,
            segment_id,
            result: gateway.submit_undo(segment_id, revision_id).await,
        },
        GatewayCommand::ReleaseClaims { seq, segment_ids } => GatewayReply::ClaimsReleased {
            seq,
            count: segment_ids.len(),
            result: gateway.release_claims(&segment_ids).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::{Page, SaveReceipt};
    use crate::types::{RevisionId, SegmentId};

    /// Records call order and answers saves with increasing revision ids.
    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<String>>,
        fetch_delay: Duration,
    }

    #[async_trait]
    impl ReviewGateway for Recording {
        async fn fetch_page(&self) -> Result<Page, GatewayError> {
            tokio::time::sleep(self.fetch_delay).await;
            self.calls.lock().unwrap().push("fetch".into());
            Ok(Page::default())
        }

        async fn submit_save(
            &self,
            segment_id: SegmentId,
            text: &str,
        ) -> Result<SaveReceipt, GatewayError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(format!("save {segment_id} {text}"));
            Ok(SaveReceipt { revision_id: RevisionId(calls.len() as i64) })
        }

        async fn submit_skip(&self, segment_id: SegmentId) -> Result<(), GatewayError> {
            self.calls.lock().unwrap().push(format!("skip {segment_id}"));
            Ok(())
        }

        async fn submit_undo(
            &self,
            segment_id: SegmentId,
            _revision_id: RevisionId,
        ) -> Result<(), GatewayError> {
            self.calls.lock().unwrap().push(format!("undo {segment_id}"));
            Err(GatewayError::NotFound { segment_id })
        }
    }

    #[tokio::test]
    async fn commands_are_handled_in_submission_order() {
        let gateway = Arc::new(Recording::default());
        let (reply_tx, mut reply_rx) = tokio::sync::mpsc::unbounded_channel();
        let (tx, handle) = spawn_gateway_worker(gateway.clone(), move |reply| {
            let _ = reply_tx.send(reply);
        });

        tx.send(GatewayCommand::Save { seq: 1, segment_id: SegmentId(1), text: "a".into() })
            .unwrap();
        tx.send(GatewayCommand::Skip { seq: 2, segment_id: SegmentId(2) }).unwrap();
        tx.send(GatewayCommand::FetchPage { seq: 3 }).unwrap();
        tx.send(GatewayCommand::Undo {
            seq: 4,
            segment_id: SegmentId(1),
            revision_id: RevisionId(1),
        })
        .unwrap();
        drop(tx);
        handle.await.unwrap();

        let mut seqs = Vec::new();
        while let Ok(reply) = reply_rx.try_recv() {
            seqs.push(reply.seq());
        }
        assert_eq!(seqs, vec![1, 2, 3, 4]);
        assert_eq!(
            *gateway.calls.lock().unwrap(),
            vec!["save 1 a", "skip 2", "fetch", "undo 1"]
        );
    }

    #[tokio::test]
    async fn failures_are_delivered_as_replies() {
        let gateway = Recording::default();
        let reply = handle_command(
            &gateway,
            GatewayCommand::Undo { seq: 9, segment_id: SegmentId(5), revision_id: RevisionId(2) },
        )
        .await;
        match reply {
            GatewayReply::Undone { seq, segment_id, result } => {
                assert_eq!(seq, 9);
                assert_eq!(segment_id, SegmentId(5));
                assert!(matches!(result, Err(GatewayError::NotFound { .. })));
            }
            other => panic!("expected Undone, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn queued_save_reaches_gateway_after_senders_close() {
        let gateway = Arc::new(Recording {
            fetch_delay: Duration::from_millis(200),
            ..Recording::default()
        });
        let (reply_tx, mut reply_rx) = tokio::sync::mpsc::unbounded_channel();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tx.send(GatewayCommand::FetchPage { seq: 1 }).unwrap();
        tx.send(GatewayCommand::Save { seq: 2, segment_id: SegmentId(4), text: "final edit".into() })
            .unwrap();
        drop(tx);

        gateway_worker_loop(gateway.clone(), rx, move |reply| {
            let _ = reply_tx.send(reply);
        })
        .await;

        assert_eq!(*gateway.calls.lock().unwrap(), vec!["fetch", "save 4 final edit"]);
        let mut replies = Vec::new();
        while let Ok(reply) = reply_rx.try_recv() {
            replies.push(reply);
        }
        assert!(matches!(replies.last(), Some(GatewayReply::Saved { seq: 2, result: Ok(_), .. })));
    }

    #[tokio::test]
    async fn join_handle_completes_once_queue_is_drained() {
        let gateway = Arc::new(Recording {
            fetch_delay: Duration::from_millis(50),
            ..Recording::default()
        });
        let (tx, handle) = spawn_gateway_worker(gateway.clone(), |_| {});
        tx.send(GatewayCommand::FetchPage { seq: 1 }).unwrap();
        tx.send(GatewayCommand::Skip { seq: 2, segment_id: SegmentId(3) }).unwrap();
        tx.send(GatewayCommand::ReleaseClaims { seq: 3, segment_ids: vec![SegmentId(8)] })
            .unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker drains within the grace period")
            .unwrap();
        assert_eq!(*gateway.calls.lock().unwrap(), vec!["fetch", "skip 3"]);
    }
}
