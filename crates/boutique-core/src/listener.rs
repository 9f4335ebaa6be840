// ── Change notification listener ──
//
// Bridges a realtime change feed into the store. Every insert, update or
// delete event re-fetches the whole affected collection; events are not
// deduplicated. A lagged receiver triggers a full refresh instead.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use boutique_api::ChangeEvent;

use crate::controller::Controller;

/// A live change-feed subscription.
///
/// Dropping the handle cancels the bridge task; [`unsubscribe`](Self::unsubscribe)
/// additionally waits for it to finish.
pub struct ChangeSubscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ChangeSubscription {
    /// Stop the bridge task and wait for it to exit.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// `true` until cancelled or the feed closes.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub(crate) fn spawn(
    controller: Controller,
    mut rx: broadcast::Receiver<Arc<ChangeEvent>>,
    cancel: CancellationToken,
) -> ChangeSubscription {
    let task_cancel = cancel.clone();

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = task_cancel.cancelled() => break,
                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            debug!(table = %event.table, kind = %event.kind, "change received");
                            if let Err(e) = controller.refresh_collection(event.table).await {
                                warn!(table = %event.table, error = %e, "re-fetch after change failed");
                            }
                            controller.broadcast_change(event);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "change feed lagged, refreshing everything");
                            if let Err(e) = controller.refresh_data().await {
                                warn!(error = %e, "full refresh after lag failed");
                            }
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
        debug!("change listener stopped");
    });

    ChangeSubscription {
        cancel,
        handle: Some(handle),
    }
}
