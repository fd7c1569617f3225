use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::events::SyncEvent;

/// An event paired with the moment it was emitted
#[derive(Debug, Clone)]
pub struct SyncEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: SyncEvent,
}

/// Handle for emitting sync history events
///
/// Cheap to clone; all clones feed the same writer task.
#[derive(Clone)]
pub struct HistoryHandle {
    tx: mpsc::Sender<SyncEventEnvelope>,
}

impl HistoryHandle {
    pub(super) fn new(tx: mpsc::Sender<SyncEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an event to the history writer
    ///
    /// Never fails from the caller's perspective. If the writer is gone the
    /// event is dropped and an error is logged; sync work must not fail on
    /// history bookkeeping.
    pub async fn emit(&self, event: SyncEvent) {
        let envelope = SyncEventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if let Err(e) = self.tx.send(envelope).await {
            tracing::error!("Failed to emit history event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_delivers_envelope() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = HistoryHandle::new(tx);

        handle
            .emit(SyncEvent::ServiceStopped {
                reason: "shutdown signal".to_string(),
            })
            .await;

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event.event_type(), "service_stopped");
        assert!(envelope.timestamp <= Utc::now());
    }

    #[tokio::test]
    async fn test_emit_on_closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let handle = HistoryHandle::new(tx);

        handle
            .emit(SyncEvent::ServiceStopped {
                reason: "shutdown signal".to_string(),
            })
            .await;
    }

    #[tokio::test]
    async fn test_clones_share_channel() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = HistoryHandle::new(tx);
        let other = handle.clone();

        other
            .emit(SyncEvent::RefreshCycleCompleted {
                titles_checked: 1,
                titles_changed: 0,
                errors: 0,
                duration_ms: 10,
            })
            .await;

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event.event_type(), "refresh_cycle_completed");
    }
}
