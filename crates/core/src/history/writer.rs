use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use super::events::HistoryRecord;
use super::handle::{HistoryHandle, SyncEventEnvelope};
use super::store::HistoryStore;

/// Background task that drains emitted events into the store
///
/// Runs until every handle clone is dropped, then exits after the channel
/// is fully drained.
pub struct HistoryWriter {
    rx: mpsc::Receiver<SyncEventEnvelope>,
    store: Arc<dyn HistoryStore>,
}

impl HistoryWriter {
    pub fn new(rx: mpsc::Receiver<SyncEventEnvelope>, store: Arc<dyn HistoryStore>) -> Self {
        Self { rx, store }
    }

    pub async fn run(mut self) {
        info!("History writer started");
        while let Some(envelope) = self.rx.recv().await {
            let record = HistoryRecord {
                id: 0, // Will be set by database
                timestamp: envelope.timestamp,
                event_type: envelope.event.event_type().to_string(),
                external_id: envelope.event.external_id(),
                user_id: envelope.event.user_id().map(String::from),
                data: envelope.event,
            };
            if let Err(e) = self.store.insert(&record).await {
                error!("Failed to write history record: {}", e);
            }
        }
        info!("History writer shutting down");
    }
}

/// Create a connected handle/writer pair
///
/// The writer must be spawned by the caller; events emitted before it runs
/// queue up to `buffer_size` deep.
pub fn create_history_system(
    store: Arc<dyn HistoryStore>,
    buffer_size: usize,
) -> (HistoryHandle, HistoryWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = HistoryHandle::new(tx);
    let writer = HistoryWriter::new(rx, store);
    (handle, writer)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::history::events::SyncEvent;
    use crate::history::store::{HistoryError, HistoryFilter};

    struct MockStore {
        records: Mutex<Vec<HistoryRecord>>,
        should_fail: AtomicBool,
        attempts: AtomicU32,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                should_fail: AtomicBool::new(false),
                attempts: AtomicU32::new(0),
            }
        }

        async fn wait_for_attempts(&self, n: u32) {
            for _ in 0..100 {
                if self.attempts.load(Ordering::SeqCst) >= n {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            panic!("store never saw {} insert attempts", n);
        }
    }

    #[async_trait]
    impl HistoryStore for MockStore {
        async fn insert(&self, record: &HistoryRecord) -> Result<i64, HistoryError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.should_fail.load(Ordering::SeqCst) {
                return Err(HistoryError::Database("mock failure".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            records.push(record.clone());
            Ok(records.len() as i64)
        }

        async fn query(&self, _filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, HistoryError> {
            Ok(self.records.lock().unwrap().clone())
        }

        async fn count(&self, _filter: &HistoryFilter) -> Result<u64, HistoryError> {
            Ok(self.records.lock().unwrap().len() as u64)
        }
    }

    #[tokio::test]
    async fn test_writer_receives_and_stores() {
        let store = Arc::new(MockStore::new());
        let (handle, writer) = create_history_system(store.clone(), 16);
        let writer_task = tokio::spawn(writer.run());

        handle
            .emit(SyncEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc123".to_string(),
            })
            .await;
        drop(handle);
        writer_task.await.unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "service_started");
    }

    #[tokio::test]
    async fn test_writer_stores_multiple_events_in_order() {
        let store = Arc::new(MockStore::new());
        let (handle, writer) = create_history_system(store.clone(), 16);
        let writer_task = tokio::spawn(writer.run());

        for i in 0..5 {
            handle
                .emit(SyncEvent::StatusChanged {
                    external_id: i,
                    title: format!("Title {}", i),
                    from_status: "upcoming".to_string(),
                    to_status: "ongoing".to_string(),
                })
                .await;
        }
        drop(handle);
        writer_task.await.unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].external_id, Some(0));
        assert_eq!(records[4].external_id, Some(4));
    }

    #[tokio::test]
    async fn test_writer_continues_after_store_failure() {
        let store = Arc::new(MockStore::new());
        let (handle, writer) = create_history_system(store.clone(), 16);
        let writer_task = tokio::spawn(writer.run());

        store.should_fail.store(true, Ordering::SeqCst);
        handle
            .emit(SyncEvent::ServiceStopped {
                reason: "dropped".to_string(),
            })
            .await;
        store.wait_for_attempts(1).await;

        store.should_fail.store(false, Ordering::SeqCst);
        handle
            .emit(SyncEvent::ServiceStopped {
                reason: "stored".to_string(),
            })
            .await;
        drop(handle);
        writer_task.await.unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        match &records[0].data {
            SyncEvent::ServiceStopped { reason } => assert_eq!(reason, "stored"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_writer_extracts_record_metadata() {
        let store = Arc::new(MockStore::new());
        let (handle, writer) = create_history_system(store.clone(), 16);
        let writer_task = tokio::spawn(writer.run());

        handle
            .emit(SyncEvent::TitleAdded {
                external_id: 1396,
                media_type: "tv".to_string(),
                title: "Signal".to_string(),
                status: "complete".to_string(),
                requested_by: "curator".to_string(),
            })
            .await;
        drop(handle);
        writer_task.await.unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records[0].external_id, Some(1396));
        assert_eq!(records[0].user_id.as_deref(), Some("curator"));
        assert_eq!(records[0].event_type, "title_added");
    }

    #[tokio::test]
    async fn test_writer_shuts_down_when_all_handles_dropped() {
        let store = Arc::new(MockStore::new());
        let (handle, writer) = create_history_system(store.clone(), 16);
        let writer_task = tokio::spawn(writer.run());

        let cloned = handle.clone();
        cloned
            .emit(SyncEvent::ServiceStopped {
                reason: "shutdown signal".to_string(),
            })
            .await;
        drop(cloned);
        drop(handle);

        writer_task.await.unwrap();
        assert_eq!(store.records.lock().unwrap().len(), 1);
    }
}
