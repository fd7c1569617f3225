//! Background refresh of non-final titles.
//!
//! Ongoing and upcoming titles keep moving upstream: new episodes air, a
//! planned show gets a premiere date, a returning series ends. The refresh
//! worker resyncs them on an interval so the catalog tracks along without
//! anyone calling the resync API by hand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::catalog::MediaCatalog;
use crate::history::SyncEvent;
use crate::metrics::REFRESH_CYCLES;

use super::engine::SyncEngine;
use super::types::TitleOverrides;

/// Tallies for one refresh cycle. `checked` counts every title attempted,
/// successful or not; `changed` counts status transitions.
#[derive(Debug, Default)]
struct CycleStats {
    checked: u32,
    changed: u32,
    errors: u32,
}

/// Periodically resyncs every title the catalog still marks refreshable.
pub struct RefreshWorker {
    engine: Arc<SyncEngine>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RefreshWorker {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            engine,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Whether the background loop is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the refresh loop (spawns a background task).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Refresh worker already running");
            return;
        }

        let engine = Arc::clone(&self.engine);
        let running = Arc::clone(&self.running);
        let interval_secs = self.engine.config.refresh.interval_secs;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Refresh loop started, interval {}s", interval_secs);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Refresh loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(interval_secs)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        Self::run_cycle(&engine, &running).await;
                    }
                }
            }
            info!("Refresh loop stopped");
        });
    }

    /// Stop the refresh loop gracefully.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Refresh worker not running");
            return;
        }

        info!("Stopping refresh worker");

        let _ = self.shutdown_tx.send(());

        // Give an in-flight cycle a moment to notice the cleared flag
        tokio::time::sleep(Duration::from_millis(500)).await;

        info!("Refresh worker stopped");
    }

    /// Run one cycle: load refreshable titles and resync each in turn.
    ///
    /// The running flag is re-checked between items so a stop request does
    /// not have to wait out the whole batch.
    async fn run_cycle(engine: &SyncEngine, running: &AtomicBool) -> CycleStats {
        let started = Instant::now();
        let mut stats = CycleStats::default();
        let delay = engine.config.inter_item_delay_ms;

        let batch = match engine
            .catalog
            .list_refreshable(engine.config.refresh.batch_limit as i64)
        {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Refresh cycle could not list titles: {}", e);
                stats.errors += 1;
                Vec::new()
            }
        };

        for item in batch {
            if !running.load(Ordering::Relaxed) {
                info!("Refresh cycle interrupted by shutdown");
                break;
            }

            let prior_status = item.status;
            match engine
                .resync_title(item.internal_id, TitleOverrides::default())
                .await
            {
                Ok(updated) => {
                    stats.checked += 1;
                    if updated.status != prior_status {
                        stats.changed += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        internal_id = item.internal_id,
                        title = %item.title,
                        error = %e,
                        "Refresh resync failed"
                    );
                    stats.checked += 1;
                    stats.errors += 1;
                }
            }

            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        REFRESH_CYCLES.inc();
        info!(
            "Refresh cycle complete: {} checked, {} changed, {} errors in {}ms",
            stats.checked, stats.changed, stats.errors, duration_ms
        );

        if let Some(ref history) = engine.history {
            history
                .emit(SyncEvent::RefreshCycleCompleted {
                    titles_checked: stats.checked,
                    titles_changed: stats.changed,
                    errors: stats.errors,
                    duration_ms,
                })
                .await;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MediaItem, MediaType, SqliteCatalog};
    use crate::filter::ContentFilter;
    use crate::status::TitleStatus;
    use crate::sync::config::SyncConfig;
    use crate::testing::{fixtures, MockMetadataProvider};

    fn make_engine(provider: Arc<MockMetadataProvider>, config: SyncConfig) -> SyncEngine {
        SyncEngine::new(
            Arc::new(SqliteCatalog::in_memory().unwrap()),
            provider,
            ContentFilter::default(),
            config,
        )
    }

    fn fast_config() -> SyncConfig {
        SyncConfig {
            inter_item_delay_ms: 0,
            ..Default::default()
        }
    }

    fn seed_item(catalog: &dyn MediaCatalog, external_id: i64, status: TitleStatus) -> i64 {
        let mut item = MediaItem::new(external_id, MediaType::Tv, format!("Title {}", external_id));
        item.status = status;
        catalog.upsert_media(&item).unwrap()
    }

    #[tokio::test]
    async fn test_cycle_resyncs_and_counts_status_changes() {
        let provider = Arc::new(MockMetadataProvider::new());
        let mut detail = fixtures::tv_detail(1396, "Signal", 1, 4);
        detail.status_text = "Ended".to_string();
        provider.add_detail(detail).await;
        provider.add_season(1396, fixtures::season(1, 4)).await;

        let engine = make_engine(provider, fast_config());
        let internal_id = seed_item(engine.catalog.as_ref(), 1396, TitleStatus::Ongoing);
        seed_item(engine.catalog.as_ref(), 500, TitleStatus::Complete);

        let running = AtomicBool::new(true);
        let stats = RefreshWorker::run_cycle(&engine, &running).await;

        assert_eq!(stats.checked, 1);
        assert_eq!(stats.changed, 1);
        assert_eq!(stats.errors, 0);

        let stored = engine.catalog.get_media(internal_id).unwrap();
        assert_eq!(stored.status, TitleStatus::Complete);
        assert_eq!(stored.title, "Signal");
        assert_eq!(engine.catalog.count_episodes(internal_id).unwrap(), 4);
    }

    #[tokio::test]
    async fn test_cycle_with_nothing_refreshable() {
        let provider = Arc::new(MockMetadataProvider::new());
        let engine = make_engine(provider.clone(), fast_config());
        seed_item(engine.catalog.as_ref(), 500, TitleStatus::Complete);

        let running = AtomicBool::new(true);
        let stats = RefreshWorker::run_cycle(&engine, &running).await;

        assert_eq!(stats.checked, 0);
        assert_eq!(stats.changed, 0);
        assert_eq!(stats.errors, 0);
        assert_eq!(provider.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_item_counted_siblings_still_refreshed() {
        let provider = Arc::new(MockMetadataProvider::new());
        // No detail scripted for 100, so its resync fails outright
        provider.add_detail(fixtures::tv_detail(1396, "Signal", 0, 0)).await;

        let engine = make_engine(provider, fast_config());
        seed_item(engine.catalog.as_ref(), 100, TitleStatus::Ongoing);
        seed_item(engine.catalog.as_ref(), 1396, TitleStatus::Ongoing);

        let running = AtomicBool::new(true);
        let stats = RefreshWorker::run_cycle(&engine, &running).await;

        assert_eq!(stats.checked, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.changed, 0);
    }

    #[tokio::test]
    async fn test_cycle_respects_batch_limit() {
        let provider = Arc::new(MockMetadataProvider::new());
        provider.add_detail(fixtures::tv_detail(100, "First", 0, 0)).await;
        provider.add_detail(fixtures::tv_detail(200, "Second", 0, 0)).await;

        let mut config = fast_config();
        config.refresh.batch_limit = 1;

        let engine = make_engine(provider, config);
        seed_item(engine.catalog.as_ref(), 100, TitleStatus::Ongoing);
        seed_item(engine.catalog.as_ref(), 200, TitleStatus::Ongoing);

        let running = AtomicBool::new(true);
        let stats = RefreshWorker::run_cycle(&engine, &running).await;

        assert_eq!(stats.checked, 1);
    }

    #[tokio::test]
    async fn test_cleared_flag_stops_before_first_item() {
        let provider = Arc::new(MockMetadataProvider::new());
        provider.add_detail(fixtures::tv_detail(1396, "Signal", 0, 0)).await;

        let engine = make_engine(provider.clone(), fast_config());
        seed_item(engine.catalog.as_ref(), 1396, TitleStatus::Ongoing);

        let running = AtomicBool::new(false);
        let stats = RefreshWorker::run_cycle(&engine, &running).await;

        assert_eq!(stats.checked, 0);
        assert_eq!(provider.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let provider = Arc::new(MockMetadataProvider::new());
        let engine = Arc::new(make_engine(provider, fast_config()));
        let worker = RefreshWorker::new(engine);

        assert!(!worker.is_running());

        worker.start().await;
        assert!(worker.is_running());

        // Second start is a no-op
        worker.start().await;
        assert!(worker.is_running());

        worker.stop().await;
        assert!(!worker.is_running());

        // Second stop is a no-op
        worker.stop().await;
        assert!(!worker.is_running());
    }
}
