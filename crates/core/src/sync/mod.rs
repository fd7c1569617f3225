//! Metadata sync: the write path of the catalog.
//!
//! Everything that mutates tracked titles funnels through the [`SyncEngine`]:
//! - **Single add / resync / remove**: fetch, merge, persist one title.
//! - **Bulk import**: walk provider discovery pages through the same engine.
//! - **Background refresh**: periodically resync non-final titles.

mod bulk;
mod config;
mod engine;
mod enrich;
mod episodes;
mod refresh;
mod types;

pub use bulk::BulkImporter;
pub use config::{ExistingPolicy, RefreshConfig, SyncConfig};
pub use engine::SyncEngine;
pub use enrich::{enrich_title, EnrichedTitle, EnrichmentFailure};
pub use episodes::{sync_episodes, EpisodeSyncReport};
pub use refresh::RefreshWorker;
pub use types::{BatchSummary, DiscoveryFilter, SyncError, SyncPhase, TitleOverrides};
