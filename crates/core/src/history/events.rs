use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync history event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Title lifecycle
    TitleAdded {
        /// Provider id of the title
        external_id: i64,
        /// "movie" or "tv"
        media_type: String,
        title: String,
        /// Status assigned at import time
        status: String,
        /// Who requested the add
        requested_by: String,
    },
    TitleResynced {
        external_id: i64,
        title: String,
        /// Status after the resync
        status: String,
        episodes_synced: u32,
        episode_failures: u32,
    },
    TitleRemoved {
        external_id: i64,
        title: String,
        removed_by: String,
    },

    // Episode sync
    EpisodesSynced {
        external_id: i64,
        seasons_walked: u32,
        episodes_synced: u32,
        /// Episodes that failed to persist; the walk continues past them
        failures: u32,
    },

    /// The stored status changed, either on resync or on the post-sync
    /// recompute.
    StatusChanged {
        external_id: i64,
        title: String,
        from_status: String,
        to_status: String,
    },

    // Bulk import
    BulkImportStarted {
        /// Identifies one bulk run across its events
        run_id: String,
        media_type: String,
        quota: u32,
        max_pages: u32,
        requested_by: String,
    },
    BulkImportCompleted {
        run_id: String,
        pages_walked: u32,
        imported: u32,
        updated: u32,
        skipped_existing: u32,
        filtered_out: u32,
        errors: u32,
        duration_ms: u64,
    },

    // Background refresh
    RefreshCycleCompleted {
        titles_checked: u32,
        titles_changed: u32,
        errors: u32,
        duration_ms: u64,
    },
}

impl SyncEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TitleAdded { .. } => "title_added",
            Self::TitleResynced { .. } => "title_resynced",
            Self::TitleRemoved { .. } => "title_removed",
            Self::EpisodesSynced { .. } => "episodes_synced",
            Self::StatusChanged { .. } => "status_changed",
            Self::BulkImportStarted { .. } => "bulk_import_started",
            Self::BulkImportCompleted { .. } => "bulk_import_completed",
            Self::RefreshCycleCompleted { .. } => "refresh_cycle_completed",
        }
    }

    /// Extract the provider id if this event concerns a single title
    pub fn external_id(&self) -> Option<i64> {
        match self {
            Self::TitleAdded { external_id, .. }
            | Self::TitleResynced { external_id, .. }
            | Self::TitleRemoved { external_id, .. }
            | Self::EpisodesSynced { external_id, .. }
            | Self::StatusChanged { external_id, .. } => Some(*external_id),
            _ => None,
        }
    }

    /// Extract the user behind this event, if it was user-triggered
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::TitleAdded { requested_by, .. }
            | Self::BulkImportStarted { requested_by, .. } => Some(requested_by),
            Self::TitleRemoved { removed_by, .. } => Some(removed_by),
            _ => None,
        }
    }
}

/// A stored history record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub external_id: Option<i64>,
    pub user_id: Option<String>,
    pub data: SyncEvent,
}
