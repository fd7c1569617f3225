//! Shared types for the sync engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogError, MediaType};
use crate::provider::ProviderError;
use crate::status::TitleStatus;

/// Errors surfaced by single-title sync operations.
///
/// Batch operations (bulk import, refresh cycles) never propagate these;
/// they tally per-item failures and return a summary.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Input rejected before any network or store I/O.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Single add of a title that is already tracked. The store is
    /// untouched when this is returned.
    #[error("title {external_id} is already tracked")]
    Conflict { external_id: i64 },

    /// Detail or images fetch failed. These two are load-bearing; the
    /// item is aborted.
    #[error("{stage} fetch failed: {source}")]
    FatalFetch {
        stage: &'static str,
        source: ProviderError,
    },

    /// The referenced catalog row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Store failure; aborts the current item.
    #[error("store error: {0}")]
    Persistence(CatalogError),
}

impl From<CatalogError> for SyncError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(what) => Self::NotFound(what),
            other => Self::Persistence(other),
        }
    }
}

/// Where a single title sits in its sync run. Used for log and metric
/// labels; `Failed` is entered only from `FetchingDetail`, later-stage
/// errors keep their own kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Pending,
    FetchingDetail,
    Enriching,
    Merging,
    Persisted,
    EpisodeSyncing,
    Done,
    Failed,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::FetchingDetail => "fetching_detail",
            Self::Enriching => "enriching",
            Self::Merging => "merging",
            Self::Persisted => "persisted",
            Self::EpisodeSyncing => "episode_syncing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Caller-supplied field values that beat provider data during merge.
///
/// Empty or whitespace-only strings count as absent; call
/// [`TitleOverrides::normalized`] once at the operation boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Beats the classifier outright when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TitleStatus>,
}

impl TitleOverrides {
    /// Drop empty-string overrides so the merge only sees usable values.
    pub fn normalized(mut self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        }
        self.title = clean(self.title);
        self.native_title = clean(self.native_title);
        self.overview = clean(self.overview);
        self.synopsis = clean(self.synopsis);
        self.category = clean(self.category);
        self
    }
}

/// Tally returned by bulk operations. Per-item failures land in `errors`
/// instead of aborting the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub imported: u32,
    pub updated: u32,
    pub errors: u32,
}

/// What to ask the provider's discover endpoint for.
///
/// Origin fields default to the configured sync origin when absent, so a
/// bare filter discovers titles from the configured country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryFilter {
    pub media_type: MediaType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_genre_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

impl DiscoveryFilter {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            with_genre_id: None,
            origin_language: None,
            origin_country: None,
            sort_by: None,
        }
    }

    pub fn with_genre(mut self, genre_id: i64) -> Self {
        self.with_genre_id = Some(genre_id);
        self
    }
}
