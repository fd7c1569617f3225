//! Sync engine configuration.

use serde::{Deserialize, Serialize};

/// What a bulk run does when it discovers a title that is already tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingPolicy {
    /// Leave the stored row alone; the item counts toward nothing.
    #[default]
    Skip,
    /// Re-run the full merge; the item counts as updated.
    Resync,
}

/// Configuration for sync operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Pause between engine calls in bulk and refresh runs (milliseconds).
    /// Keeps sequential imports polite toward the provider.
    #[serde(default = "default_inter_item_delay_ms")]
    pub inter_item_delay_ms: u64,

    /// Bulk-run behavior for already-tracked titles.
    #[serde(default)]
    pub on_existing: ExistingPolicy,

    /// Languages tried in order when picking the native title from
    /// provider translations.
    #[serde(default = "default_locale_preference")]
    pub locale_preference: Vec<String>,

    /// Original language accepted during bulk origin re-validation.
    #[serde(default = "default_origin_language")]
    pub origin_language: String,

    /// Origin country accepted during bulk origin re-validation.
    #[serde(default = "default_origin_country")]
    pub origin_country: String,

    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Configuration for the background refresh worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// When disabled, titles are only refreshed via the resync API.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between refresh cycles.
    #[serde(default = "default_refresh_interval_secs")]
    pub interval_secs: u64,

    /// Max titles resynced per cycle.
    #[serde(default = "default_refresh_batch_limit")]
    pub batch_limit: usize,
}

fn default_inter_item_delay_ms() -> u64 {
    250
}

fn default_locale_preference() -> Vec<String> {
    vec!["ko".to_string(), "en".to_string()]
}

fn default_origin_language() -> String {
    "ko".to_string()
}

fn default_origin_country() -> String {
    "KR".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    21600 // 6 hours
}

fn default_refresh_batch_limit() -> usize {
    25
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            inter_item_delay_ms: default_inter_item_delay_ms(),
            on_existing: ExistingPolicy::Skip,
            locale_preference: default_locale_preference(),
            origin_language: default_origin_language(),
            origin_country: default_origin_country(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_refresh_interval_secs(),
            batch_limit: default_refresh_batch_limit(),
        }
    }
}
