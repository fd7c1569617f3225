//! Single-title sync operations: add, resync, remove.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::catalog::{MediaCatalog, MediaItem, MediaType};
use crate::filter::ContentFilter;
use crate::history::{HistoryHandle, SyncEvent};
use crate::metrics::{SYNC_ATTEMPTS, SYNC_DURATION};
use crate::provider::MetadataProvider;
use crate::status::classify_now;

use super::config::SyncConfig;
use super::enrich::{enrich_title, EnrichedTitle};
use super::episodes::sync_episodes;
use super::types::{SyncError, SyncPhase, TitleOverrides};

/// Orchestrates one title's journey from provider id to catalog row.
///
/// Holds the catalog, the provider, the restricted-content predicate and
/// the sync configuration. Bulk import and the background refresh reuse
/// the same engine rather than reimplementing the per-title steps.
pub struct SyncEngine {
    pub(super) catalog: Arc<dyn MediaCatalog>,
    pub(super) provider: Arc<dyn MetadataProvider>,
    pub(super) filter: ContentFilter,
    pub(super) config: SyncConfig,
    pub(super) history: Option<HistoryHandle>,
}

impl SyncEngine {
    pub fn new(
        catalog: Arc<dyn MediaCatalog>,
        provider: Arc<dyn MetadataProvider>,
        filter: ContentFilter,
        config: SyncConfig,
    ) -> Self {
        Self {
            catalog,
            provider,
            filter,
            config,
            history: None,
        }
    }

    /// Attach a history handle; events are emitted best-effort.
    pub fn with_history(mut self, history: HistoryHandle) -> Self {
        self.history = Some(history);
        self
    }

    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Track a new title by provider id.
    ///
    /// The duplicate check runs against the store before any provider
    /// traffic, so a conflicting add costs no network calls. For shows
    /// the season walk runs after the row is persisted.
    pub async fn add_title(
        &self,
        media_type: MediaType,
        external_id: i64,
        overrides: TitleOverrides,
        requested_by: &str,
    ) -> Result<MediaItem, SyncError> {
        let started = Instant::now();
        let result = self
            .add_title_impl(media_type, external_id, overrides, requested_by)
            .await;
        record_sync("add", started, result.is_ok());
        result
    }

    async fn add_title_impl(
        &self,
        media_type: MediaType,
        external_id: i64,
        overrides: TitleOverrides,
        requested_by: &str,
    ) -> Result<MediaItem, SyncError> {
        if external_id <= 0 {
            return Err(SyncError::Validation(
                "external id must be positive".to_string(),
            ));
        }
        debug!(
            external_id,
            phase = SyncPhase::Pending.as_str(),
            "Add accepted"
        );

        if self
            .catalog
            .get_media_by_external_id(external_id)?
            .is_some()
        {
            return Err(SyncError::Conflict { external_id });
        }

        let overrides = overrides.normalized();

        debug!(
            external_id,
            phase = SyncPhase::FetchingDetail.as_str(),
            "Fetching provider metadata"
        );
        let enriched = match enrich_title(
            self.provider.as_ref(),
            media_type,
            external_id,
            &self.config.locale_preference,
        )
        .await
        {
            Ok(enriched) => enriched,
            Err(e) => {
                debug!(
                    external_id,
                    phase = SyncPhase::Failed.as_str(),
                    "Provider fetch failed"
                );
                return Err(e);
            }
        };

        debug!(
            external_id,
            phase = SyncPhase::Merging.as_str(),
            "Merging provider data"
        );
        let mut item = build_item(
            media_type,
            external_id,
            &enriched,
            &overrides,
            &self.filter,
            None,
        );

        let internal_id = self.catalog.upsert_media(&item)?;
        item.internal_id = internal_id;
        self.catalog.replace_genres(internal_id, &item.genres)?;
        debug!(
            external_id,
            internal_id,
            phase = SyncPhase::Persisted.as_str(),
            "Title persisted"
        );

        if media_type == MediaType::Tv {
            debug!(
                external_id,
                phase = SyncPhase::EpisodeSyncing.as_str(),
                "Walking seasons"
            );
            let report = sync_episodes(
                self.catalog.as_ref(),
                self.provider.as_ref(),
                &item,
                &enriched.detail,
                overrides.status,
            )
            .await;
            if let Some(ref history) = self.history {
                history
                    .emit(SyncEvent::EpisodesSynced {
                        external_id,
                        seasons_walked: report.seasons_walked,
                        episodes_synced: report.episodes_synced,
                        failures: report.failures,
                    })
                    .await;
            }
        }

        // Re-read so the caller sees what the recompute persisted.
        let item = self.catalog.get_media(internal_id)?;

        if let Some(ref history) = self.history {
            history
                .emit(SyncEvent::TitleAdded {
                    external_id,
                    media_type: media_type.to_string(),
                    title: item.title.clone(),
                    status: item.status.to_string(),
                    requested_by: requested_by.to_string(),
                })
                .await;
        }

        info!(
            "Added {} \"{}\" with status {}",
            media_type, item.title, item.status
        );
        debug!(
            external_id,
            phase = SyncPhase::Done.as_str(),
            "Add complete"
        );
        Ok(item)
    }

    /// Re-fetch provider metadata for a tracked title and re-merge it
    /// over the stored row.
    ///
    /// The stored row acts as the fallback layer of the merge, so a
    /// degraded facet never wipes data a previous sync fetched.
    pub async fn resync_title(
        &self,
        internal_id: i64,
        overrides: TitleOverrides,
    ) -> Result<MediaItem, SyncError> {
        let started = Instant::now();
        let result = self.resync_title_impl(internal_id, overrides).await;
        record_sync("resync", started, result.is_ok());
        result
    }

    async fn resync_title_impl(
        &self,
        internal_id: i64,
        overrides: TitleOverrides,
    ) -> Result<MediaItem, SyncError> {
        let existing = self.catalog.get_media(internal_id)?;
        let external_id = existing.external_id;
        let media_type = existing.media_type;
        let overrides = overrides.normalized();

        debug!(
            external_id,
            internal_id,
            phase = SyncPhase::FetchingDetail.as_str(),
            "Resyncing title"
        );
        let enriched = match enrich_title(
            self.provider.as_ref(),
            media_type,
            external_id,
            &self.config.locale_preference,
        )
        .await
        {
            Ok(enriched) => enriched,
            Err(e) => {
                debug!(
                    external_id,
                    phase = SyncPhase::Failed.as_str(),
                    "Provider fetch failed"
                );
                return Err(e);
            }
        };

        debug!(
            external_id,
            phase = SyncPhase::Merging.as_str(),
            "Merging provider data"
        );
        let mut item = build_item(
            media_type,
            external_id,
            &enriched,
            &overrides,
            &self.filter,
            Some(&existing),
        );
        item.internal_id = internal_id;

        self.catalog.upsert_media(&item)?;
        self.catalog.replace_genres(internal_id, &item.genres)?;
        debug!(
            external_id,
            internal_id,
            phase = SyncPhase::Persisted.as_str(),
            "Title persisted"
        );

        let mut episodes_synced = 0u32;
        let mut episode_failures = 0u32;
        if media_type == MediaType::Tv {
            debug!(
                external_id,
                phase = SyncPhase::EpisodeSyncing.as_str(),
                "Walking seasons"
            );
            let report = sync_episodes(
                self.catalog.as_ref(),
                self.provider.as_ref(),
                &item,
                &enriched.detail,
                overrides.status,
            )
            .await;
            episodes_synced = report.episodes_synced;
            episode_failures = report.failures;
        }

        let item = self.catalog.get_media(internal_id)?;

        if item.status != existing.status {
            if let Some(ref history) = self.history {
                history
                    .emit(SyncEvent::StatusChanged {
                        external_id,
                        title: item.title.clone(),
                        from_status: existing.status.to_string(),
                        to_status: item.status.to_string(),
                    })
                    .await;
            }
        }
        if let Some(ref history) = self.history {
            history
                .emit(SyncEvent::TitleResynced {
                    external_id,
                    title: item.title.clone(),
                    status: item.status.to_string(),
                    episodes_synced,
                    episode_failures,
                })
                .await;
        }

        info!("Resynced {} \"{}\"", media_type, item.title);
        debug!(
            external_id,
            phase = SyncPhase::Done.as_str(),
            "Resync complete"
        );
        Ok(item)
    }

    /// Delete a tracked title. Episode rows and genre links cascade in
    /// the store.
    pub async fn remove_title(
        &self,
        internal_id: i64,
        removed_by: &str,
    ) -> Result<(), SyncError> {
        let started = Instant::now();
        let result = self.remove_title_impl(internal_id, removed_by).await;
        record_sync("remove", started, result.is_ok());
        result
    }

    async fn remove_title_impl(
        &self,
        internal_id: i64,
        removed_by: &str,
    ) -> Result<(), SyncError> {
        let existing = self.catalog.get_media(internal_id)?;
        self.catalog.delete_media(internal_id)?;

        if let Some(ref history) = self.history {
            history
                .emit(SyncEvent::TitleRemoved {
                    external_id: existing.external_id,
                    title: existing.title.clone(),
                    removed_by: removed_by.to_string(),
                })
                .await;
        }

        info!(
            "Removed {} \"{}\"",
            existing.media_type, existing.title
        );
        Ok(())
    }
}

fn record_sync(operation: &str, started: Instant, ok: bool) {
    let outcome = if ok { "success" } else { "error" };
    SYNC_ATTEMPTS.with_label_values(&[operation, outcome]).inc();
    SYNC_DURATION
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());
}

/// Merge one title. Precedence per field: caller override, then fresh
/// provider data, then the stored row (resync) or type defaults (add).
///
/// Genres are always replaced from the fresh detail record, minus any
/// the restricted-genre predicate rejects. A facet that degraded this
/// run falls back instead of overwriting with nothing.
fn build_item(
    media_type: MediaType,
    external_id: i64,
    enriched: &EnrichedTitle,
    overrides: &TitleOverrides,
    filter: &ContentFilter,
    existing: Option<&MediaItem>,
) -> MediaItem {
    let detail = &enriched.detail;
    let mut item = match existing {
        Some(existing) => existing.clone(),
        None => MediaItem::new(external_id, media_type, detail.title.clone()),
    };

    if let Some(title) = overrides.title.clone() {
        item.title = title;
    } else if !detail.title.is_empty() {
        item.title = detail.title.clone();
    }

    if let Some(native) = overrides
        .native_title
        .clone()
        .or_else(|| enriched.native_title.clone())
    {
        item.native_title = Some(native);
    }

    if let Some(overview) = overrides.overview.clone() {
        item.overview = overview;
    } else if !detail.overview.is_empty() {
        item.overview = detail.overview.clone();
    }

    if let Some(synopsis) = overrides.synopsis.clone().or_else(|| {
        detail
            .tagline
            .clone()
            .filter(|t| !t.trim().is_empty())
    }) {
        item.synopsis = Some(synopsis);
    }

    // The provider knows nothing about curation labels; an existing
    // category survives unless the caller replaces it.
    if let Some(category) = overrides.category.clone() {
        item.category = Some(category);
    }

    if !enriched.posters.is_empty() {
        item.posters = enriched.posters.clone();
    }
    if let Some(backdrop) = enriched.backdrop.clone() {
        item.backdrop = Some(backdrop);
    }
    if detail.release_date.is_some() {
        item.release_date = detail.release_date;
    }

    item.vote_average = detail.vote_average;
    item.vote_count = detail.vote_count;
    item.episode_count = detail.episode_count;

    item.status = overrides.status.unwrap_or_else(|| {
        classify_now(Some(media_type), &detail.status_text, detail.release_date)
    });

    item.genres = detail
        .genres
        .iter()
        .filter(|g| !filter.is_restricted_genre(g))
        .cloned()
        .collect();

    if !facet_degraded(enriched, "keywords") {
        item.keywords = enriched.keywords.clone();
    }

    item.updated_at = Utc::now();
    item
}

fn facet_degraded(enriched: &EnrichedTitle, facet: &str) -> bool {
    enriched.degraded.iter().any(|f| f.facet == facet)
}
