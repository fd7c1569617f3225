//! Paginated bulk discovery import with dedup and content filtering.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use uuid::Uuid;

use crate::filter::ContentSignals;
use crate::history::SyncEvent;
use crate::metrics::{BULK_ITEMS, BULK_PAGES_FETCHED};
use crate::provider::{DiscoverQuery, DiscoveredTitle};

use super::config::ExistingPolicy;
use super::engine::SyncEngine;
use super::types::{BatchSummary, DiscoveryFilter, SyncError, TitleOverrides};

/// Drives discover pages through the sync engine, one row at a time.
///
/// Rows pass a fixed gauntlet: origin re-validation, the restricted
/// content predicate, then dedup against a run-wide seen set and the
/// store. Survivors run the full single-title pipeline. Per-item
/// failures are tallied, never raised.
pub struct BulkImporter {
    engine: Arc<SyncEngine>,
}

impl BulkImporter {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    /// Run one bulk import. Stops at the first of: quota reached, the
    /// provider's reported page count exhausted, `max_pages` fetched.
    pub async fn run(
        &self,
        filter: &DiscoveryFilter,
        quota: usize,
        max_pages: usize,
        requested_by: &str,
    ) -> BatchSummary {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let config = &self.engine.config;

        // Absent filter fields fall back to the configured origin.
        let origin_language = filter
            .origin_language
            .clone()
            .unwrap_or_else(|| config.origin_language.clone());
        let origin_country = filter
            .origin_country
            .clone()
            .unwrap_or_else(|| config.origin_country.clone());

        info!(
            run_id = %run_id,
            media_type = %filter.media_type,
            quota,
            max_pages,
            "Bulk import started"
        );
        if let Some(ref history) = self.engine.history {
            history
                .emit(SyncEvent::BulkImportStarted {
                    run_id: run_id.clone(),
                    media_type: filter.media_type.to_string(),
                    quota: quota as u32,
                    max_pages: max_pages as u32,
                    requested_by: requested_by.to_string(),
                })
                .await;
        }

        let mut summary = BatchSummary::default();
        let mut seen: HashSet<i64> = HashSet::new();
        let mut pages_walked = 0u32;
        let mut filtered_out = 0u32;
        let mut skipped_existing = 0u32;

        let mut page: i64 = 1;
        'pages: loop {
            if max_pages > 0 && pages_walked as usize >= max_pages {
                break;
            }

            let query = build_query(filter, page, &origin_language, &origin_country);
            let page_data = match self.engine.provider.discover(filter.media_type, &query).await {
                Ok(page_data) => page_data,
                Err(e) => {
                    warn!(
                        run_id = %run_id,
                        page,
                        error = %e,
                        "Discover page fetch failed, stopping run"
                    );
                    summary.errors += 1;
                    break;
                }
            };
            pages_walked += 1;
            BULK_PAGES_FETCHED.inc();

            for row in &page_data.results {
                if quota > 0 && (summary.imported + summary.updated) as usize >= quota {
                    break 'pages;
                }

                // Discover rows carry no media type of their own; every
                // row is taken as the requested type.
                if !matches_origin(
                    row,
                    filter.with_genre_id,
                    &origin_language,
                    &origin_country,
                ) {
                    filtered_out += 1;
                    continue;
                }

                let signals = ContentSignals {
                    category: None,
                    genre_ids: &row.genre_ids,
                    genre_names: &[],
                    title: &row.title,
                    overview: &row.overview,
                };
                if self.engine.filter.is_restricted(&signals) {
                    filtered_out += 1;
                    continue;
                }

                if !seen.insert(row.external_id) {
                    skipped_existing += 1;
                    continue;
                }

                let engaged = self
                    .process_row(
                        row,
                        filter,
                        requested_by,
                        &run_id,
                        &mut summary,
                        &mut skipped_existing,
                    )
                    .await;

                if engaged && config.inter_item_delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(config.inter_item_delay_ms)).await;
                }
            }

            if page >= page_data.total_pages {
                break;
            }
            page += 1;
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        for (disposition, count) in [
            ("imported", summary.imported),
            ("updated", summary.updated),
            ("skipped", skipped_existing),
            ("filtered", filtered_out),
            ("error", summary.errors),
        ] {
            BULK_ITEMS
                .with_label_values(&[disposition])
                .inc_by(u64::from(count));
        }
        info!(
            run_id = %run_id,
            pages_walked,
            imported = summary.imported,
            updated = summary.updated,
            skipped_existing,
            filtered_out,
            errors = summary.errors,
            duration_ms,
            "Bulk import finished"
        );
        if let Some(ref history) = self.engine.history {
            history
                .emit(SyncEvent::BulkImportCompleted {
                    run_id,
                    pages_walked,
                    imported: summary.imported,
                    updated: summary.updated,
                    skipped_existing,
                    filtered_out,
                    errors: summary.errors,
                    duration_ms,
                })
                .await;
        }

        summary
    }

    /// Push one surviving row through the engine. Returns whether any
    /// provider traffic happened, so the caller knows when to pace.
    async fn process_row(
        &self,
        row: &DiscoveredTitle,
        filter: &DiscoveryFilter,
        requested_by: &str,
        run_id: &str,
        summary: &mut BatchSummary,
        skipped_existing: &mut u32,
    ) -> bool {
        let existing = match self.engine.catalog.get_media_by_external_id(row.external_id) {
            Ok(existing) => existing,
            Err(e) => {
                warn!(
                    run_id = %run_id,
                    external_id = row.external_id,
                    error = %e,
                    "Store lookup failed, skipping row"
                );
                summary.errors += 1;
                return false;
            }
        };

        match existing {
            Some(existing) => match self.engine.config.on_existing {
                ExistingPolicy::Skip => {
                    *skipped_existing += 1;
                    false
                }
                ExistingPolicy::Resync => {
                    match self
                        .engine
                        .resync_title(existing.internal_id, TitleOverrides::default())
                        .await
                    {
                        Ok(_) => summary.updated += 1,
                        Err(e) => {
                            warn!(
                                run_id = %run_id,
                                external_id = row.external_id,
                                error = %e,
                                "Bulk resync failed"
                            );
                            summary.errors += 1;
                        }
                    }
                    true
                }
            },
            None => {
                match self
                    .engine
                    .add_title(
                        filter.media_type,
                        row.external_id,
                        TitleOverrides::default(),
                        requested_by,
                    )
                    .await
                {
                    Ok(_) => summary.imported += 1,
                    // Bulk is permissive where single add rejects.
                    Err(SyncError::Conflict { .. }) => *skipped_existing += 1,
                    Err(e) => {
                        warn!(
                            run_id = %run_id,
                            external_id = row.external_id,
                            error = %e,
                            "Bulk import item failed"
                        );
                        summary.errors += 1;
                    }
                }
                true
            }
        }
    }
}

fn build_query(
    filter: &DiscoveryFilter,
    page: i64,
    origin_language: &str,
    origin_country: &str,
) -> DiscoverQuery {
    DiscoverQuery {
        page,
        with_genres: filter.with_genre_id.map(|id| id.to_string()),
        with_origin_country: Some(origin_country.to_string()),
        with_original_language: Some(origin_language.to_string()),
        sort_by: filter.sort_by.clone(),
    }
}

/// Re-validate a discover row's origin beyond what the provider-side
/// query already approximately enforced.
///
/// Accept on the required genre id, the configured language, or the
/// configured country. The script heuristic runs only when the row has
/// no origin metadata at all.
fn matches_origin(
    row: &DiscoveredTitle,
    required_genre: Option<i64>,
    origin_language: &str,
    origin_country: &str,
) -> bool {
    if let Some(genre_id) = required_genre {
        if row.genre_ids.contains(&genre_id) {
            return true;
        }
    }
    if row.original_language.as_deref() == Some(origin_language) {
        return true;
    }
    if row.origin_countries.iter().any(|c| c == origin_country) {
        return true;
    }
    if row.genre_ids.is_empty()
        && row.original_language.is_none()
        && row.origin_countries.is_empty()
    {
        return contains_hangul(&row.title);
    }
    false
}

/// Hangul syllables, jamo, and compatibility jamo.
fn contains_hangul(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            c,
            '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}'
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MediaCatalog, MediaType, SqliteCatalog};
    use crate::filter::ContentFilter;
    use crate::sync::config::SyncConfig;
    use crate::testing::{fixtures, MockMetadataProvider};

    fn importer_with(
        provider: Arc<MockMetadataProvider>,
        config: SyncConfig,
    ) -> (BulkImporter, Arc<dyn MediaCatalog>) {
        let catalog: Arc<dyn MediaCatalog> = Arc::new(SqliteCatalog::in_memory().unwrap());
        let engine = Arc::new(SyncEngine::new(
            catalog.clone(),
            provider,
            ContentFilter::default(),
            config,
        ));
        (BulkImporter::new(engine), catalog)
    }

    fn fast_config() -> SyncConfig {
        SyncConfig {
            inter_item_delay_ms: 0,
            ..Default::default()
        }
    }

    fn resync_config() -> SyncConfig {
        SyncConfig {
            inter_item_delay_ms: 0,
            on_existing: ExistingPolicy::Resync,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_imports_new_titles() {
        let provider = Arc::new(MockMetadataProvider::new());
        provider
            .add_discover_page(
                MediaType::Tv,
                fixtures::discover_page(
                    1,
                    1,
                    vec![
                        fixtures::discovered_tv(100, "Signal"),
                        fixtures::discovered_tv(200, "Stranger"),
                    ],
                ),
            )
            .await;
        provider.add_detail(fixtures::tv_detail(100, "Signal", 1, 16)).await;
        provider.add_season(100, fixtures::season(1, 16)).await;
        provider.add_detail(fixtures::tv_detail(200, "Stranger", 1, 16)).await;
        provider.add_season(200, fixtures::season(1, 16)).await;

        let (importer, catalog) = importer_with(provider, fast_config());
        let summary = importer
            .run(&DiscoveryFilter::new(MediaType::Tv), 10, 5, "importer")
            .await;

        assert_eq!(summary.imported, 2);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.errors, 0);

        let signal = catalog.get_media_by_external_id(100).unwrap().unwrap();
        assert_eq!(catalog.count_episodes(signal.internal_id).unwrap(), 16);
        assert!(catalog.get_media_by_external_id(200).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dedup_within_and_across_pages() {
        let provider = Arc::new(MockMetadataProvider::new());
        provider
            .add_discover_page(
                MediaType::Movie,
                fixtures::discover_page(
                    1,
                    2,
                    vec![
                        fixtures::discovered_movie(300, "Burning"),
                        fixtures::discovered_movie(300, "Burning"),
                    ],
                ),
            )
            .await;
        provider
            .add_discover_page(
                MediaType::Movie,
                fixtures::discover_page(
                    2,
                    2,
                    vec![fixtures::discovered_movie(300, "Burning")],
                ),
            )
            .await;
        provider.add_detail(fixtures::movie_detail(300, "Burning")).await;

        let (importer, catalog) = importer_with(provider.clone(), fast_config());
        let summary = importer
            .run(&DiscoveryFilter::new(MediaType::Movie), 10, 5, "importer")
            .await;

        assert_eq!(summary.imported, 1);
        assert!(catalog.get_media_by_external_id(300).unwrap().is_some());
        // One detail fetch total: dedup caught the repeats.
        let detail_calls = provider
            .call_log()
            .await
            .iter()
            .filter(|c| c.starts_with("detail:"))
            .count();
        assert_eq!(detail_calls, 1);
    }

    #[tokio::test]
    async fn test_existing_titles_skipped_by_default() {
        let provider = Arc::new(MockMetadataProvider::new());
        provider
            .add_discover_page(
                MediaType::Movie,
                fixtures::discover_page(1, 1, vec![fixtures::discovered_movie(300, "Burning")]),
            )
            .await;

        let (importer, catalog) = importer_with(provider.clone(), fast_config());
        let seeded = crate::catalog::MediaItem::new(300, MediaType::Movie, "Burning");
        catalog.upsert_media(&seeded).unwrap();

        let summary = importer
            .run(&DiscoveryFilter::new(MediaType::Movie), 10, 5, "importer")
            .await;

        assert_eq!(summary.imported, 0);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.errors, 0);
        // Only the discover call; the engine never ran.
        assert_eq!(provider.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_resync_policy_updates_existing() {
        let provider = Arc::new(MockMetadataProvider::new());
        provider
            .add_discover_page(
                MediaType::Movie,
                fixtures::discover_page(1, 1, vec![fixtures::discovered_movie(300, "Burning")]),
            )
            .await;
        provider.add_detail(fixtures::movie_detail(300, "Burning")).await;

        let (importer, catalog) = importer_with(provider, resync_config());
        let seeded = crate::catalog::MediaItem::new(300, MediaType::Movie, "Old Title");
        let internal_id = catalog.upsert_media(&seeded).unwrap();

        let summary = importer
            .run(&DiscoveryFilter::new(MediaType::Movie), 10, 5, "importer")
            .await;

        assert_eq!(summary.imported, 0);
        assert_eq!(summary.updated, 1);
        let refreshed = catalog.get_media(internal_id).unwrap();
        assert_eq!(refreshed.title, "Burning");
    }

    #[tokio::test]
    async fn test_restricted_rows_dropped() {
        let provider = Arc::new(MockMetadataProvider::new());
        let mut kids = fixtures::discovered_tv(400, "Pororo");
        kids.genre_ids = vec![10762];
        provider
            .add_discover_page(
                MediaType::Tv,
                fixtures::discover_page(1, 1, vec![kids]),
            )
            .await;

        let (importer, catalog) = importer_with(provider.clone(), fast_config());
        let summary = importer
            .run(&DiscoveryFilter::new(MediaType::Tv), 10, 5, "importer")
            .await;

        assert_eq!(summary.imported, 0);
        assert!(catalog.get_media_by_external_id(400).unwrap().is_none());
        assert_eq!(provider.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_origin_revalidation() {
        let provider = Arc::new(MockMetadataProvider::new());

        // Japanese metadata: rejected outright, no heuristic.
        let mut foreign = fixtures::discovered_tv(500, "Tokyo Story");
        foreign.original_language = Some("ja".to_string());
        foreign.origin_countries = vec!["JP".to_string()];
        foreign.genre_ids = vec![16];

        // No origin metadata at all: Hangul in the title rescues it.
        let mut bare_korean = fixtures::discovered_tv(600, "\u{C2DC}\u{ADF8}\u{B110}");
        bare_korean.original_language = None;
        bare_korean.origin_countries = Vec::new();
        bare_korean.genre_ids = Vec::new();

        // No origin metadata, Latin title: rejected.
        let mut bare_latin = fixtures::discovered_tv(700, "Mystery Hour");
        bare_latin.original_language = None;
        bare_latin.origin_countries = Vec::new();
        bare_latin.genre_ids = Vec::new();

        provider
            .add_discover_page(
                MediaType::Tv,
                fixtures::discover_page(1, 1, vec![foreign, bare_korean, bare_latin]),
            )
            .await;
        provider
            .add_detail(fixtures::tv_detail(600, "\u{C2DC}\u{ADF8}\u{B110}", 1, 4))
            .await;
        provider.add_season(600, fixtures::season(1, 4)).await;

        let (importer, catalog) = importer_with(provider, fast_config());
        let summary = importer
            .run(&DiscoveryFilter::new(MediaType::Tv), 10, 5, "importer")
            .await;

        assert_eq!(summary.imported, 1);
        assert!(catalog.get_media_by_external_id(500).unwrap().is_none());
        assert!(catalog.get_media_by_external_id(600).unwrap().is_some());
        assert!(catalog.get_media_by_external_id(700).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quota_stops_run() {
        let provider = Arc::new(MockMetadataProvider::new());
        provider
            .add_discover_page(
                MediaType::Movie,
                fixtures::discover_page(
                    1,
                    2,
                    vec![
                        fixtures::discovered_movie(301, "Burning"),
                        fixtures::discovered_movie(302, "Oldboy"),
                        fixtures::discovered_movie(303, "The Wailing"),
                    ],
                ),
            )
            .await;
        provider.add_detail(fixtures::movie_detail(301, "Burning")).await;

        let (importer, _catalog) = importer_with(provider.clone(), fast_config());
        let summary = importer
            .run(&DiscoveryFilter::new(MediaType::Movie), 1, 5, "importer")
            .await;

        assert_eq!(summary.imported, 1);
        // Quota hit inside page 1; page 2 was never requested.
        let discover_calls = provider
            .call_log()
            .await
            .iter()
            .filter(|c| c.starts_with("discover:"))
            .count();
        assert_eq!(discover_calls, 1);
    }

    #[tokio::test]
    async fn test_max_pages_ceiling() {
        let provider = Arc::new(MockMetadataProvider::new());
        for page in 1..=3 {
            provider
                .add_discover_page(
                    MediaType::Movie,
                    fixtures::discover_page(page, 3, Vec::new()),
                )
                .await;
        }

        let (importer, _catalog) = importer_with(provider.clone(), fast_config());
        importer
            .run(&DiscoveryFilter::new(MediaType::Movie), 10, 2, "importer")
            .await;

        assert_eq!(provider.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_provider_page_count_respected() {
        let provider = Arc::new(MockMetadataProvider::new());
        provider
            .add_discover_page(
                MediaType::Movie,
                fixtures::discover_page(1, 1, Vec::new()),
            )
            .await;

        let (importer, _catalog) = importer_with(provider.clone(), fast_config());
        importer
            .run(&DiscoveryFilter::new(MediaType::Movie), 10, 50, "importer")
            .await;

        assert_eq!(provider.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_item_failure_does_not_abort_batch() {
        let provider = Arc::new(MockMetadataProvider::new());
        provider
            .add_discover_page(
                MediaType::Movie,
                fixtures::discover_page(
                    1,
                    1,
                    vec![
                        // No detail scripted for 301: its add fails.
                        fixtures::discovered_movie(301, "Burning"),
                        fixtures::discovered_movie(302, "Oldboy"),
                    ],
                ),
            )
            .await;
        provider.add_detail(fixtures::movie_detail(302, "Oldboy")).await;

        let (importer, catalog) = importer_with(provider, fast_config());
        let summary = importer
            .run(&DiscoveryFilter::new(MediaType::Movie), 10, 5, "importer")
            .await;

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.errors, 1);
        assert!(catalog.get_media_by_external_id(302).unwrap().is_some());
    }

    #[test]
    fn test_contains_hangul() {
        assert!(contains_hangul("\u{C2DC}\u{ADF8}\u{B110}"));
        assert!(contains_hangul("Signal \u{C2DC}\u{ADF8}\u{B110}"));
        assert!(!contains_hangul("Signal"));
        assert!(!contains_hangul(""));
        // Japanese kana is not Hangul.
        assert!(!contains_hangul("\u{30B7}\u{30B0}\u{30CA}\u{30EB}"));
    }

    #[test]
    fn test_matches_origin_precedence() {
        let row = fixtures::discovered_tv(1, "Signal");
        assert!(matches_origin(&row, Some(18), "ko", "KR"));

        let mut language_only = fixtures::discovered_tv(2, "Stranger");
        language_only.genre_ids = Vec::new();
        language_only.origin_countries = Vec::new();
        assert!(matches_origin(&language_only, None, "ko", "KR"));

        let mut country_only = fixtures::discovered_tv(3, "Kingdom");
        country_only.genre_ids = Vec::new();
        country_only.original_language = None;
        assert!(matches_origin(&country_only, None, "ko", "KR"));

        // Metadata present but all wrong: the heuristic must not run.
        let mut mismatched = fixtures::discovered_tv(4, "\u{C2DC}\u{ADF8}\u{B110}");
        mismatched.original_language = Some("ja".to_string());
        mismatched.origin_countries = vec!["JP".to_string()];
        mismatched.genre_ids = vec![16];
        assert!(!matches_origin(&mismatched, None, "ko", "KR"));
    }
}
