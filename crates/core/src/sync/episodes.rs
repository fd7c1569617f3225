//! Season-by-season episode sync for shows.

use tracing::warn;

use crate::catalog::{Episode, MediaCatalog, MediaItem, MediaType};
use crate::metrics::EPISODES_UPSERTED;
use crate::provider::{EpisodeDetail, MetadataProvider, TitleDetail};
use crate::status::{classify_now, TitleStatus};

/// What one episode walk accomplished. Failures are tallies, not errors;
/// the walk always runs to the end of the declared seasons.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeSyncReport {
    pub seasons_walked: u32,
    pub episodes_synced: u32,
    pub failures: u32,
    pub status_before: TitleStatus,
    pub status_after: TitleStatus,
}

impl EpisodeSyncReport {
    pub fn status_changed(&self) -> bool {
        self.status_before != self.status_after
    }
}

/// Walk seasons `1..=N` as declared by the detail record, upserting every
/// episode.
///
/// A failed season fetch skips that season; a failed episode upsert
/// skips that episode. Both are tallied and the walk continues. Episodes
/// without a provider number get the next free running number; the
/// counter also advances past provider-numbered episodes so the two
/// schemes never hand out the same number in one run.
///
/// After the walk the status is recomputed from fresh inputs and the
/// synced episode count, and persisted only when it differs from the
/// stored value. `status_override` pins the status and disables the
/// recompute.
pub async fn sync_episodes(
    catalog: &dyn MediaCatalog,
    provider: &dyn MetadataProvider,
    item: &MediaItem,
    detail: &TitleDetail,
    status_override: Option<TitleStatus>,
) -> EpisodeSyncReport {
    let mut seasons_walked = 0u32;
    let mut episodes_synced = 0u32;
    let mut failures = 0u32;
    let mut next_number: i64 = 1;

    for season_number in 1..=detail.number_of_seasons {
        let season = match provider.fetch_season(item.external_id, season_number).await {
            Ok(season) => season,
            Err(e) => {
                warn!(
                    external_id = item.external_id,
                    season = season_number,
                    error = %e,
                    "Season fetch failed, skipping"
                );
                failures += 1;
                continue;
            }
        };
        seasons_walked += 1;

        for episode in &season.episodes {
            let number = episode.episode_number.unwrap_or(next_number);
            if number >= next_number {
                next_number = number + 1;
            }

            let row = build_episode(item.internal_id, number, episode);
            match catalog.upsert_episode(&row) {
                Ok(()) => {
                    episodes_synced += 1;
                    EPISODES_UPSERTED.inc();
                }
                Err(e) => {
                    warn!(
                        external_id = item.external_id,
                        season = season_number,
                        episode = number,
                        error = %e,
                        "Episode upsert failed, skipping"
                    );
                    failures += 1;
                }
            }
        }
    }

    let stored_count = match catalog.count_episodes(item.internal_id) {
        Ok(count) => count,
        Err(e) => {
            warn!(
                external_id = item.external_id,
                error = %e,
                "Episode count failed, recomputing from this run's tally"
            );
            i64::from(episodes_synced)
        }
    };

    let status_after = match status_override {
        Some(pinned) => pinned,
        None => {
            let classified =
                classify_now(Some(MediaType::Tv), &detail.status_text, detail.release_date);
            recompute_status(classified, stored_count)
        }
    };

    if status_after != item.status {
        if let Err(e) = catalog.update_status(item.internal_id, status_after) {
            warn!(
                external_id = item.external_id,
                error = %e,
                "Status update failed"
            );
            failures += 1;
        }
    }

    EpisodeSyncReport {
        seasons_walked,
        episodes_synced,
        failures,
        status_before: item.status,
        status_after,
    }
}

fn build_episode(media_id: i64, number: i64, detail: &EpisodeDetail) -> Episode {
    Episode {
        media_id,
        episode_number: number,
        season_number: detail.season_number,
        title: detail.title.clone(),
        still: detail.still_path.clone(),
        duration: detail.runtime,
        air_date: detail.air_date,
        external_episode_id: detail.external_id,
        overview: detail.overview.clone(),
        vote_average: detail.vote_average,
        vote_count: detail.vote_count,
    }
}

/// Post-walk status table keyed by (classifier verdict, synced episode
/// count). Every current row keeps the verdict; rows exist so the
/// episode-count dimension is part of the contract, not an accident.
fn recompute_status(classified: TitleStatus, episode_count: i64) -> TitleStatus {
    match (classified, episode_count) {
        (TitleStatus::Complete, n) if n > 0 => TitleStatus::Complete,
        (TitleStatus::Ongoing, n) if n > 0 => TitleStatus::Ongoing,
        (TitleStatus::Upcoming, 0) => TitleStatus::Upcoming,
        (other, _) => other,
    }
}
