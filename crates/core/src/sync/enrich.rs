//! Per-title enrichment: the detail record plus its satellite facets.

use futures::future;
use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{Keyword, MediaType};
use crate::provider::{AlternativeTitle, MetadataProvider, TitleDetail, Translation};

use super::types::{SyncError, SyncPhase};

/// A degradable fetch that failed. The facet is left empty and the
/// failure travels with the result instead of only hitting the log.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentFailure {
    pub facet: &'static str,
    pub error: String,
}

/// Everything fetched for one title, ready to merge.
#[derive(Debug, Clone)]
pub struct EnrichedTitle {
    pub detail: TitleDetail,
    /// Primary poster first, then the remaining gallery entries.
    pub posters: Vec<String>,
    pub backdrop: Option<String>,
    /// Locale-preferred original-language title, when one was found.
    pub native_title: Option<String>,
    pub keywords: Vec<Keyword>,
    /// Facets that degraded this run.
    pub degraded: Vec<EnrichmentFailure>,
}

/// Fetch and assemble everything the merge needs for one title.
///
/// Detail and images are load-bearing: either failure aborts the item
/// with [`SyncError::FatalFetch`]. Translations, alternative titles, and
/// keywords run concurrently and degrade to empty on failure, each
/// recording an [`EnrichmentFailure`] on the result.
pub async fn enrich_title(
    provider: &dyn MetadataProvider,
    media_type: MediaType,
    external_id: i64,
    locale_preference: &[String],
) -> Result<EnrichedTitle, SyncError> {
    let detail = provider
        .fetch_detail(media_type, external_id)
        .await
        .map_err(|source| SyncError::FatalFetch {
            stage: "detail",
            source,
        })?;

    let images = provider
        .fetch_images(media_type, external_id)
        .await
        .map_err(|source| SyncError::FatalFetch {
            stage: "images",
            source,
        })?;

    debug!(
        external_id,
        phase = SyncPhase::Enriching.as_str(),
        "Fetching degradable facets"
    );
    let (translations, alternatives, keywords) = future::join3(
        provider.fetch_translations(media_type, external_id),
        provider.fetch_alternative_titles(media_type, external_id),
        provider.fetch_keywords(media_type, external_id),
    )
    .await;

    let mut degraded = Vec::new();

    let translations = translations.unwrap_or_else(|e| {
        warn!(
            "Translations fetch degraded for {} {}: {}",
            media_type, external_id, e
        );
        degraded.push(EnrichmentFailure {
            facet: "translations",
            error: e.to_string(),
        });
        Vec::new()
    });

    let alternatives = alternatives.unwrap_or_else(|e| {
        warn!(
            "Alternative titles fetch degraded for {} {}: {}",
            media_type, external_id, e
        );
        degraded.push(EnrichmentFailure {
            facet: "alternative_titles",
            error: e.to_string(),
        });
        Vec::new()
    });

    let keywords = keywords.unwrap_or_else(|e| {
        warn!(
            "Keywords fetch degraded for {} {}: {}",
            media_type, external_id, e
        );
        degraded.push(EnrichmentFailure {
            facet: "keywords",
            error: e.to_string(),
        });
        Vec::new()
    });

    // Alternative titles are a fallback only; a usable translation wins.
    let native_title = pick_native_title(&translations, locale_preference)
        .or_else(|| first_alternative_title(&alternatives));

    let mut posters: Vec<String> = Vec::new();
    if let Some(primary) = detail.poster_path.clone() {
        posters.push(primary);
    }
    for poster in images.posters {
        if !posters.contains(&poster) {
            posters.push(poster);
        }
    }

    let backdrop = images
        .backdrops
        .into_iter()
        .next()
        .or_else(|| detail.backdrop_path.clone());

    Ok(EnrichedTitle {
        detail,
        posters,
        backdrop,
        native_title,
        keywords,
        degraded,
    })
}

/// Walk the locale preference list; first translation in a preferred
/// language with a non-empty title wins.
fn pick_native_title(
    translations: &[Translation],
    locale_preference: &[String],
) -> Option<String> {
    for locale in locale_preference {
        let found = translations
            .iter()
            .filter(|t| t.language == *locale)
            .find_map(|t| t.title.as_deref().map(str::trim).filter(|s| !s.is_empty()));
        if let Some(title) = found {
            return Some(title.to_string());
        }
    }
    None
}

fn first_alternative_title(titles: &[AlternativeTitle]) -> Option<String> {
    titles
        .iter()
        .map(|t| t.title.trim())
        .find(|t| !t.is_empty())
        .map(String::from)
}
