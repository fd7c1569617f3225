//! Mock metadata provider for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::catalog::{Keyword, MediaType};
use crate::provider::{
    AlternativeTitle, DiscoverPage, DiscoverQuery, MetadataProvider, ProviderError, SeasonDetail,
    TitleDetail, TitleImages, Translation,
};

/// Scripted implementation of the MetadataProvider trait.
///
/// Data is keyed by `(media_type, external_id)`; unset facets come back
/// empty so a test only has to script what it asserts on. Every call is
/// appended to a log for call-order assertions, and `set_next_error`
/// injects a one-shot failure per endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use hallyu_core::testing::{fixtures, MockMetadataProvider};
///
/// let provider = MockMetadataProvider::new();
/// provider.add_detail(fixtures::tv_detail(1396, "Signal", 1, 16)).await;
/// provider.add_season(1396, fixtures::season(1, 16)).await;
///
/// let detail = provider.fetch_detail(MediaType::Tv, 1396).await?;
/// assert_eq!(provider.call_log().await, vec!["detail:tv:1396"]);
/// ```
pub struct MockMetadataProvider {
    details: Arc<RwLock<HashMap<(MediaType, i64), TitleDetail>>>,
    images: Arc<RwLock<HashMap<(MediaType, i64), TitleImages>>>,
    translations: Arc<RwLock<HashMap<(MediaType, i64), Vec<Translation>>>>,
    alternative_titles: Arc<RwLock<HashMap<(MediaType, i64), Vec<AlternativeTitle>>>>,
    keywords: Arc<RwLock<HashMap<(MediaType, i64), Vec<Keyword>>>>,
    /// Keyed by (tv external_id, season_number).
    seasons: Arc<RwLock<HashMap<(i64, i64), SeasonDetail>>>,
    /// Keyed by (media_type, page).
    discover_pages: Arc<RwLock<HashMap<(MediaType, i64), DiscoverPage>>>,
    /// One-shot error per endpoint name, consumed on first use.
    next_errors: Arc<RwLock<HashMap<&'static str, ProviderError>>>,
    /// "endpoint:media_type:id" entries in call order.
    calls: Arc<RwLock<Vec<String>>>,
    discover_queries: Arc<RwLock<Vec<(MediaType, DiscoverQuery)>>>,
}

impl std::fmt::Debug for MockMetadataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockMetadataProvider").finish_non_exhaustive()
    }
}

impl Default for MockMetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self {
            details: Arc::new(RwLock::new(HashMap::new())),
            images: Arc::new(RwLock::new(HashMap::new())),
            translations: Arc::new(RwLock::new(HashMap::new())),
            alternative_titles: Arc::new(RwLock::new(HashMap::new())),
            keywords: Arc::new(RwLock::new(HashMap::new())),
            seasons: Arc::new(RwLock::new(HashMap::new())),
            discover_pages: Arc::new(RwLock::new(HashMap::new())),
            next_errors: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            discover_queries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a detail record, keyed by its own media type and id.
    pub async fn add_detail(&self, detail: TitleDetail) {
        let key = (detail.media_type, detail.external_id);
        self.details.write().await.insert(key, detail);
    }

    pub async fn add_images(&self, media_type: MediaType, external_id: i64, images: TitleImages) {
        self.images
            .write()
            .await
            .insert((media_type, external_id), images);
    }

    pub async fn add_translations(
        &self,
        media_type: MediaType,
        external_id: i64,
        translations: Vec<Translation>,
    ) {
        self.translations
            .write()
            .await
            .insert((media_type, external_id), translations);
    }

    pub async fn add_alternative_titles(
        &self,
        media_type: MediaType,
        external_id: i64,
        titles: Vec<AlternativeTitle>,
    ) {
        self.alternative_titles
            .write()
            .await
            .insert((media_type, external_id), titles);
    }

    pub async fn add_keywords(
        &self,
        media_type: MediaType,
        external_id: i64,
        keywords: Vec<Keyword>,
    ) {
        self.keywords
            .write()
            .await
            .insert((media_type, external_id), keywords);
    }

    pub async fn add_season(&self, external_id: i64, season: SeasonDetail) {
        self.seasons
            .write()
            .await
            .insert((external_id, season.season_number), season);
    }

    pub async fn add_discover_page(&self, media_type: MediaType, page: DiscoverPage) {
        self.discover_pages
            .write()
            .await
            .insert((media_type, page.page), page);
    }

    /// Make the next call to `endpoint` fail with `error`. Consumed on
    /// first use. Endpoint names: `detail`, `images`, `translations`,
    /// `alternative_titles`, `keywords`, `season`, `discover`.
    pub async fn set_next_error(&self, endpoint: &'static str, error: ProviderError) {
        self.next_errors.write().await.insert(endpoint, error);
    }

    /// Every call made so far, as "endpoint:media_type:id" strings.
    pub async fn call_log(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Discover queries in call order, for filter-mapping assertions.
    pub async fn recorded_discover_queries(&self) -> Vec<(MediaType, DiscoverQuery)> {
        self.discover_queries.read().await.clone()
    }

    async fn record(&self, entry: String) {
        self.calls.write().await.push(entry);
    }

    async fn take_error(&self, endpoint: &'static str) -> Option<ProviderError> {
        self.next_errors.write().await.remove(endpoint)
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    async fn fetch_detail(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<TitleDetail, ProviderError> {
        self.record(format!("detail:{}:{}", media_type, external_id))
            .await;
        if let Some(err) = self.take_error("detail").await {
            return Err(err);
        }
        self.details
            .read()
            .await
            .get(&(media_type, external_id))
            .cloned()
            .ok_or_else(|| {
                ProviderError::NotFound(format!("{} {}", media_type, external_id))
            })
    }

    async fn fetch_images(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<TitleImages, ProviderError> {
        self.record(format!("images:{}:{}", media_type, external_id))
            .await;
        if let Some(err) = self.take_error("images").await {
            return Err(err);
        }
        Ok(self
            .images
            .read()
            .await
            .get(&(media_type, external_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_translations(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<Vec<Translation>, ProviderError> {
        self.record(format!("translations:{}:{}", media_type, external_id))
            .await;
        if let Some(err) = self.take_error("translations").await {
            return Err(err);
        }
        Ok(self
            .translations
            .read()
            .await
            .get(&(media_type, external_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_alternative_titles(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<Vec<AlternativeTitle>, ProviderError> {
        self.record(format!(
            "alternative_titles:{}:{}",
            media_type, external_id
        ))
        .await;
        if let Some(err) = self.take_error("alternative_titles").await {
            return Err(err);
        }
        Ok(self
            .alternative_titles
            .read()
            .await
            .get(&(media_type, external_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_keywords(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<Vec<Keyword>, ProviderError> {
        self.record(format!("keywords:{}:{}", media_type, external_id))
            .await;
        if let Some(err) = self.take_error("keywords").await {
            return Err(err);
        }
        Ok(self
            .keywords
            .read()
            .await
            .get(&(media_type, external_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_season(
        &self,
        external_id: i64,
        season_number: i64,
    ) -> Result<SeasonDetail, ProviderError> {
        self.record(format!("season:{}:{}", external_id, season_number))
            .await;
        if let Some(err) = self.take_error("season").await {
            return Err(err);
        }
        self.seasons
            .read()
            .await
            .get(&(external_id, season_number))
            .cloned()
            .ok_or_else(|| {
                ProviderError::NotFound(format!("season {} of {}", season_number, external_id))
            })
    }

    async fn discover(
        &self,
        media_type: MediaType,
        query: &DiscoverQuery,
    ) -> Result<DiscoverPage, ProviderError> {
        self.record(format!("discover:{}:{}", media_type, query.page))
            .await;
        self.discover_queries
            .write()
            .await
            .push((media_type, query.clone()));
        if let Some(err) = self.take_error("discover").await {
            return Err(err);
        }
        self.discover_pages
            .read()
            .await
            .get(&(media_type, query.page))
            .cloned()
            .ok_or_else(|| {
                ProviderError::NotFound(format!("discover {} page {}", media_type, query.page))
            })
    }
}
