//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second), so requests
//! are not throttled here; batch callers pace themselves.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{
    AlternativeTitle, DiscoverPage, DiscoverQuery, DiscoveredTitle, EpisodeDetail, SeasonDetail,
    TitleDetail, TitleImages, Translation,
};
use super::{MetadataProvider, ProviderError};
use crate::catalog::{Genre, Keyword, MediaType};
use crate::metrics::PROVIDER_REQUESTS;
use async_trait::async_trait;

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    /// Can use ${ENV_VAR} syntax to read from environment.
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters/backdrops/stills.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            image_base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// TMDB-backed metadata provider.
pub struct TmdbProvider {
    client: Client,
    base_url: String,
    api_key: String,
    image_base_url: String,
}

impl TmdbProvider {
    /// Create a new TMDB provider.
    pub fn new(config: TmdbConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        let image_base_url = config
            .image_base_url
            .unwrap_or_else(|| "https://image.tmdb.org/t/p".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            image_base_url,
        })
    }

    /// Expand a provider image path ("/abc.jpg") to a full URL. All image
    /// references leaving this module are full URLs.
    fn image_url(&self, path: &str) -> String {
        format!("{}/original{}", self.image_base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> Result<T, ProviderError> {
        let result = self.request(url, params, context).await;
        let outcome = if result.is_ok() { "success" } else { "error" };
        PROVIDER_REQUESTS
            .with_label_values(&[endpoint, outcome])
            .inc();
        result
    }

    async fn request<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(ProviderError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 404 {
            return Err(ProviderError::NotFound(context.to_string()));
        }
        if status == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            ProviderError::ParseError(format!("failed to parse {context} response: {e}"))
        })
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_detail(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<TitleDetail, ProviderError> {
        let url = format!("{}/{}/{}", self.base_url, media_type.as_str(), external_id);

        debug!("TMDB detail: type={}, id={}", media_type, external_id);

        let context = format!("{media_type} {external_id}");
        let mut detail: TitleDetail = match media_type {
            MediaType::Movie => {
                let details: TmdbMovieDetails =
                    self.get_json("detail", &url, &[], &context).await?;
                details.into()
            }
            MediaType::Tv => {
                let details: TmdbTvDetails = self.get_json("detail", &url, &[], &context).await?;
                details.into()
            }
        };

        detail.poster_path = detail.poster_path.map(|p| self.image_url(&p));
        detail.backdrop_path = detail.backdrop_path.map(|p| self.image_url(&p));
        Ok(detail)
    }

    async fn fetch_images(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<TitleImages, ProviderError> {
        let url = format!(
            "{}/{}/{}/images",
            self.base_url,
            media_type.as_str(),
            external_id
        );

        debug!("TMDB images: type={}, id={}", media_type, external_id);

        let context = format!("images for {media_type} {external_id}");
        let response: TmdbImagesResponse = self.get_json("images", &url, &[], &context).await?;

        Ok(TitleImages {
            posters: response
                .posters
                .into_iter()
                .map(|i| self.image_url(&i.file_path))
                .collect(),
            backdrops: response
                .backdrops
                .into_iter()
                .map(|i| self.image_url(&i.file_path))
                .collect(),
        })
    }

    async fn fetch_translations(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<Vec<Translation>, ProviderError> {
        let url = format!(
            "{}/{}/{}/translations",
            self.base_url,
            media_type.as_str(),
            external_id
        );

        debug!("TMDB translations: type={}, id={}", media_type, external_id);

        let context = format!("translations for {media_type} {external_id}");
        let response: TmdbTranslationsResponse =
            self.get_json("translations", &url, &[], &context).await?;

        Ok(response.translations.into_iter().map(Into::into).collect())
    }

    async fn fetch_alternative_titles(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<Vec<AlternativeTitle>, ProviderError> {
        let url = format!(
            "{}/{}/{}/alternative_titles",
            self.base_url,
            media_type.as_str(),
            external_id
        );

        debug!(
            "TMDB alternative titles: type={}, id={}",
            media_type, external_id
        );

        // Movies wrap the list in "titles", shows in "results".
        let context = format!("alternative titles for {media_type} {external_id}");
        let titles = match media_type {
            MediaType::Movie => {
                let response: TmdbMovieAltTitles = self
                    .get_json("alternative_titles", &url, &[], &context)
                    .await?;
                response.titles
            }
            MediaType::Tv => {
                let response: TmdbTvAltTitles = self
                    .get_json("alternative_titles", &url, &[], &context)
                    .await?;
                response.results
            }
        };

        Ok(titles.into_iter().map(Into::into).collect())
    }

    async fn fetch_keywords(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<Vec<Keyword>, ProviderError> {
        let url = format!(
            "{}/{}/{}/keywords",
            self.base_url,
            media_type.as_str(),
            external_id
        );

        debug!("TMDB keywords: type={}, id={}", media_type, external_id);

        // Same wrapper split as alternative titles.
        let context = format!("keywords for {media_type} {external_id}");
        let keywords = match media_type {
            MediaType::Movie => {
                let response: TmdbMovieKeywords =
                    self.get_json("keywords", &url, &[], &context).await?;
                response.keywords
            }
            MediaType::Tv => {
                let response: TmdbTvKeywords =
                    self.get_json("keywords", &url, &[], &context).await?;
                response.results
            }
        };

        Ok(keywords.into_iter().map(Into::into).collect())
    }

    async fn fetch_season(
        &self,
        external_id: i64,
        season_number: i64,
    ) -> Result<SeasonDetail, ProviderError> {
        let url = format!(
            "{}/tv/{}/season/{}",
            self.base_url, external_id, season_number
        );

        debug!(
            "TMDB season: series={}, season={}",
            external_id, season_number
        );

        let context = format!("tv {external_id} season {season_number}");
        let details: TmdbSeasonDetails = self.get_json("season", &url, &[], &context).await?;

        let mut season: SeasonDetail = details.into();
        for episode in &mut season.episodes {
            episode.still_path = episode.still_path.take().map(|p| self.image_url(&p));
        }
        Ok(season)
    }

    async fn discover(
        &self,
        media_type: MediaType,
        query: &DiscoverQuery,
    ) -> Result<DiscoverPage, ProviderError> {
        let url = format!("{}/discover/{}", self.base_url, media_type.as_str());

        debug!("TMDB discover: type={}, page={}", media_type, query.page);

        let mut params = vec![("page", query.page.to_string())];
        if let Some(v) = &query.with_genres {
            params.push(("with_genres", v.clone()));
        }
        if let Some(v) = &query.with_origin_country {
            params.push(("with_origin_country", v.clone()));
        }
        if let Some(v) = &query.with_original_language {
            params.push(("with_original_language", v.clone()));
        }
        if let Some(v) = &query.sort_by {
            params.push(("sort_by", v.clone()));
        }

        let context = format!("discover {} page {}", media_type, query.page);
        let mut page = match media_type {
            MediaType::Movie => {
                let response: TmdbDiscoverResponse<TmdbDiscoverMovie> =
                    self.get_json("discover", &url, &params, &context).await?;
                DiscoverPage {
                    page: response.page,
                    total_pages: response.total_pages,
                    results: response.results.into_iter().map(Into::into).collect(),
                }
            }
            MediaType::Tv => {
                let response: TmdbDiscoverResponse<TmdbDiscoverTv> =
                    self.get_json("discover", &url, &params, &context).await?;
                DiscoverPage {
                    page: response.page,
                    total_pages: response.total_pages,
                    results: response.results.into_iter().map(Into::into).collect(),
                }
            }
        };

        for title in &mut page.results {
            title.poster_path = title.poster_path.take().map(|p| self.image_url(&p));
        }

        Ok(page)
    }
}

/// TMDB reports missing dates as "" about as often as null.
fn parse_wire_date(s: Option<String>) -> Option<NaiveDate> {
    s.filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: i64,
    title: String,
    original_title: Option<String>,
    original_language: Option<String>,
    #[serde(default)]
    origin_country: Vec<String>,
    release_date: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    status: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvDetails {
    id: i64,
    name: String,
    original_name: Option<String>,
    original_language: Option<String>,
    #[serde(default)]
    origin_country: Vec<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    status: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    number_of_seasons: Option<i64>,
    number_of_episodes: Option<i64>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TmdbImagesResponse {
    #[serde(default)]
    posters: Vec<TmdbImage>,
    #[serde(default)]
    backdrops: Vec<TmdbImage>,
}

#[derive(Debug, Deserialize)]
struct TmdbImage {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct TmdbTranslationsResponse {
    #[serde(default)]
    translations: Vec<TmdbTranslation>,
}

#[derive(Debug, Deserialize)]
struct TmdbTranslation {
    iso_639_1: String,
    data: Option<TmdbTranslationData>,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbTranslationData {
    // Movies call the localized title "title", shows call it "name".
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieAltTitles {
    #[serde(default)]
    titles: Vec<TmdbAltTitle>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvAltTitles {
    #[serde(default)]
    results: Vec<TmdbAltTitle>,
}

#[derive(Debug, Deserialize)]
struct TmdbAltTitle {
    iso_3166_1: Option<String>,
    title: String,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieKeywords {
    #[serde(default)]
    keywords: Vec<TmdbKeyword>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvKeywords {
    #[serde(default)]
    results: Vec<TmdbKeyword>,
}

#[derive(Debug, Deserialize)]
struct TmdbKeyword {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonDetails {
    season_number: i64,
    #[serde(default)]
    episodes: Vec<TmdbEpisodeResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisodeResult {
    id: Option<i64>,
    episode_number: Option<i64>,
    season_number: Option<i64>,
    name: Option<String>,
    overview: Option<String>,
    runtime: Option<i64>,
    air_date: Option<String>,
    still_path: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TmdbDiscoverResponse<T> {
    page: i64,
    total_pages: i64,
    #[serde(default)]
    results: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbDiscoverMovie {
    id: i64,
    title: String,
    original_title: Option<String>,
    original_language: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    #[serde(default)]
    genre_ids: Vec<i64>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbDiscoverTv {
    id: i64,
    name: String,
    original_name: Option<String>,
    original_language: Option<String>,
    #[serde(default)]
    origin_country: Vec<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    #[serde(default)]
    genre_ids: Vec<i64>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<TmdbGenre> for Genre {
    fn from(g: TmdbGenre) -> Self {
        Self {
            id: g.id,
            name: g.name,
        }
    }
}

impl From<TmdbKeyword> for Keyword {
    fn from(k: TmdbKeyword) -> Self {
        Self {
            id: k.id,
            name: k.name,
        }
    }
}

impl From<TmdbMovieDetails> for TitleDetail {
    fn from(d: TmdbMovieDetails) -> Self {
        Self {
            external_id: d.id,
            media_type: MediaType::Movie,
            title: d.title,
            original_title: d.original_title,
            original_language: d.original_language,
            origin_countries: d.origin_country,
            overview: d.overview.unwrap_or_default(),
            tagline: d.tagline.filter(|t| !t.is_empty()),
            status_text: d.status.unwrap_or_default(),
            release_date: parse_wire_date(d.release_date),
            episode_count: 0,
            number_of_seasons: 0,
            genres: d.genres.into_iter().map(Into::into).collect(),
            poster_path: d.poster_path,
            backdrop_path: d.backdrop_path,
            vote_average: d.vote_average.unwrap_or(0.0),
            vote_count: d.vote_count.unwrap_or(0),
        }
    }
}

impl From<TmdbTvDetails> for TitleDetail {
    fn from(d: TmdbTvDetails) -> Self {
        Self {
            external_id: d.id,
            media_type: MediaType::Tv,
            title: d.name,
            original_title: d.original_name,
            original_language: d.original_language,
            origin_countries: d.origin_country,
            overview: d.overview.unwrap_or_default(),
            tagline: d.tagline.filter(|t| !t.is_empty()),
            status_text: d.status.unwrap_or_default(),
            release_date: parse_wire_date(d.first_air_date),
            episode_count: d.number_of_episodes.unwrap_or(0),
            number_of_seasons: d.number_of_seasons.unwrap_or(0),
            genres: d.genres.into_iter().map(Into::into).collect(),
            poster_path: d.poster_path,
            backdrop_path: d.backdrop_path,
            vote_average: d.vote_average.unwrap_or(0.0),
            vote_count: d.vote_count.unwrap_or(0),
        }
    }
}

impl From<TmdbTranslation> for Translation {
    fn from(t: TmdbTranslation) -> Self {
        let data = t.data.unwrap_or_default();
        Self {
            language: t.iso_639_1,
            title: data.title.or(data.name).filter(|s| !s.is_empty()),
            overview: data.overview.filter(|s| !s.is_empty()),
            tagline: data.tagline.filter(|s| !s.is_empty()),
        }
    }
}

impl From<TmdbAltTitle> for AlternativeTitle {
    fn from(t: TmdbAltTitle) -> Self {
        Self {
            country: t.iso_3166_1.filter(|c| !c.is_empty()),
            title: t.title,
        }
    }
}

impl From<TmdbSeasonDetails> for SeasonDetail {
    fn from(d: TmdbSeasonDetails) -> Self {
        let season_number = d.season_number;
        Self {
            season_number,
            episodes: d
                .episodes
                .into_iter()
                .map(|e| e.into_episode(season_number))
                .collect(),
        }
    }
}

impl TmdbEpisodeResult {
    fn into_episode(self, season_number: i64) -> EpisodeDetail {
        EpisodeDetail {
            external_id: self.id,
            episode_number: self.episode_number,
            season_number: self.season_number.unwrap_or(season_number),
            title: self.name.unwrap_or_default(),
            overview: self.overview.unwrap_or_default(),
            runtime: self.runtime,
            air_date: parse_wire_date(self.air_date),
            still_path: self.still_path,
            vote_average: self.vote_average.unwrap_or(0.0),
            vote_count: self.vote_count.unwrap_or(0),
        }
    }
}

impl From<TmdbDiscoverMovie> for DiscoveredTitle {
    fn from(r: TmdbDiscoverMovie) -> Self {
        Self {
            external_id: r.id,
            title: r.title,
            original_title: r.original_title,
            original_language: r.original_language,
            origin_countries: vec![], // Not reported for movie listings
            overview: r.overview.unwrap_or_default(),
            genre_ids: r.genre_ids,
            release_date: parse_wire_date(r.release_date),
            poster_path: r.poster_path,
            vote_average: r.vote_average.unwrap_or(0.0),
            vote_count: r.vote_count.unwrap_or(0),
        }
    }
}

impl From<TmdbDiscoverTv> for DiscoveredTitle {
    fn from(r: TmdbDiscoverTv) -> Self {
        Self {
            external_id: r.id,
            title: r.name,
            original_title: r.original_name,
            original_language: r.original_language,
            origin_countries: r.origin_country,
            overview: r.overview.unwrap_or_default(),
            genre_ids: r.genre_ids,
            release_date: parse_wire_date(r.first_air_date),
            poster_path: r.poster_path,
            vote_average: r.vote_average.unwrap_or(0.0),
            vote_count: r.vote_count.unwrap_or(0),
        }
    }
}
