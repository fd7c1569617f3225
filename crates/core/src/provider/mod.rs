//! Metadata provider integration.
//!
//! The sync pipeline talks to the outside world exclusively through the
//! [`MetadataProvider`] trait, so tests can swap in a scripted provider
//! and the TMDB specifics stay in one place.

mod tmdb;
mod types;

pub use tmdb::{TmdbConfig, TmdbProvider};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{Keyword, MediaType};

/// Errors that can occur when talking to a metadata provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded (HTTP 429).
    #[error("rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (HTTP 404).
    #[error("resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("failed to parse response: {0}")]
    ParseError(String),

    /// Provider not configured (missing API key, etc.).
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Trait for metadata providers.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch the full detail record for a title.
    async fn fetch_detail(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<TitleDetail, ProviderError>;

    /// Fetch the image gallery for a title.
    async fn fetch_images(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<TitleImages, ProviderError>;

    /// Fetch localized titles and overviews.
    async fn fetch_translations(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<Vec<Translation>, ProviderError>;

    /// Fetch regional alternative titles.
    async fn fetch_alternative_titles(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<Vec<AlternativeTitle>, ProviderError>;

    /// Fetch descriptive keywords.
    async fn fetch_keywords(
        &self,
        media_type: MediaType,
        external_id: i64,
    ) -> Result<Vec<Keyword>, ProviderError>;

    /// Fetch one season of a show, episodes included.
    async fn fetch_season(
        &self,
        external_id: i64,
        season_number: i64,
    ) -> Result<SeasonDetail, ProviderError>;

    /// Fetch one page of catalog listings matching the query.
    async fn discover(
        &self,
        media_type: MediaType,
        query: &DiscoverQuery,
    ) -> Result<DiscoverPage, ProviderError>;
}
