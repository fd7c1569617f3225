//! Provider-facing metadata types.
//!
//! These are the normalized shapes the rest of the sync pipeline works
//! with. Wire-format quirks (movie/tv payloads disagreeing on key names,
//! empty-string dates) stay inside the provider implementations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Genre, MediaType};

/// Full detail record for a single title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleDetail {
    pub external_id: i64,
    pub media_type: MediaType,
    pub title: String,
    /// Title in the original language, when it differs.
    pub original_title: Option<String>,
    /// ISO 639-1 language code, e.g. "ko".
    pub original_language: Option<String>,
    /// ISO 3166-1 country codes, e.g. ["KR"]. Empty for movies, the
    /// provider only reports it for shows.
    #[serde(default)]
    pub origin_countries: Vec<String>,
    #[serde(default)]
    pub overview: String,
    pub tagline: Option<String>,
    /// Free-text production status as the provider reports it.
    #[serde(default)]
    pub status_text: String,
    /// Release date for movies, first air date for shows.
    pub release_date: Option<NaiveDate>,
    /// Total episode count for shows, 0 for movies.
    #[serde(default)]
    pub episode_count: i64,
    /// Season count for shows, 0 for movies.
    #[serde(default)]
    pub number_of_seasons: i64,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
}

/// Poster and backdrop URLs for a title, best-voted first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitleImages {
    #[serde(default)]
    pub posters: Vec<String>,
    #[serde(default)]
    pub backdrops: Vec<String>,
}

/// A localized title/overview pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    /// ISO 639-1 language code.
    pub language: String,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
}

/// A title known under another name in some region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeTitle {
    /// ISO 3166-1 country code, when reported.
    pub country: Option<String>,
    pub title: String,
}

/// One season's worth of episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonDetail {
    pub season_number: i64,
    #[serde(default)]
    pub episodes: Vec<EpisodeDetail>,
}

/// A single episode as the provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeDetail {
    /// Provider's own episode id.
    pub external_id: Option<i64>,
    /// Absent on some freshly-announced episodes; callers assign a
    /// running number in that case.
    pub episode_number: Option<i64>,
    pub season_number: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    /// Runtime in minutes.
    pub runtime: Option<i64>,
    pub air_date: Option<NaiveDate>,
    pub still_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
}

/// Filter parameters for a discover page request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverQuery {
    /// 1-based page number.
    pub page: i64,
    /// Comma-separated genre ids, e.g. "18,9648".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_genres: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_origin_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_original_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

impl Default for DiscoverQuery {
    fn default() -> Self {
        Self {
            page: 1,
            with_genres: None,
            with_origin_country: None,
            with_original_language: None,
            sort_by: None,
        }
    }
}

/// One page of discover results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverPage {
    pub page: i64,
    pub total_pages: i64,
    #[serde(default)]
    pub results: Vec<DiscoveredTitle>,
}

/// A lightweight listing entry from a discover page. Carries just enough
/// metadata to decide whether the title is worth a full sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredTitle {
    pub external_id: i64,
    pub title: String,
    pub original_title: Option<String>,
    pub original_language: Option<String>,
    #[serde(default)]
    pub origin_countries: Vec<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub release_date: Option<NaiveDate>,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
}

impl TitleDetail {
    /// Minimal detail record, used mostly by tests.
    pub fn new(external_id: i64, media_type: MediaType, title: impl Into<String>) -> Self {
        Self {
            external_id,
            media_type,
            title: title.into(),
            original_title: None,
            original_language: None,
            origin_countries: Vec::new(),
            overview: String::new(),
            tagline: None,
            status_text: String::new(),
            release_date: None,
            episode_count: 0,
            number_of_seasons: 0,
            genres: Vec::new(),
            poster_path: None,
            backdrop_path: None,
            vote_average: 0.0,
            vote_count: 0,
        }
    }

    pub fn has_genre(&self, id: i64) -> bool {
        self.genres.iter().any(|g| g.id == id)
    }
}
