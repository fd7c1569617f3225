use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::TitleStatus;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// The two media kinds the catalog stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Wire/storage form; doubles as the provider's URL path segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(Self::Movie),
            "tv" => Some(Self::Tv),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-assigned genre. Rows are created on demand when first
/// referenced; the name refreshes last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Denormalized keyword stored with each item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i64,
    pub name: String,
}

/// A catalog title (movie or series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Store-assigned surrogate key; 0 until persisted.
    #[serde(default)]
    pub internal_id: i64,

    /// Provider id. Unique across the whole store.
    pub external_id: i64,

    pub media_type: MediaType,

    pub title: String,

    /// Original-language title picked by locale preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_title: Option<String>,

    #[serde(default)]
    pub overview: String,

    /// Short blurb (the provider's tagline). Independent of overview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,

    /// Optional curation label. The reserved restricted label feeds the
    /// content filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Poster paths, primary first.
    #[serde(default)]
    pub posters: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,

    /// Release date for movies, first air date for series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,

    #[serde(default)]
    pub vote_average: f64,

    #[serde(default)]
    pub vote_count: i64,

    #[serde(default)]
    pub status: TitleStatus,

    /// Declared episode count from the provider, not the number of
    /// synced episode rows.
    #[serde(default)]
    pub episode_count: i64,

    #[serde(default)]
    pub genres: Vec<Genre>,

    #[serde(default)]
    pub keywords: Vec<Keyword>,

    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaItem {
    pub fn new(external_id: i64, media_type: MediaType, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            internal_id: 0,
            external_id,
            media_type,
            title: title.into(),
            native_title: None,
            overview: String::new(),
            synopsis: None,
            category: None,
            posters: Vec::new(),
            backdrop: None,
            release_date: None,
            vote_average: 0.0,
            vote_count: 0,
            status: TitleStatus::Unknown,
            episode_count: 0,
            genres: Vec::new(),
            keywords: Vec::new(),
            added_at: now,
            updated_at: now,
        }
    }

    pub fn primary_poster(&self) -> Option<&str> {
        self.posters.first().map(String::as_str)
    }
}

/// One episode of a series. Identity is (parent internal id, episode
/// number); repeated syncs upsert in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub media_id: i64,
    pub episode_number: i64,
    pub season_number: i64,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub still: Option<String>,

    /// Runtime in minutes as the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<NaiveDate>,

    /// The provider's own episode id, when it sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_episode_id: Option<i64>,

    #[serde(default)]
    pub overview: String,

    #[serde(default)]
    pub vote_average: f64,

    #[serde(default)]
    pub vote_count: i64,
}

/// Paged listing query.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaQuery {
    #[serde(default)]
    pub media_type: Option<MediaType>,

    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

impl Default for MediaQuery {
    fn default() -> Self {
        Self {
            media_type: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_round_trip() {
        assert_eq!(MediaType::parse("movie"), Some(MediaType::Movie));
        assert_eq!(MediaType::parse("tv"), Some(MediaType::Tv));
        assert_eq!(MediaType::parse("book"), None);
        assert_eq!(MediaType::Movie.as_str(), "movie");
        assert_eq!(MediaType::Tv.to_string(), "tv");
    }

    #[test]
    fn test_media_type_serde() {
        assert_eq!(serde_json::to_string(&MediaType::Tv).unwrap(), "\"tv\"");
        let parsed: MediaType = serde_json::from_str("\"movie\"").unwrap();
        assert_eq!(parsed, MediaType::Movie);
    }

    #[test]
    fn test_new_media_item_defaults() {
        let item = MediaItem::new(1396, MediaType::Tv, "Signal");
        assert_eq!(item.internal_id, 0);
        assert_eq!(item.external_id, 1396);
        assert_eq!(item.title, "Signal");
        assert_eq!(item.status, TitleStatus::Unknown);
        assert_eq!(item.episode_count, 0);
        assert!(item.posters.is_empty());
        assert!(item.genres.is_empty());
        assert!(item.keywords.is_empty());
        assert_eq!(item.primary_poster(), None);
    }

    #[test]
    fn test_primary_poster_is_first() {
        let mut item = MediaItem::new(1, MediaType::Movie, "Oldboy");
        item.posters = vec!["/a.jpg".to_string(), "/b.jpg".to_string()];
        assert_eq!(item.primary_poster(), Some("/a.jpg"));
    }

    #[test]
    fn test_media_item_json_skips_absent_options() {
        let item = MediaItem::new(1, MediaType::Movie, "Oldboy");
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("native_title"));
        assert!(!json.contains("backdrop"));
        assert!(!json.contains("synopsis"));
        assert!(json.contains("\"media_type\":\"movie\""));
    }

    #[test]
    fn test_media_query_defaults() {
        let query: MediaQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 100);
        assert_eq!(query.offset, 0);
        assert_eq!(query.media_type, None);

        let query = MediaQuery::default();
        assert_eq!(query.limit, 100);
    }

    #[test]
    fn test_episode_serde_round_trip() {
        let episode = Episode {
            media_id: 7,
            episode_number: 3,
            season_number: 1,
            title: "Episode 3".to_string(),
            still: Some("/still.jpg".to_string()),
            duration: Some(62),
            air_date: NaiveDate::from_ymd_opt(2016, 1, 29),
            external_episode_id: Some(1157389),
            overview: "The walkie-talkie crackles again.".to_string(),
            vote_average: 8.4,
            vote_count: 21,
        };
        let json = serde_json::to_string(&episode).unwrap();
        let back: Episode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, episode);
    }
}
