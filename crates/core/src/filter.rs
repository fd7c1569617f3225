//! Restricted-content predicate.
//!
//! One predicate decides whether a title is child-oriented ("restricted").
//! The general listing excludes matches and the restricted listing is the
//! inverse of the same predicate, so the two views always partition the
//! catalog; call sites never reimplement the rules.

use serde::{Deserialize, Serialize};

use crate::catalog::{Genre, MediaItem};

/// Title/overview substrings that mark child-oriented content. Fixed by
/// contract rather than configured, so the predicate stays enumerable.
const TEXT_KEYWORDS: &[&str] = &["kids", "children", "child", "family", "preschool"];

/// Configuration for the restricted-content predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Curation label that marks a title restricted regardless of
    /// provider metadata.
    #[serde(default = "default_restricted_category")]
    pub restricted_category: String,

    /// Provider genre ids treated as restricted (10762 is the provider's
    /// Kids TV genre).
    #[serde(default = "default_sentinel_genre_ids")]
    pub sentinel_genre_ids: Vec<i64>,

    /// Substrings matched case-insensitively against genre names.
    #[serde(default = "default_genre_name_blocklist")]
    pub genre_name_blocklist: Vec<String>,
}

fn default_restricted_category() -> String {
    "restricted".to_string()
}

fn default_sentinel_genre_ids() -> Vec<i64> {
    vec![10762]
}

fn default_genre_name_blocklist() -> Vec<String> {
    vec!["kids".to_string(), "family".to_string()]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            restricted_category: default_restricted_category(),
            sentinel_genre_ids: default_sentinel_genre_ids(),
            genre_name_blocklist: default_genre_name_blocklist(),
        }
    }
}

/// Borrowed view of the fields the predicate inspects, so stored items
/// and provider discover rows share one code path.
#[derive(Debug)]
pub struct ContentSignals<'a> {
    pub category: Option<&'a str>,
    pub genre_ids: &'a [i64],
    pub genre_names: &'a [&'a str],
    pub title: &'a str,
    pub overview: &'a str,
}

/// The restricted-content predicate, built once from config and shared.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    restricted_category: String,
    sentinel_genre_ids: Vec<i64>,
    genre_name_blocklist: Vec<String>,
}

impl ContentFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            restricted_category: config.restricted_category.clone(),
            sentinel_genre_ids: config.sentinel_genre_ids.clone(),
            genre_name_blocklist: config
                .genre_name_blocklist
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
        }
    }

    /// True when any restricted signal fires: the reserved category
    /// label, a sentinel genre id, a blocklisted genre name, or a
    /// child-oriented keyword in title or overview.
    pub fn is_restricted(&self, signals: &ContentSignals) -> bool {
        if signals.category == Some(self.restricted_category.as_str()) {
            return true;
        }

        if signals
            .genre_ids
            .iter()
            .any(|id| self.sentinel_genre_ids.contains(id))
        {
            return true;
        }

        if signals
            .genre_names
            .iter()
            .any(|name| self.name_is_blocklisted(name))
        {
            return true;
        }

        let title = signals.title.to_lowercase();
        let overview = signals.overview.to_lowercase();
        TEXT_KEYWORDS
            .iter()
            .any(|kw| title.contains(kw) || overview.contains(kw))
    }

    /// Predicate over a stored catalog item.
    pub fn is_restricted_item(&self, item: &MediaItem) -> bool {
        let genre_ids: Vec<i64> = item.genres.iter().map(|g| g.id).collect();
        let genre_names: Vec<&str> = item.genres.iter().map(|g| g.name.as_str()).collect();
        self.is_restricted(&ContentSignals {
            category: item.category.as_deref(),
            genre_ids: &genre_ids,
            genre_names: &genre_names,
            title: &item.title,
            overview: &item.overview,
        })
    }

    /// Genres the merge engine must not link to any item.
    pub fn is_restricted_genre(&self, genre: &Genre) -> bool {
        self.sentinel_genre_ids.contains(&genre.id) || self.name_is_blocklisted(&genre.name)
    }

    fn name_is_blocklisted(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.genre_name_blocklist
            .iter()
            .any(|needle| name.contains(needle))
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}
