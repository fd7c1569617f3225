//! Derived lifecycle status for catalog titles.
//!
//! The provider reports status as free text ("Returning Series", "Ended",
//! "Post Production"...). Classification trims and lowercases that text and
//! resolves it against fixed lookup tables, one per (media type, date
//! presence) combination, so the full mapping is enumerable in tests.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::MediaType;

/// Lifecycle status of a catalog title, derived from provider fields
/// unless explicitly overridden by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TitleStatus {
    Upcoming,
    Ongoing,
    Complete,
    Canceled,
    Released,
    PostProduction,
    InProduction,
    Pilot,
    Rumored,
    Planned,
    #[default]
    Unknown,
}

impl TitleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Complete => "complete",
            Self::Canceled => "canceled",
            Self::Released => "released",
            Self::PostProduction => "post_production",
            Self::InProduction => "in_production",
            Self::Pilot => "pilot",
            Self::Rumored => "rumored",
            Self::Planned => "planned",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a stored status string. Unrecognized values map to `Unknown`
    /// so rows written by a newer build still load.
    pub fn parse(s: &str) -> Self {
        match s {
            "upcoming" => Self::Upcoming,
            "ongoing" => Self::Ongoing,
            "complete" => Self::Complete,
            "canceled" => Self::Canceled,
            "released" => Self::Released,
            "post_production" => Self::PostProduction,
            "in_production" => Self::InProduction,
            "pilot" => Self::Pilot,
            "rumored" => Self::Rumored,
            "planned" => Self::Planned,
            _ => Self::Unknown,
        }
    }

    /// True for statuses the background refresh keeps re-syncing.
    pub fn is_refreshable(&self) -> bool {
        matches!(self, Self::Upcoming | Self::Ongoing)
    }
}

impl std::fmt::Display for TitleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movie with a release date that has passed.
const MOVIE_DATED: &[(&str, TitleStatus)] = &[
    ("released", TitleStatus::Released),
    ("canceled", TitleStatus::Canceled),
    ("cancelled", TitleStatus::Canceled),
    ("post production", TitleStatus::PostProduction),
    ("in production", TitleStatus::InProduction),
];

/// Movie with no release date at all.
const MOVIE_UNDATED: &[(&str, TitleStatus)] = &[
    ("released", TitleStatus::Released),
    ("canceled", TitleStatus::Canceled),
    ("cancelled", TitleStatus::Canceled),
    ("post production", TitleStatus::PostProduction),
    ("in production", TitleStatus::InProduction),
    ("rumored", TitleStatus::Rumored),
    ("planned", TitleStatus::Planned),
];

/// Series whose first air date has passed. Unmatched text falls back to
/// `Ongoing`: a show that quietly stopped airing is misread as still
/// running until its status text gets a table entry.
const TV_AIRED: &[(&str, TitleStatus)] = &[
    ("returning series", TitleStatus::Ongoing),
    ("returning", TitleStatus::Ongoing),
    ("ended", TitleStatus::Complete),
    ("canceled", TitleStatus::Canceled),
    ("cancelled", TitleStatus::Canceled),
    ("in production", TitleStatus::Ongoing),
    ("pilot", TitleStatus::Pilot),
    ("planned", TitleStatus::Upcoming),
];

/// Series with no first air date yet.
const TV_UNAIRED: &[(&str, TitleStatus)] = &[
    ("planned", TitleStatus::Upcoming),
    ("in production", TitleStatus::Upcoming),
    ("ended", TitleStatus::Complete),
    ("canceled", TitleStatus::Canceled),
    ("cancelled", TitleStatus::Canceled),
    ("returning series", TitleStatus::Ongoing),
    ("returning", TitleStatus::Ongoing),
];

fn lookup(table: &[(&str, TitleStatus)], text: &str) -> Option<TitleStatus> {
    table
        .iter()
        .find(|(key, _)| *key == text)
        .map(|(_, status)| *status)
}

/// Derive a status from provider fields. Total: every combination of
/// inputs yields exactly one status.
///
/// A strictly future date wins over any status text for both media types.
/// `today` is explicit so callers (and tests) control the reference day;
/// use [`classify_now`] for wall-clock classification.
pub fn classify(
    media_type: Option<MediaType>,
    status_text: &str,
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> TitleStatus {
    let Some(media_type) = media_type else {
        return TitleStatus::Unknown;
    };

    if matches!(date, Some(d) if d > today) {
        return TitleStatus::Upcoming;
    }

    let text = status_text.trim().to_lowercase();
    match (media_type, date.is_some()) {
        (MediaType::Movie, true) => lookup(MOVIE_DATED, &text).unwrap_or(TitleStatus::Released),
        (MediaType::Movie, false) => lookup(MOVIE_UNDATED, &text).unwrap_or(TitleStatus::Upcoming),
        (MediaType::Tv, true) => lookup(TV_AIRED, &text).unwrap_or(TitleStatus::Ongoing),
        (MediaType::Tv, false) => lookup(TV_UNAIRED, &text).unwrap_or(TitleStatus::Upcoming),
    }
}

/// [`classify`] with today taken from the wall clock.
pub fn classify_now(
    media_type: Option<MediaType>,
    status_text: &str,
    date: Option<NaiveDate>,
) -> TitleStatus {
    classify(media_type, status_text, date, Utc::now().date_naive())
}
