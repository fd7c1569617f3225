//! Testing utilities and mock implementations.
//!
//! Provides a scripted metadata provider plus fixture builders, so sync
//! tests run against deterministic data without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use hallyu_core::testing::{fixtures, MockMetadataProvider};
//!
//! let provider = MockMetadataProvider::new();
//! provider.add_detail(fixtures::tv_detail(1396, "Signal", 1, 16)).await;
//! provider.add_season(1396, fixtures::season(1, 16)).await;
//!
//! // Use in a SyncEngine...
//! ```

mod mock_provider;

pub use mock_provider::MockMetadataProvider;

/// Fixture builders with reasonable Korean-catalog defaults.
pub mod fixtures {
    use chrono::NaiveDate;

    use crate::catalog::{Genre, MediaType};
    use crate::provider::{
        DiscoverPage, DiscoveredTitle, EpisodeDetail, SeasonDetail, TitleDetail, TitleImages,
        Translation,
    };

    /// A returning Korean series with the given declared season and
    /// episode counts.
    pub fn tv_detail(external_id: i64, title: &str, seasons: i64, episodes: i64) -> TitleDetail {
        TitleDetail {
            external_id,
            media_type: MediaType::Tv,
            title: title.to_string(),
            original_title: Some(format!("{} 원제", title)),
            original_language: Some("ko".to_string()),
            origin_countries: vec!["KR".to_string()],
            overview: format!("A series about {}.", title.to_lowercase()),
            tagline: None,
            status_text: "Returning Series".to_string(),
            release_date: NaiveDate::from_ymd_opt(2016, 1, 22),
            episode_count: episodes,
            number_of_seasons: seasons,
            genres: vec![
                Genre {
                    id: 18,
                    name: "Drama".to_string(),
                },
                Genre {
                    id: 9648,
                    name: "Mystery".to_string(),
                },
            ],
            poster_path: Some(format!(
                "https://image.tmdb.org/t/p/original/{}-poster.jpg",
                external_id
            )),
            backdrop_path: Some(format!(
                "https://image.tmdb.org/t/p/original/{}-backdrop.jpg",
                external_id
            )),
            vote_average: 8.4,
            vote_count: 120,
        }
    }

    /// A released Korean movie.
    pub fn movie_detail(external_id: i64, title: &str) -> TitleDetail {
        TitleDetail {
            external_id,
            media_type: MediaType::Movie,
            title: title.to_string(),
            original_title: Some(format!("{} 원제", title)),
            original_language: Some("ko".to_string()),
            origin_countries: Vec::new(),
            overview: format!("A movie about {}.", title.to_lowercase()),
            tagline: Some("Every secret surfaces.".to_string()),
            status_text: "Released".to_string(),
            release_date: NaiveDate::from_ymd_opt(2003, 11, 21),
            episode_count: 0,
            number_of_seasons: 0,
            genres: vec![Genre {
                id: 53,
                name: "Thriller".to_string(),
            }],
            poster_path: Some(format!(
                "https://image.tmdb.org/t/p/original/{}-poster.jpg",
                external_id
            )),
            backdrop_path: None,
            vote_average: 8.2,
            vote_count: 900,
        }
    }

    /// An image gallery with `posters` numbered posters and one backdrop.
    pub fn images(posters: usize) -> TitleImages {
        TitleImages {
            posters: (1..=posters)
                .map(|i| format!("https://image.tmdb.org/t/p/original/gallery-{}.jpg", i))
                .collect(),
            backdrops: vec!["https://image.tmdb.org/t/p/original/gallery-backdrop.jpg".to_string()],
        }
    }

    pub fn korean_translation(title: &str) -> Translation {
        Translation {
            language: "ko".to_string(),
            title: Some(title.to_string()),
            overview: Some(format!("{}에 대한 이야기.", title)),
            tagline: None,
        }
    }

    pub fn english_translation(title: &str) -> Translation {
        Translation {
            language: "en".to_string(),
            title: Some(title.to_string()),
            overview: Some(format!("The story of {}.", title)),
            tagline: None,
        }
    }

    /// One season with provider-numbered episodes airing weekly from
    /// late January 2016.
    pub fn season(season_number: i64, episodes: i64) -> SeasonDetail {
        SeasonDetail {
            season_number,
            episodes: (1..=episodes)
                .map(|n| EpisodeDetail {
                    external_id: Some(season_number * 100_000 + n),
                    episode_number: Some(n),
                    season_number,
                    title: format!("Episode {}", n),
                    overview: format!("Episode {} of season {}.", n, season_number),
                    runtime: Some(62),
                    air_date: NaiveDate::from_ymd_opt(2016, 1, 22)
                        .map(|d| d + chrono::Duration::weeks(n - 1)),
                    still_path: None,
                    vote_average: 8.0,
                    vote_count: 20,
                })
                .collect(),
        }
    }

    /// A discover row with full Korean origin metadata.
    pub fn discovered_tv(external_id: i64, title: &str) -> DiscoveredTitle {
        DiscoveredTitle {
            external_id,
            title: title.to_string(),
            original_title: Some(format!("{} 원제", title)),
            original_language: Some("ko".to_string()),
            origin_countries: vec!["KR".to_string()],
            overview: format!("A series about {}.", title.to_lowercase()),
            genre_ids: vec![18],
            release_date: NaiveDate::from_ymd_opt(2021, 9, 17),
            poster_path: Some(format!(
                "https://image.tmdb.org/t/p/original/{}-poster.jpg",
                external_id
            )),
            vote_average: 7.9,
            vote_count: 55,
        }
    }

    pub fn discovered_movie(external_id: i64, title: &str) -> DiscoveredTitle {
        DiscoveredTitle {
            external_id,
            title: title.to_string(),
            original_title: Some(format!("{} 원제", title)),
            original_language: Some("ko".to_string()),
            origin_countries: Vec::new(),
            overview: format!("A movie about {}.", title.to_lowercase()),
            genre_ids: vec![53],
            release_date: NaiveDate::from_ymd_opt(2019, 5, 30),
            poster_path: None,
            vote_average: 8.5,
            vote_count: 400,
        }
    }

    pub fn discover_page(
        page: i64,
        total_pages: i64,
        results: Vec<DiscoveredTitle>,
    ) -> DiscoverPage {
        DiscoverPage {
            page,
            total_pages,
            results,
        }
    }
}
