//! Local media catalog storage.
//!
//! Titles, their genre links and episode rows live in sqlite. The store
//! guarantees atomic upsert-by-unique-key: external id for titles, the
//! (parent, episode number) pair for episodes.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

use crate::status::TitleStatus;

/// Persistent catalog store.
pub trait MediaCatalog: Send + Sync {
    /// Insert or update a title keyed by external id. Returns the
    /// internal id. `added_at` is preserved on update.
    fn upsert_media(&self, item: &MediaItem) -> Result<i64, CatalogError>;

    /// Look up a title by provider id. `Ok(None)` when absent.
    fn get_media_by_external_id(&self, external_id: i64)
        -> Result<Option<MediaItem>, CatalogError>;

    /// Load a title by internal id. `NotFound` when absent.
    fn get_media(&self, internal_id: i64) -> Result<MediaItem, CatalogError>;

    /// Paged listing, newest first. Restricted-content filtering happens
    /// at the call site, not here.
    fn list_media(&self, query: &MediaQuery) -> Result<Vec<MediaItem>, CatalogError>;

    /// Titles whose status the background refresh keeps re-syncing,
    /// least recently updated first.
    fn list_refreshable(&self, limit: i64) -> Result<Vec<MediaItem>, CatalogError>;

    /// Delete a title. Episode rows and genre links cascade.
    fn delete_media(&self, internal_id: i64) -> Result<(), CatalogError>;

    /// Replace a title's genre set. Missing genre rows are created by
    /// provider id; names refresh last-write-wins.
    fn replace_genres(&self, media_id: i64, genres: &[Genre]) -> Result<(), CatalogError>;

    /// Insert or update one episode by its composite identity.
    fn upsert_episode(&self, episode: &Episode) -> Result<(), CatalogError>;

    /// Episodes of a title ordered by season then episode number.
    fn list_episodes(&self, media_id: i64) -> Result<Vec<Episode>, CatalogError>;

    /// Number of synced episode rows for a title.
    fn count_episodes(&self, media_id: i64) -> Result<i64, CatalogError>;

    /// Persist a new status for a title.
    fn update_status(&self, media_id: i64, status: TitleStatus) -> Result<(), CatalogError>;
}
