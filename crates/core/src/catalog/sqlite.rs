//! SQLite-backed media catalog implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};

use super::{
    CatalogError, Episode, Genre, Keyword, MediaCatalog, MediaItem, MediaQuery, MediaType,
};
use crate::status::TitleStatus;

const MEDIA_COLUMNS: &str = "internal_id, external_id, media_type, title, native_title, \
     overview, synopsis, category, posters, backdrop, release_date, vote_average, \
     vote_count, status, episode_count, keywords, added_at, updated_at";

/// SQLite-backed media catalog.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Catalog titles. external_id is the provider's id and is unique
            -- across the whole store, movies and shows alike.
            CREATE TABLE IF NOT EXISTS media_items (
                internal_id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id INTEGER NOT NULL UNIQUE,
                media_type TEXT NOT NULL,
                title TEXT NOT NULL,
                native_title TEXT,
                overview TEXT NOT NULL DEFAULT '',
                synopsis TEXT,
                category TEXT,
                posters TEXT NOT NULL DEFAULT '[]',
                backdrop TEXT,
                release_date TEXT,
                vote_average REAL NOT NULL DEFAULT 0,
                vote_count INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                episode_count INTEGER NOT NULL DEFAULT 0,
                keywords TEXT NOT NULL DEFAULT '[]',
                added_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_media_items_media_type ON media_items(media_type);
            CREATE INDEX IF NOT EXISTS idx_media_items_status ON media_items(status);

            -- Provider genres, shared across items. Names refresh
            -- last-write-wins on every reference.
            CREATE TABLE IF NOT EXISTS genres (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS media_genres (
                media_id INTEGER NOT NULL REFERENCES media_items(internal_id) ON DELETE CASCADE,
                genre_id INTEGER NOT NULL REFERENCES genres(id),
                PRIMARY KEY (media_id, genre_id)
            );

            -- Episodes key on (parent, episode_number) so repeated syncs
            -- upsert in place. Rows leave only via parent cascade.
            CREATE TABLE IF NOT EXISTS episodes (
                media_id INTEGER NOT NULL REFERENCES media_items(internal_id) ON DELETE CASCADE,
                episode_number INTEGER NOT NULL,
                season_number INTEGER NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                still TEXT,
                duration INTEGER,
                air_date TEXT,
                external_episode_id INTEGER,
                overview TEXT NOT NULL DEFAULT '',
                vote_average REAL NOT NULL DEFAULT 0,
                vote_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (media_id, episode_number)
            );

            CREATE INDEX IF NOT EXISTS idx_episodes_media_id ON episodes(media_id);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    /// Load genres for a media item.
    fn load_genres(conn: &Connection, media_id: i64) -> Result<Vec<Genre>, CatalogError> {
        let mut stmt = conn
            .prepare(
                "SELECT g.id, g.name FROM genres g
                 JOIN media_genres mg ON mg.genre_id = g.id
                 WHERE mg.media_id = ?1
                 ORDER BY g.id",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![media_id], |row| {
                Ok(Genre {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut genres = Vec::new();
        for row in rows {
            genres.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(genres)
    }

    /// Convert a row to MediaItem (without genres).
    fn row_to_media_item(row: &rusqlite::Row) -> rusqlite::Result<MediaItem> {
        let media_type_str: String = row.get(2)?;
        let media_type = MediaType::parse(&media_type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown media type: {media_type_str}").into(),
            )
        })?;

        let posters_json: String = row.get(8)?;
        let release_date_str: Option<String> = row.get(10)?;
        let status_str: String = row.get(13)?;
        let keywords_json: String = row.get(15)?;
        let added_at_str: String = row.get(16)?;
        let updated_at_str: String = row.get(17)?;

        Ok(MediaItem {
            internal_id: row.get(0)?,
            external_id: row.get(1)?,
            media_type,
            title: row.get(3)?,
            native_title: row.get(4)?,
            overview: row.get(5)?,
            synopsis: row.get(6)?,
            category: row.get(7)?,
            posters: serde_json::from_str(&posters_json).unwrap_or_default(),
            backdrop: row.get(9)?,
            release_date: parse_date(release_date_str),
            vote_average: row.get(11)?,
            vote_count: row.get(12)?,
            status: TitleStatus::parse(&status_str),
            episode_count: row.get(14)?,
            genres: Vec::new(), // Loaded separately
            keywords: serde_json::from_str::<Vec<Keyword>>(&keywords_json).unwrap_or_default(),
            added_at: parse_timestamp(&added_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }

    fn row_to_episode(row: &rusqlite::Row) -> rusqlite::Result<Episode> {
        let air_date_str: Option<String> = row.get(6)?;

        Ok(Episode {
            media_id: row.get(0)?,
            episode_number: row.get(1)?,
            season_number: row.get(2)?,
            title: row.get(3)?,
            still: row.get(4)?,
            duration: row.get(5)?,
            air_date: parse_date(air_date_str),
            external_episode_id: row.get(7)?,
            overview: row.get(8)?,
            vote_average: row.get(9)?,
            vote_count: row.get(10)?,
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

impl MediaCatalog for SqliteCatalog {
    fn upsert_media(&self, item: &MediaItem) -> Result<i64, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let posters_json = serde_json::to_string(&item.posters)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;
        let keywords_json = serde_json::to_string(&item.keywords)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO media_items (
                external_id, media_type, title, native_title, overview, synopsis,
                category, posters, backdrop, release_date, vote_average, vote_count,
                status, episode_count, keywords, added_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT(external_id) DO UPDATE SET
                media_type = excluded.media_type,
                title = excluded.title,
                native_title = excluded.native_title,
                overview = excluded.overview,
                synopsis = excluded.synopsis,
                category = excluded.category,
                posters = excluded.posters,
                backdrop = excluded.backdrop,
                release_date = excluded.release_date,
                vote_average = excluded.vote_average,
                vote_count = excluded.vote_count,
                status = excluded.status,
                episode_count = excluded.episode_count,
                keywords = excluded.keywords,
                updated_at = excluded.updated_at",
            params![
                item.external_id,
                item.media_type.as_str(),
                item.title,
                item.native_title,
                item.overview,
                item.synopsis,
                item.category,
                posters_json,
                item.backdrop,
                item.release_date.map(|d| d.to_string()),
                item.vote_average,
                item.vote_count,
                item.status.as_str(),
                item.episode_count,
                keywords_json,
                item.added_at.to_rfc3339(),
                item.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        conn.query_row(
            "SELECT internal_id FROM media_items WHERE external_id = ?1",
            params![item.external_id],
            |row| row.get(0),
        )
        .map_err(|e| CatalogError::Database(e.to_string()))
    }

    fn get_media_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<MediaItem>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {MEDIA_COLUMNS} FROM media_items WHERE external_id = ?1"),
            params![external_id],
            Self::row_to_media_item,
        );

        match result {
            Ok(mut item) => {
                item.genres = Self::load_genres(&conn, item.internal_id)?;
                Ok(Some(item))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CatalogError::Database(e.to_string())),
        }
    }

    fn get_media(&self, internal_id: i64) -> Result<MediaItem, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut item = conn
            .query_row(
                &format!("SELECT {MEDIA_COLUMNS} FROM media_items WHERE internal_id = ?1"),
                params![internal_id],
                Self::row_to_media_item,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    CatalogError::NotFound(format!("media item {internal_id}"))
                }
                _ => CatalogError::Database(e.to_string()),
            })?;

        item.genres = Self::load_genres(&conn, item.internal_id)?;
        Ok(item)
    }

    fn list_media(&self, query: &MediaQuery) -> Result<Vec<MediaItem>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut items = Vec::new();
        match query.media_type {
            Some(media_type) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {MEDIA_COLUMNS} FROM media_items
                         WHERE media_type = ?1
                         ORDER BY added_at DESC, internal_id DESC
                         LIMIT ?2 OFFSET ?3"
                    ))
                    .map_err(|e| CatalogError::Database(e.to_string()))?;
                let rows = stmt
                    .query_map(
                        params![media_type.as_str(), query.limit, query.offset],
                        Self::row_to_media_item,
                    )
                    .map_err(|e| CatalogError::Database(e.to_string()))?;
                for row in rows {
                    items.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
                }
            }
            None => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {MEDIA_COLUMNS} FROM media_items
                         ORDER BY added_at DESC, internal_id DESC
                         LIMIT ?1 OFFSET ?2"
                    ))
                    .map_err(|e| CatalogError::Database(e.to_string()))?;
                let rows = stmt
                    .query_map(params![query.limit, query.offset], Self::row_to_media_item)
                    .map_err(|e| CatalogError::Database(e.to_string()))?;
                for row in rows {
                    items.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
                }
            }
        }

        for item in &mut items {
            item.genres = Self::load_genres(&conn, item.internal_id)?;
        }
        Ok(items)
    }

    fn list_refreshable(&self, limit: i64) -> Result<Vec<MediaItem>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {MEDIA_COLUMNS} FROM media_items
                 WHERE status = ?1 OR status = ?2
                 ORDER BY updated_at ASC
                 LIMIT ?3"
            ))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![
                    TitleStatus::Upcoming.as_str(),
                    TitleStatus::Ongoing.as_str(),
                    limit
                ],
                Self::row_to_media_item,
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }

        for item in &mut items {
            item.genres = Self::load_genres(&conn, item.internal_id)?;
        }
        Ok(items)
    }

    fn delete_media(&self, internal_id: i64) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();

        // Episodes and genre links go with the parent row via cascade.
        let rows_affected = conn
            .execute(
                "DELETE FROM media_items WHERE internal_id = ?1",
                params![internal_id],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(CatalogError::NotFound(format!("media item {internal_id}")));
        }

        Ok(())
    }

    fn replace_genres(&self, media_id: i64, genres: &[Genre]) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();

        for genre in genres {
            conn.execute(
                "INSERT INTO genres (id, name) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name",
                params![genre.id, genre.name],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        }

        conn.execute(
            "DELETE FROM media_genres WHERE media_id = ?1",
            params![media_id],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        for genre in genres {
            conn.execute(
                "INSERT OR IGNORE INTO media_genres (media_id, genre_id) VALUES (?1, ?2)",
                params![media_id, genre.id],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        }

        Ok(())
    }

    fn upsert_episode(&self, episode: &Episode) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO episodes (
                media_id, episode_number, season_number, title, still, duration,
                air_date, external_episode_id, overview, vote_average, vote_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(media_id, episode_number) DO UPDATE SET
                season_number = excluded.season_number,
                title = excluded.title,
                still = COALESCE(excluded.still, still),
                duration = COALESCE(excluded.duration, duration),
                air_date = COALESCE(excluded.air_date, air_date),
                external_episode_id = COALESCE(excluded.external_episode_id, external_episode_id),
                overview = excluded.overview,
                vote_average = excluded.vote_average,
                vote_count = excluded.vote_count",
            params![
                episode.media_id,
                episode.episode_number,
                episode.season_number,
                episode.title,
                episode.still,
                episode.duration,
                episode.air_date.map(|d| d.to_string()),
                episode.external_episode_id,
                episode.overview,
                episode.vote_average,
                episode.vote_count,
            ],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_episodes(&self, media_id: i64) -> Result<Vec<Episode>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT media_id, episode_number, season_number, title, still, duration,
                        air_date, external_episode_id, overview, vote_average, vote_count
                 FROM episodes
                 WHERE media_id = ?1
                 ORDER BY season_number, episode_number",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![media_id], Self::row_to_episode)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut episodes = Vec::new();
        for row in rows {
            episodes.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(episodes)
    }

    fn count_episodes(&self, media_id: i64) -> Result<i64, CatalogError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT COUNT(*) FROM episodes WHERE media_id = ?1",
            params![media_id],
            |row| row.get(0),
        )
        .map_err(|e| CatalogError::Database(e.to_string()))
    }

    fn update_status(&self, media_id: i64, status: TitleStatus) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();

        let rows_affected = conn
            .execute(
                "UPDATE media_items SET status = ?1, updated_at = ?2 WHERE internal_id = ?3",
                params![status.as_str(), Utc::now().to_rfc3339(), media_id],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(CatalogError::NotFound(format!("media item {media_id}")));
        }

        Ok(())
    }
}
