use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::events::HistoryRecord;
use super::store::{HistoryError, HistoryFilter, HistoryStore};

/// SQLite-backed history store
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let conn = Connection::open(path).map_err(|e| HistoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn new_in_memory() -> Result<Self, HistoryError> {
        let conn = Connection::open_in_memory().map_err(|e| HistoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), HistoryError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sync_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_type TEXT NOT NULL,
                external_id INTEGER,
                user_id TEXT,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sync_events_timestamp ON sync_events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_sync_events_event_type ON sync_events(event_type);
            CREATE INDEX IF NOT EXISTS idx_sync_events_external_id ON sync_events(external_id);",
        )
        .map_err(|e| HistoryError::Database(e.to_string()))
    }

    fn build_where_clause(filter: &HistoryFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(event_type) = &filter.event_type {
            conditions.push("event_type = ?".to_string());
            params.push(Box::new(event_type.clone()));
        }
        if let Some(external_id) = filter.external_id {
            conditions.push("external_id = ?".to_string());
            params.push(Box::new(external_id));
        }
        if let Some(from) = &filter.from {
            conditions.push("timestamp >= ?".to_string());
            params.push(Box::new(from.to_rfc3339()));
        }
        if let Some(to) = &filter.to {
            conditions.push("timestamp <= ?".to_string());
            params.push(Box::new(to.to_rfc3339()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        (where_clause, params)
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn insert(&self, record: &HistoryRecord) -> Result<i64, HistoryError> {
        let data = serde_json::to_string(&record.data)
            .map_err(|e| HistoryError::Serialization(e.to_string()))?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sync_events (timestamp, event_type, external_id, user_id, data)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                record.timestamp.to_rfc3339(),
                record.event_type,
                record.external_id,
                record.user_id,
                data
            ],
        )
        .map_err(|e| HistoryError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, HistoryError> {
        let (where_clause, params) = Self::build_where_clause(filter);
        let limit = filter.limit.unwrap_or(100);
        let offset = filter.offset.unwrap_or(0);

        let sql = format!(
            "SELECT id, timestamp, event_type, external_id, user_id, data
             FROM sync_events{} ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        let mut param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        param_refs.push(&limit);
        param_refs.push(&offset);

        let rows = stmt
            .query_map(&param_refs[..], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, timestamp, event_type, external_id, user_id, data) =
                row.map_err(|e| HistoryError::Database(e.to_string()))?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| HistoryError::Database(format!("Invalid timestamp: {}", e)))?
                .with_timezone(&Utc);
            let data = serde_json::from_str(&data)
                .map_err(|e| HistoryError::Serialization(e.to_string()))?;
            records.push(HistoryRecord {
                id,
                timestamp,
                event_type,
                external_id,
                user_id,
                data,
            });
        }
        Ok(records)
    }

    async fn count(&self, filter: &HistoryFilter) -> Result<u64, HistoryError> {
        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM sync_events{}", where_clause);

        let conn = self.conn.lock().unwrap();
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn
            .query_row(&sql, &param_refs[..], |row| row.get(0))
            .map_err(|e| HistoryError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}
