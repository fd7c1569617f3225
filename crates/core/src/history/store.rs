use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::events::HistoryRecord;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Filter for querying history records
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub event_type: Option<String>,
    pub external_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self {
            limit: Some(100),
            ..Default::default()
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_external_id(mut self, external_id: i64) -> Self {
        self.external_id = Some(external_id);
        self
    }

    pub fn with_from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Storage backend for history records
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert a record, returning its assigned id
    async fn insert(&self, record: &HistoryRecord) -> Result<i64, HistoryError>;

    /// Query records matching the filter, newest first
    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, HistoryError>;

    /// Count records matching the filter, ignoring limit and offset
    async fn count(&self, filter: &HistoryFilter) -> Result<u64, HistoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_new_has_default_limit() {
        let filter = HistoryFilter::new();
        assert_eq!(filter.limit, Some(100));
        assert_eq!(filter.offset, None);
        assert_eq!(filter.event_type, None);
        assert_eq!(filter.external_id, None);
    }

    #[test]
    fn test_filter_builders() {
        let filter = HistoryFilter::new()
            .with_event_type("title_added")
            .with_external_id(1396)
            .with_limit(10)
            .with_offset(20);
        assert_eq!(filter.event_type.as_deref(), Some("title_added"));
        assert_eq!(filter.external_id, Some(1396));
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.offset, Some(20));
    }
}
