use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hallyu_core::{HistoryFilter, HistoryRecord};

use crate::state::AppState;

/// Maximum allowed limit for history queries
const MAX_LIMIT: u32 = 1000;

/// Default limit for history queries
const DEFAULT_LIMIT: u32 = 100;

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQueryParams {
    /// Filter by event type
    pub event_type: Option<String>,
    /// Filter by provider id
    pub external_id: Option<i64>,
    /// Filter events after this timestamp (ISO 8601)
    pub from: Option<DateTime<Utc>>,
    /// Filter events before this timestamp (ISO 8601)
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of events to return (default 100, max 1000)
    pub limit: Option<u32>,
    /// Pagination offset (default 0)
    pub offset: Option<u32>,
}

/// Response for the history endpoint
#[derive(Debug, Serialize)]
pub struct HistoryQueryResponse {
    /// Matching events, newest first
    pub events: Vec<HistoryRecord>,
    /// Total number of matching events
    pub total: u64,
    /// Limit used for this query
    pub limit: u32,
    /// Offset used for this query
    pub offset: u32,
}

/// Error response for history queries
#[derive(Debug, Serialize)]
pub struct HistoryErrorResponse {
    pub error: String,
}

/// GET /api/v1/sync/history
pub async fn query_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQueryParams>,
) -> Result<Json<HistoryQueryResponse>, impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    // Base filter shared between query and count
    let mut base_filter = HistoryFilter::default();

    if let Some(event_type) = params.event_type {
        base_filter = base_filter.with_event_type(event_type);
    }

    if let Some(external_id) = params.external_id {
        base_filter = base_filter.with_external_id(external_id);
    }

    if let Some(from) = params.from {
        base_filter = base_filter.with_from(from);
    }

    if let Some(to) = params.to {
        base_filter = base_filter.with_to(to);
    }

    let query_filter = base_filter.clone().with_limit(limit).with_offset(offset);

    let events = match state.history_store().query(&query_filter).await {
        Ok(events) => events,
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HistoryErrorResponse {
                    error: format!("Failed to query history: {}", e),
                }),
            ));
        }
    };

    let total = match state.history_store().count(&base_filter).await {
        Ok(count) => count,
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HistoryErrorResponse {
                    error: format!("Failed to count history: {}", e),
                }),
            ));
        }
    };

    Ok(Json(HistoryQueryResponse {
        events,
        total,
        limit,
        offset,
    }))
}
