//! Bulk import API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hallyu_core::{BatchSummary, BulkImporter, DiscoveryFilter, MediaType};

use super::middleware::AuthUser;
use crate::state::AppState;

/// Default cap on new-or-updated items per run
const DEFAULT_QUOTA: usize = 60;

/// Hard cap on items per run
const MAX_QUOTA: usize = 500;

/// Default cap on discover pages per run
const DEFAULT_MAX_PAGES: usize = 5;

/// Hard cap on discover pages per run
const MAX_PAGES: usize = 50;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a bulk import run
#[derive(Debug, Deserialize)]
pub struct BulkImportBody {
    /// "movie" or "tv"
    pub media_type: MediaType,
    /// Require this genre id in the discover query
    #[serde(default)]
    pub with_genre_id: Option<i64>,
    /// Stop after this many imported-or-updated items
    #[serde(default)]
    pub quota: Option<usize>,
    /// Stop after this many discover pages
    #[serde(default)]
    pub max_pages: Option<usize>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/sync/bulk
///
/// Run one bulk import against the provider's discover feed. The run
/// always completes and answers with a tally; per-item failures land in
/// `errors`.
pub async fn bulk_import(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<BulkImportBody>,
) -> Result<Json<BatchSummary>, impl IntoResponse> {
    let engine = match state.engine() {
        Some(e) => e,
        None => {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Metadata provider not configured".to_string(),
                }),
            ))
        }
    };

    let quota = body.quota.unwrap_or(DEFAULT_QUOTA).clamp(1, MAX_QUOTA);
    let max_pages = body
        .max_pages
        .unwrap_or(DEFAULT_MAX_PAGES)
        .clamp(1, MAX_PAGES);

    // Origin fields stay unset here; the importer falls back to the
    // configured sync origin.
    let filter = DiscoveryFilter {
        media_type: body.media_type,
        with_genre_id: body.with_genre_id,
        origin_language: None,
        origin_country: None,
        sort_by: None,
    };

    let importer = BulkImporter::new(Arc::clone(engine));
    let summary = importer.run(&filter, quota, max_pages, &user_id).await;

    Ok(Json(summary))
}
