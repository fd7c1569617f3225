//! Title catalog API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hallyu_core::{
    CatalogError, Episode, MediaItem, MediaQuery, MediaType, ProviderError, SyncError,
    TitleOverrides,
};

use super::middleware::AuthUser;
use crate::state::AppState;

/// Maximum allowed limit for title listings
const MAX_LIMIT: i64 = 1000;

/// Default limit for title listings
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for tracking a new title
#[derive(Debug, Deserialize)]
pub struct AddTitleBody {
    /// "movie" or "tv"
    pub media_type: MediaType,
    /// Provider id of the title
    pub external_id: i64,
    /// Manual field overrides, applied on top of provider data
    #[serde(default)]
    pub overrides: TitleOverrides,
}

/// Request body for resyncing a title
#[derive(Debug, Deserialize)]
pub struct ResyncTitleBody {
    #[serde(default)]
    pub overrides: TitleOverrides,
}

/// Query parameters for title listings
#[derive(Debug, Deserialize)]
pub struct ListTitlesParams {
    /// Filter by media type
    pub media_type: Option<MediaType>,
    /// Maximum number of titles to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for title listings
#[derive(Debug, Serialize)]
pub struct ListTitlesResponse {
    pub titles: Vec<MediaItem>,
    pub count: usize,
    pub limit: i64,
    pub offset: i64,
}

/// Response for episode listings
#[derive(Debug, Serialize)]
pub struct EpisodeListResponse {
    pub episodes: Vec<Episode>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a sync error onto an HTTP status.
///
/// An unconfigured provider surfacing through a fetch is a 503, not a
/// 502: the deployment is incomplete rather than the upstream broken.
fn sync_error_response(err: SyncError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        SyncError::Validation(_) => StatusCode::BAD_REQUEST,
        SyncError::Conflict { .. } => StatusCode::CONFLICT,
        SyncError::NotFound(_) => StatusCode::NOT_FOUND,
        SyncError::FatalFetch {
            source: ProviderError::NotConfigured(_),
            ..
        } => StatusCode::SERVICE_UNAVAILABLE,
        SyncError::FatalFetch { .. } => StatusCode::BAD_GATEWAY,
        SyncError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn catalog_error_response(err: CatalogError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn provider_unavailable() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "Metadata provider not configured".to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/titles
///
/// Track a new title by provider id.
pub async fn add_title(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AddTitleBody>,
) -> Result<(StatusCode, Json<MediaItem>), impl IntoResponse> {
    let engine = match state.engine() {
        Some(e) => e,
        None => return Err(provider_unavailable()),
    };

    match engine
        .add_title(body.media_type, body.external_id, body.overrides, &user_id)
        .await
    {
        Ok(item) => Ok((StatusCode::CREATED, Json(item))),
        Err(e) => Err(sync_error_response(e)),
    }
}

/// POST /api/v1/titles/{id}/resync
///
/// Re-fetch a tracked title from the provider and merge.
pub async fn resync_title(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Option<Json<ResyncTitleBody>>,
) -> Result<Json<MediaItem>, impl IntoResponse> {
    let engine = match state.engine() {
        Some(e) => e,
        None => return Err(provider_unavailable()),
    };

    let overrides = body.map(|Json(b)| b.overrides).unwrap_or_default();

    match engine.resync_title(id, overrides).await {
        Ok(item) => Ok(Json(item)),
        Err(e) => Err(sync_error_response(e)),
    }
}

/// GET /api/v1/titles
///
/// List tracked titles, restricted content excluded.
pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTitlesParams>,
) -> Result<Json<ListTitlesResponse>, impl IntoResponse> {
    list_with_predicate(&state, params, false)
}

/// GET /api/v1/titles/restricted
///
/// List only the restricted titles.
pub async fn list_restricted_titles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTitlesParams>,
) -> Result<Json<ListTitlesResponse>, impl IntoResponse> {
    list_with_predicate(&state, params, true)
}

/// Shared listing body. The restricted predicate runs on the fetched
/// page, so a page can come back shorter than `limit`.
fn list_with_predicate(
    state: &AppState,
    params: ListTitlesParams,
    restricted: bool,
) -> Result<Json<ListTitlesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let query = MediaQuery {
        media_type: params.media_type,
        limit,
        offset,
    };

    let mut titles = match state.catalog().list_media(&query) {
        Ok(titles) => titles,
        Err(e) => return Err(catalog_error_response(e)),
    };
    titles.retain(|item| state.filter().is_restricted_item(item) == restricted);

    let count = titles.len();
    Ok(Json(ListTitlesResponse {
        titles,
        count,
        limit,
        offset,
    }))
}

/// GET /api/v1/titles/{id}
pub async fn get_title(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MediaItem>, impl IntoResponse> {
    match state.catalog().get_media(id) {
        Ok(item) => Ok(Json(item)),
        Err(e) => Err(catalog_error_response(e)),
    }
}

/// GET /api/v1/titles/{id}/episodes
///
/// Episodes of a title, ordered by season then episode number.
pub async fn list_episodes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<EpisodeListResponse>, impl IntoResponse> {
    // 404 for unknown titles rather than an empty list.
    if let Err(e) = state.catalog().get_media(id) {
        return Err(catalog_error_response(e));
    }

    match state.catalog().list_episodes(id) {
        Ok(episodes) => {
            let count = episodes.len();
            Ok(Json(EpisodeListResponse { episodes, count }))
        }
        Err(e) => Err(catalog_error_response(e)),
    }
}

/// DELETE /api/v1/titles/{id}
///
/// Remove a tracked title. Episode rows cascade.
pub async fn delete_title(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, impl IntoResponse> {
    let engine = match state.engine() {
        Some(e) => e,
        None => return Err(provider_unavailable()),
    };

    match engine.remove_title(id, &user_id).await {
        Ok(()) => Ok(Json(SuccessResponse {
            message: format!("Title {} removed", id),
        })),
        Err(e) => Err(sync_error_response(e)),
    }
}
