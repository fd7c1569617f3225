use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::{handlers, history, middleware, sync, titles};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Dashboard static files path (configurable via env)
    let dashboard_dir = std::env::var("HALLYU_DASHBOARD_DIR")
        .unwrap_or_else(|_| "crates/dashboard/dist".to_string());

    // Probes and scrapers stay reachable without credentials
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics));

    let protected_routes = Router::new()
        // Config
        .route("/config", get(handlers::get_config))
        // Titles
        .route("/titles", post(titles::add_title))
        .route("/titles", get(titles::list_titles))
        .route("/titles/restricted", get(titles::list_restricted_titles))
        .route("/titles/{id}", get(titles::get_title))
        .route("/titles/{id}", delete(titles::delete_title))
        .route("/titles/{id}/resync", post(titles::resync_title))
        .route("/titles/{id}/episodes", get(titles::list_episodes))
        // Sync
        .route("/sync/bulk", post(sync::bulk_import))
        .route("/sync/history", get(history::query_history))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // CORS sits outermost so preflight requests never hit the auth check.
    let api_routes = public_routes
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Serve dashboard with SPA fallback
    let index_path = format!("{}/index.html", dashboard_dir);
    let serve_dir = ServeDir::new(&dashboard_dir).fallback(ServeFile::new(&index_path));

    Router::new()
        .nest("/api/v1", api_routes)
        .fallback_service(serve_dir)
}
