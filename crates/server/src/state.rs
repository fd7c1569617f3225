use std::sync::Arc;

use hallyu_core::{
    Authenticator, Config, ContentFilter, HistoryStore, MediaCatalog, SanitizedConfig, SyncEngine,
};

/// Shared application state.
///
/// The engine is absent when no metadata provider is configured; the
/// server then serves the catalog read-only and sync endpoints answer
/// 503.
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    catalog: Arc<dyn MediaCatalog>,
    history_store: Arc<dyn HistoryStore>,
    filter: ContentFilter,
    engine: Option<Arc<SyncEngine>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        catalog: Arc<dyn MediaCatalog>,
        history_store: Arc<dyn HistoryStore>,
        filter: ContentFilter,
        engine: Option<Arc<SyncEngine>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            catalog,
            history_store,
            filter,
            engine,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn catalog(&self) -> &dyn MediaCatalog {
        self.catalog.as_ref()
    }

    pub fn history_store(&self) -> &dyn HistoryStore {
        self.history_store.as_ref()
    }

    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    pub fn engine(&self) -> Option<&Arc<SyncEngine>> {
        self.engine.as_ref()
    }
}
