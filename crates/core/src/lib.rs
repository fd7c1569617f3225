pub mod auth;
pub mod catalog;
pub mod config;
pub mod filter;
pub mod history;
pub mod metrics;
pub mod provider;
pub mod status;
pub mod sync;
pub mod testing;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use catalog::{
    CatalogError, Episode, Genre, Keyword, MediaCatalog, MediaItem, MediaQuery, MediaType,
    SqliteCatalog,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    ProviderBackend, SanitizedConfig,
};
pub use filter::{ContentFilter, ContentSignals, FilterConfig};
pub use history::{
    create_history_system, HistoryFilter, HistoryHandle, HistoryRecord, HistoryStore,
    HistoryWriter, SqliteHistoryStore, SyncEvent,
};
pub use provider::{MetadataProvider, ProviderError, TmdbConfig, TmdbProvider};
pub use status::TitleStatus;
pub use sync::{
    BatchSummary, BulkImporter, DiscoveryFilter, ExistingPolicy, RefreshConfig, RefreshWorker,
    SyncConfig, SyncEngine, SyncError, TitleOverrides,
};
