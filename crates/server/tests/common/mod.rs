//! Common test utilities for driving the API with mocked metadata.
//!
//! This module provides a test fixture that builds an in-process router
//! with a mock metadata provider injected, enabling full HTTP-level
//! testing without a TMDB account or network access.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hallyu_core::config::{AuthConfig, DatabaseConfig, ServerConfig};
use hallyu_core::testing::MockMetadataProvider;
use hallyu_core::{
    create_authenticator, create_history_system, AuthMethod, Authenticator, Config, ContentFilter,
    FilterConfig, HistoryStore, MediaCatalog, MetadataProvider, SqliteCatalog, SqliteHistoryStore,
    SyncConfig, SyncEngine,
};

/// Re-export fixtures for test convenience
pub use hallyu_core::testing::fixtures;

/// Test fixture for HTTP-level testing with a mock provider.
///
/// Provides an in-process router backed by a real SQLite catalog in a
/// temp directory, with the metadata provider replaced by a scriptable
/// mock.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_add_title() {
///     let fixture = TestFixture::new().await;
///     fixture.provider.add_detail(fixtures::tv_detail(1396, "Signal", 1, 4)).await;
///
///     let response = fixture.post("/api/v1/titles", json!({
///         "media_type": "tv",
///         "external_id": 1396
///     })).await;
///
///     assert_eq!(response.status, StatusCode::CREATED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock metadata provider - script details, seasons and discover pages
    pub provider: Arc<MockMetadataProvider>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with a provider-backed sync engine.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let provider = Arc::new(MockMetadataProvider::new());

        // Create config
        let config = Config {
            auth: AuthConfig {
                method: if test_config.api_key.is_some() {
                    AuthMethod::ApiKey
                } else {
                    AuthMethod::None
                },
                api_key: test_config.api_key.clone(),
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            provider: None,
            sync: SyncConfig {
                inter_item_delay_ms: 0,
                ..Default::default()
            },
            filter: FilterConfig::default(),
        };

        // Create authenticator from the auth config
        let authenticator: Arc<dyn Authenticator> = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );

        // Create stores
        let catalog: Arc<dyn MediaCatalog> = Arc::new(
            SqliteCatalog::new(&db_path).expect("Failed to create media catalog"),
        );
        let history_store: Arc<dyn HistoryStore> = Arc::new(
            SqliteHistoryStore::new(&db_path).expect("Failed to create history store"),
        );

        // Create history system and spawn the writer
        let (history_handle, history_writer) =
            create_history_system(Arc::clone(&history_store), 100);
        tokio::spawn(history_writer.run());

        let filter = ContentFilter::new(&config.filter);

        // Wire the mock provider into a sync engine unless disabled
        let engine = if test_config.enable_provider {
            Some(Arc::new(
                SyncEngine::new(
                    Arc::clone(&catalog),
                    Arc::clone(&provider) as Arc<dyn MetadataProvider>,
                    filter.clone(),
                    config.sync.clone(),
                )
                .with_history(history_handle.clone()),
            ))
        } else {
            None
        };

        // Create app state with the mock wired in
        let state = Arc::new(hallyu_server::state::AppState::new(
            config,
            authenticator,
            catalog,
            history_store,
            filter,
            engine,
        ));

        // Create router
        let router = hallyu_server::api::create_router(state);

        Self {
            router,
            provider,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send a GET request with an extra header.
    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        self.request("GET", path, None, Some((name, value))).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a GET request and return the body as plain text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Poll the history endpoint until the async writer has persisted at
    /// least `min_total` events. Panics after two seconds.
    pub async fn wait_for_history(&self, min_total: u64) -> TestResponse {
        for _ in 0..40 {
            let response = self.get("/api/v1/sync/history").await;
            if response.body["total"].as_u64().unwrap_or(0) >= min_total {
                return response;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        panic!("History did not reach {} events within 2s", min_total);
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        header: Option<(&str, &str)>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some((name, value)) = header {
            request_builder = request_builder.header(name, value);
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Wire the mock provider into a sync engine
    pub enable_provider: bool,
    /// Require this API key on protected routes
    pub api_key: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enable_provider: true,
            api_key: None,
        }
    }
}

impl TestConfig {
    /// Create config without a metadata provider (sync endpoints answer 503).
    pub fn without_provider() -> Self {
        Self {
            enable_provider: false,
            api_key: None,
        }
    }

    /// Create config with API key auth enabled.
    pub fn with_api_key(key: &str) -> Self {
        Self {
            enable_provider: true,
            api_key: Some(key.to_string()),
        }
    }
}
