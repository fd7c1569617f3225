use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::filter::FilterConfig;
use crate::provider::TmdbConfig;
use crate::sync::SyncConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when method = "api_key".
    /// Can use ${ENV_VAR} syntax to read from environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
    // Future: Oidc
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("hallyu.db")
}

/// Metadata provider configuration. Absent means the sync endpoints
/// answer 503 until one is configured.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider backend type
    pub backend: ProviderBackend,
    /// TMDB-specific configuration (required when backend = "tmdb")
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
}

/// Available metadata provider backends
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderBackend {
    Tmdb,
    // Future: Tvdb
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provider_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<SanitizedProviderConfig>,
    pub sync: SyncConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

/// Sanitized provider config (API key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<SanitizedTmdbConfig>,
}

/// Sanitized TMDB config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                api_key_configured: config
                    .auth
                    .api_key
                    .as_deref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            provider_configured: config.provider.is_some(),
            provider: config.provider.as_ref().map(|p| SanitizedProviderConfig {
                backend: match p.backend {
                    ProviderBackend::Tmdb => "tmdb".to_string(),
                },
                tmdb: p.tmdb.as_ref().map(|t| SanitizedTmdbConfig {
                    base_url: t.base_url.clone(),
                    image_base_url: t.image_base_url.clone(),
                    api_key_configured: !t.api_key.is_empty(),
                    timeout_secs: t.timeout_secs,
                }),
            }),
            sync: config.sync.clone(),
            filter: config.filter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_valid_config_with_none_auth() {
        let toml = r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.auth.method, AuthMethod::None));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let toml = r#"
[auth]
method = "none"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "hallyu.db");
        assert!(config.provider.is_none());
        assert_eq!(config.sync.inter_item_delay_ms, 250);
        assert_eq!(config.filter.sentinel_genre_ids, vec![10762]);
    }

    #[test]
    fn test_deserialize_missing_auth_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_api_key_auth() {
        let toml = r#"
[auth]
method = "api_key"
api_key = "s3cret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.auth.method, AuthMethod::ApiKey));
        assert_eq!(config.auth.api_key.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_deserialize_with_provider_config() {
        let toml = r#"
[auth]
method = "none"

[provider]
backend = "tmdb"

[provider.tmdb]
api_key = "test-api-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let provider = config.provider.as_ref().unwrap();
        assert_eq!(provider.backend, ProviderBackend::Tmdb);

        let tmdb = provider.tmdb.as_ref().unwrap();
        assert_eq!(tmdb.api_key, "test-api-key");
        assert!(tmdb.base_url.is_none());
        assert_eq!(tmdb.timeout_secs, 30); // default
    }

    #[test]
    fn test_deserialize_sync_and_filter_sections() {
        let toml = r#"
[auth]
method = "none"

[sync]
on_existing = "resync"

[sync.refresh]
enabled = true
interval_secs = 3600

[filter]
genre_name_blocklist = ["kids"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.sync.refresh.enabled);
        assert_eq!(config.sync.refresh.interval_secs, 3600);
        assert_eq!(config.filter.genre_name_blocklist, vec!["kids"]);
    }

    #[test]
    fn test_sanitized_config() {
        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            provider: None,
            sync: SyncConfig::default(),
            filter: FilterConfig::default(),
        };
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.auth.method, "none");
        assert!(!sanitized.auth.api_key_configured);
        assert_eq!(sanitized.server.port, 8080);
        assert_eq!(sanitized.database.path.to_str().unwrap(), "hallyu.db");
        assert!(!sanitized.provider_configured);
        assert!(sanitized.provider.is_none());
    }

    #[test]
    fn test_sanitized_config_hides_provider_key() {
        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::ApiKey,
                api_key: Some("secret".to_string()),
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            provider: Some(ProviderConfig {
                backend: ProviderBackend::Tmdb,
                tmdb: Some(TmdbConfig {
                    api_key: "secret-key".to_string(),
                    base_url: None,
                    image_base_url: None,
                    timeout_secs: 60,
                }),
            }),
            sync: SyncConfig::default(),
            filter: FilterConfig::default(),
        };

        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.auth.method, "api_key");
        assert!(sanitized.auth.api_key_configured);
        assert!(sanitized.provider_configured);

        let provider = sanitized.provider.as_ref().unwrap();
        assert_eq!(provider.backend, "tmdb");

        let tmdb = provider.tmdb.as_ref().unwrap();
        assert!(tmdb.api_key_configured);
        assert_eq!(tmdb.timeout_secs, 60);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }
}
