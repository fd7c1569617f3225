use super::types::{AuthMethod, Config, ProviderBackend};
use super::ConfigError;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - api_key auth has a non-empty key
/// - A tmdb provider carries its [provider.tmdb] section and key
/// - An enabled refresh worker has a non-zero interval
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Auth validation; the key may have come through an unset ${ENV_VAR}
    if config.auth.method == AuthMethod::ApiKey {
        let key = config.auth.api_key.as_deref().map(str::trim).unwrap_or("");
        if key.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.api_key is required when auth.method is \"api_key\"".to_string(),
            ));
        }
    }

    // Provider validation
    if let Some(ref provider) = config.provider {
        match provider.backend {
            ProviderBackend::Tmdb => {
                let Some(ref tmdb) = provider.tmdb else {
                    return Err(ConfigError::ValidationError(
                        "provider.tmdb section is required when provider.backend is \"tmdb\""
                            .to_string(),
                    ));
                };
                if tmdb.api_key.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "provider.tmdb.api_key cannot be empty".to_string(),
                    ));
                }
            }
        }
    }

    // Refresh worker validation
    if config.sync.refresh.enabled && config.sync.refresh.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sync.refresh.interval_secs cannot be 0 when refresh is enabled".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, DatabaseConfig, ProviderConfig, ServerConfig};
    use crate::filter::FilterConfig;
    use crate::provider::TmdbConfig;
    use crate::sync::SyncConfig;
    use std::net::IpAddr;

    fn base_config() -> Config {
        Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            provider: None,
            sync: SyncConfig::default(),
            filter: FilterConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base_config();
        config.server = ServerConfig {
            host: "0.0.0.0".parse::<IpAddr>().unwrap(),
            port: 0,
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_api_key_auth_without_key_fails() {
        let mut config = base_config();
        config.auth = AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: None,
        };
        assert!(validate_config(&config).is_err());

        config.auth.api_key = Some("  ".to_string());
        assert!(validate_config(&config).is_err());

        config.auth.api_key = Some("real-key".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_tmdb_backend_requires_section() {
        let mut config = base_config();
        config.provider = Some(ProviderConfig {
            backend: ProviderBackend::Tmdb,
            tmdb: None,
        });
        assert!(validate_config(&config).is_err());

        config.provider = Some(ProviderConfig {
            backend: ProviderBackend::Tmdb,
            tmdb: Some(TmdbConfig {
                api_key: "k".to_string(),
                ..Default::default()
            }),
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_tmdb_empty_key_fails() {
        let mut config = base_config();
        config.provider = Some(ProviderConfig {
            backend: ProviderBackend::Tmdb,
            tmdb: Some(TmdbConfig::default()),
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_enabled_refresh_needs_interval() {
        let mut config = base_config();
        config.sync.refresh.enabled = true;
        config.sync.refresh.interval_secs = 0;
        assert!(validate_config(&config).is_err());

        config.sync.refresh.interval_secs = 3600;
        assert!(validate_config(&config).is_ok());
    }
}
