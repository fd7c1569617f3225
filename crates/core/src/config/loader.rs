use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let mut config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("HALLYU_").split("_"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    expand_secret_refs(&mut config);

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let mut config: Config =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    expand_secret_refs(&mut config);

    Ok(config)
}

/// Resolve ${ENV_VAR} references in the secret-bearing fields.
fn expand_secret_refs(config: &mut Config) {
    if let Some(ref mut key) = config.auth.api_key {
        *key = expand_env(key);
    }

    if let Some(ref mut provider) = config.provider {
        if let Some(ref mut tmdb) = provider.tmdb {
            tmdb.api_key = expand_env(&tmdb.api_key);
        }
    }
}

fn expand_env(value: &str) -> String {
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(name) => std::env::var(name).unwrap_or_default(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[auth]
method = "none"

[server]
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_missing_auth() {
        let toml = r#"
[server]
port = 8080
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = 3000
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_env_ref_expanded_in_provider_key() {
        std::env::set_var("HALLYU_TEST_TMDB_KEY", "from-env");

        let toml = r#"
[auth]
method = "none"

[provider]
backend = "tmdb"

[provider.tmdb]
api_key = "${HALLYU_TEST_TMDB_KEY}"
"#;
        let config = load_config_from_str(toml).unwrap();
        let tmdb = config.provider.unwrap().tmdb.unwrap();
        assert_eq!(tmdb.api_key, "from-env");
    }

    #[test]
    fn test_env_ref_missing_var_becomes_empty() {
        let toml = r#"
[auth]
method = "api_key"
api_key = "${HALLYU_TEST_DOES_NOT_EXIST}"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.auth.api_key.as_deref(), Some(""));
    }

    #[test]
    fn test_plain_key_passes_through_untouched() {
        let toml = r#"
[auth]
method = "api_key"
api_key = "literal-key"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.auth.api_key.as_deref(), Some("literal-key"));
    }
}
