use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::CoreConfig, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Overrides use a `MEDIARC_` prefix and `__` as the section separator,
/// e.g. `MEDIARC_POOL__MAX_CONCURRENCY=4`.
pub fn load_config(path: &Path) -> Result<CoreConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: CoreConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("MEDIARC_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<CoreConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[pool]
max_concurrency = 5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.pool.max_concurrency, 5);
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let toml = r#"
[pool]
max_concurrency = "lots"
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
[caches]
downloads = "/var/lib/mediarc/downloads.json"

[pool]
max_concurrency = 2

[cache]
flush_settle_budget_ms = 100
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.pool.max_concurrency, 2);
        assert_eq!(config.cache.flush_settle_budget_ms, 100);
        assert_eq!(config.caches.len(), 1);
    }

    #[test]
    fn test_load_config_empty_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert!(config.caches.is_empty());
        assert_eq!(config.pool.max_concurrency, 3);
    }
}
