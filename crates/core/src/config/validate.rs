use std::collections::HashMap;
use std::path::PathBuf;

use super::{types::CoreConfig, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Pool concurrency is not 0
/// - Cache persist cadence is not 0
/// - Cache names are non-empty and backing files are not shared
pub fn validate_config(config: &CoreConfig) -> Result<(), ConfigError> {
    if config.pool.max_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "pool.max_concurrency cannot be 0".to_string(),
        ));
    }

    if config.cache.persist_every == 0 {
        return Err(ConfigError::ValidationError(
            "cache.persist_every cannot be 0".to_string(),
        ));
    }

    let mut seen: HashMap<&PathBuf, &String> = HashMap::new();
    for (name, path) in &config.caches {
        if name.is_empty() {
            return Err(ConfigError::ValidationError(
                "cache names cannot be empty".to_string(),
            ));
        }
        if let Some(other) = seen.insert(path, name) {
            return Err(ConfigError::ValidationError(format!(
                "caches '{}' and '{}' share the backing file {}",
                other,
                name,
                path.display()
            )));
        }
    }

    Ok(())
}
