//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files.

use std::fs;
use std::path::Path;

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Quote Sync Configuration
# Auto-generated - edit as needed

[sync]
# Interval between periodic syncs in seconds (default: 30)
interval_secs = 30

# Whether the daemon syncs at all
enabled = true

# Remote endpoint returning a JSON array of records with a "title"
endpoint = "https://jsonplaceholder.typicode.com/posts"

# Number of leading remote records merged per cycle
batch_size = 5

# Category given to every quote pulled from the remote
server_category = "ServerQuote"

# Give up on a single fetch after this many seconds
request_timeout_secs = 10

[paths]
# Custom data directory (optional, defaults to ~/.quote-sync)
# data_dir = "/custom/path"
"#;

/// Load configuration from the data directory or fall back to defaults.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config(data_dir: Option<&Path>) -> Result<AppConfig> {
    let dir = data_dir.map_or_else(AppConfig::default_data_dir, Path::to_path_buf);
    let config_path = dir.join("config.toml");

    let mut config = if config_path.exists() {
        load_config_from_file(&config_path)?
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        AppConfig::default()
    };

    // An explicit directory wins over whatever the file says.
    if let Some(dir) = data_dir {
        config.paths.data_dir = Some(dir.to_path_buf());
    }

    Ok(config)
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Save configuration to file.
///
/// # Errors
/// Returns error if file cannot be written.
pub fn save_config(config: &AppConfig) -> Result<()> {
    let config_path = config.config_file_path();

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    fs::write(&config_path, content)
        .map_err(|e| AppError::io(format!("Failed to write config file: {}", config_path.display()), e))?;

    tracing::info!(path = %config_path.display(), "Configuration saved");

    Ok(())
}

/// Create default configuration file if it doesn't exist.
///
/// Returns `true` when a new file was written.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(config: &AppConfig) -> Result<bool> {
    let config_path = config.config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %config_path.display(), "Created default configuration");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.sync.interval_secs, 30);
        assert_eq!(config.sync.batch_size, 5);
        assert_eq!(config.sync.server_category, "ServerQuote");
        assert!(config.paths.data_dir.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = toml::from_str("[sync]\ninterval_secs = 5\n").unwrap();
        assert_eq!(config.sync.interval_secs, 5);
        assert_eq!(config.sync.batch_size, 5);
        assert_eq!(config.sync.request_timeout_secs, 10);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();

        let mut config = AppConfig::default();
        config.paths.data_dir = Some(dir.path().to_path_buf());
        config.sync.batch_size = 3;

        save_config(&config).unwrap();
        let loaded = load_config(Some(dir.path())).unwrap();

        assert_eq!(loaded.sync.batch_size, 3);
        assert_eq!(loaded.data_dir(), dir.path());
    }

    #[test]
    fn test_ensure_config_writes_once() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.paths.data_dir = Some(dir.path().to_path_buf());

        assert!(ensure_config_exists(&config).unwrap());
        assert!(!ensure_config_exists(&config).unwrap());

        let loaded = load_config_from_file(&config.config_file_path()).unwrap();
        assert_eq!(loaded.sync.interval_secs, 30);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[sync]\ninterval_secs = \"soon\"\n").unwrap();

        assert!(matches!(
            load_config_from_file(&path),
            Err(AppError::Config { .. })
        ));
    }
}
