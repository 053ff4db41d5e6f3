pub mod chat;
pub mod doctor;
pub mod onboard;
pub mod search;
pub mod serve;

use std::path::{Path, PathBuf};

use docent_config::AppConfig;

/// Where the config lives: `--config` if given, else `~/.docent/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load config with environment overrides applied.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load_with_overrides(&config_path(explicit))
        .map_err(|e| format!("Failed to load config: {e}").into())
}
