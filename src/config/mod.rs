mod schema;

pub use schema::Config;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::scoring::validate_scoring;

/// Get the config directory path (~/.config/house-cup/)
pub fn get_config_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Could not determine home directory");
    home.join(".config").join("house-cup")
}

/// Get the default config file path (~/.config/house-cup/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Where competition data lives when neither --data nor the config file says
/// otherwise (~/.config/house-cup/competition.json)
pub fn default_data_path() -> PathBuf {
    get_config_dir().join("competition.json")
}

/// Load configuration from a YAML file.
///
/// With `path = None` the default location is used, and a missing file is not
/// an error — every field has a default. An explicitly given path must exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read or parsed
/// - `default_scoring` is present but not a valid scoring table
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse config: invalid YAML in {}",
            config_path.display()
        )
    })?;

    // A broken default table would otherwise surface on every `event create`.
    if let Some(scoring) = &config.default_scoring {
        validate_scoring(scoring)
            .with_context(|| format!("Invalid default_scoring in {}", config_path.display()))?;
    }

    Ok(config)
}
