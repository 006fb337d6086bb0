//! Configuration loading
//!
//! Reads the static TOML configuration, creating it with defaults on first
//! run, and applies command line overrides.

use std::path::Path;

use ambifan_core::config::DisplayFormat;
use ambifan_core::{AmbifanError, Result, StaticConfig};
use tokio::fs;
use tracing::{debug, info};

/// Command line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub no_auto_connect: bool,
    pub format: Option<DisplayFormat>,
}

impl Overrides {
    pub fn apply(&self, config: &mut StaticConfig) {
        if let Some(port) = &self.port {
            config.serial.port = Some(port.clone());
        }
        if self.no_auto_connect {
            config.serial.auto_connect = false;
        }
        if let Some(format) = self.format {
            config.display.format = format;
        }
    }
}

/// Load the static config from `path`, creating it with defaults if missing.
pub async fn load_config(path: &Path) -> Result<StaticConfig> {
    info!("Loading configuration from: {}", path.display());

    if !path.exists() {
        info!(
            "Config not found at {}. Creating with defaults.",
            path.display()
        );

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AmbifanError::Config(format!(
                    "Failed to create config directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let config = StaticConfig::default();
        let toml_str = config
            .to_toml()
            .map_err(|e| AmbifanError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, &toml_str)
            .await
            .map_err(|e| AmbifanError::Config(format!("Failed to write config file: {}", e)))?;

        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AmbifanError::Config(format!("Failed to read config file: {}", e)))?;

    let config = StaticConfig::from_toml(&content)
        .map_err(|e| AmbifanError::Config(format!("Failed to parse config file: {}", e)))?;

    config.validate()?;
    debug!("Configuration: {:?}", config);

    Ok(config)
}
