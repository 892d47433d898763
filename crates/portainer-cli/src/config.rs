use crate::error::Result;
use portainer_client::ClientConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the client configuration.
///
/// Order: defaults, then the TOML file (explicit path, or the default path when it
/// exists), then `.env`, then `PORTAINER_*` variables.
pub fn load_client_config(config_path: Option<&Path>) -> Result<ClientConfig> {
    let mut config = match config_path {
        Some(path) => ClientConfig::load(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => {
                debug!("Using configuration file {}", path.display());
                ClientConfig::load(&path)?
            }
            _ => ClientConfig::default(),
        },
    };

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("portainer").join("config.toml"))
}
