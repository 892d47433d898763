//! Client configuration

use portainer_types::TransportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to build HTTP transport: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Portainer host name or IP address
    pub host: String,

    /// Portainer API port
    pub port: u16,

    /// Use `https` instead of `http`
    pub use_https: bool,

    /// Timeout applied to each individual request, in seconds
    pub timeout_secs: u64,

    pub username: String,

    pub password: String,

    /// Skip TLS certificate verification (self-signed Portainer installs)
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            use_https: false,
            timeout_secs: 600,
            username: String::new(),
            password: String::new(),
            accept_invalid_certs: false,
        }
    }
}

impl ClientConfig {
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            ..Self::default()
        }
    }

    pub fn with_https(mut self, use_https: bool) -> Self {
        self.use_https = use_https;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from `PORTAINER_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("PORTAINER_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("PORTAINER_PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORTAINER_PORT is not a port: {}", port)))?;
        }
        if let Ok(https) = std::env::var("PORTAINER_HTTPS") {
            self.use_https = matches!(https.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(timeout) = std::env::var("PORTAINER_TIMEOUT") {
            self.timeout_secs = timeout.parse().map_err(|_| {
                ConfigError::Invalid(format!("PORTAINER_TIMEOUT is not a number: {}", timeout))
            })?;
        }
        if let Ok(username) = std::env::var("PORTAINER_USERNAME") {
            self.username = username;
        }
        if let Ok(password) = std::env::var("PORTAINER_PASSWORD") {
            self.password = password;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Invalid("username must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{}://{}:{}/api", scheme, self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Immutable login material for one client instance
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
    base_url: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str, base_url: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl From<&ClientConfig> for Credentials {
    fn from(config: &ClientConfig) -> Self {
        Credentials::new(&config.username, &config.password, &config.base_url())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .field("base_url", &self.base_url)
            .finish()
    }
}
