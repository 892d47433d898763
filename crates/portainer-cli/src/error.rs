use portainer_client::{ConfigError, EnvironmentId, PortainerError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Portainer error: {0}")]
    Portainer(#[from] PortainerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment {0} not found")]
    EnvironmentNotFound(EnvironmentId),

    #[error("Container '{name}' not found in environment {environment}")]
    ContainerNotFound {
        environment: EnvironmentId,
        name: String,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
