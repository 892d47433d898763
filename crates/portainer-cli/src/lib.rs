pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Commands, OutputFormat};
pub use commands::CommandHandler;
pub use config::load_client_config;
pub use error::{CliError, Result};
