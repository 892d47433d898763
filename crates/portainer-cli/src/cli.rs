use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "portainer",
    about = "Portainer environment and container control",
    version = env!("CARGO_PKG_VERSION"),
    long_about = "Inspect Portainer environments and control their Docker containers through the Portainer HTTP API."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format (table, json)
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Check that the configured credentials are accepted
    Login,

    /// List environments
    Environments {
        /// Index of the first environment to return
        #[arg(long)]
        start: Option<u32>,

        /// Maximum number of environments to return
        #[arg(long)]
        limit: Option<u32>,

        /// Only environments in this group (repeatable)
        #[arg(long = "group-id")]
        group_ids: Vec<i64>,

        /// Only these environments (repeatable)
        #[arg(long = "endpoint-id")]
        endpoint_ids: Vec<i64>,
    },

    /// List containers of an environment
    Containers {
        /// Environment id
        environment: i64,
    },

    /// Show a stats snapshot for a container
    Stats(ContainerTarget),

    /// Check whether a newer image is available for a container
    ImageStatus(ContainerTarget),

    /// Start a container
    Start(ContainerTarget),

    /// Stop a container
    Stop(ContainerTarget),

    /// Restart a container
    Restart(ContainerTarget),

    /// Recreate a container
    Recreate {
        #[command(flatten)]
        target: ContainerTarget,

        /// Reuse the local image instead of pulling it first
        #[arg(long)]
        no_pull: bool,
    },
}

#[derive(clap::Args, Clone, Debug, PartialEq)]
pub struct ContainerTarget {
    /// Environment id
    pub environment: i64,

    /// Container name (without the leading '/')
    pub name: String,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
}
