//! Async client for the Portainer HTTP API
//!
//! [`Portainer`] owns a [`Session`] that keeps the bearer token and retries a
//! request once after re-authenticating when the server answers 401.
//! Environments returned by [`Portainer::load_environments`] mirror server state
//! and are refreshed in place; their containers are shared handles that survive
//! refreshes and recreation.

pub mod client;
pub mod config;
pub mod container;
pub mod environment;
pub mod session;
pub mod transport;

pub use client::Portainer;
pub use config::{ClientConfig, ConfigError, Credentials};
pub use container::{Container, ContainerDetails};
pub use environment::Environment;
pub use session::Session;
pub use transport::{HttpRequest, ReqwestTransport, Transport};

pub use portainer_types::{
    ApiError, ApiResponse, ContainerState, ContainerStats, EnvironmentFilter, EnvironmentId,
    EnvironmentStatus, EnvironmentType, HttpMethod, PortainerError, ResponseBody, Result,
    StatsSummary, StatusMessage, TransportError,
};
