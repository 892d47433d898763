//! Common types shared across Portainer crates
//!
//! This crate provides the wire payloads exchanged with the Portainer HTTP API,
//! the API path templates, and the error taxonomy used by the client.

pub mod api;
pub mod container;
pub mod environment;
pub mod error;

pub use api::*;
pub use container::*;
pub use environment::*;
pub use error::*;
