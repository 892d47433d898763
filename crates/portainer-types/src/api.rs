//! API paths and normalized request/response shapes

use crate::error::TransportError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

pub const API_AUTH: &str = "auth";
pub const API_ENDPOINTS: &str = "endpoints";

/// Environment numeric id as assigned by the server
pub type EnvironmentId = i64;

/// Path builders for the Portainer API, relative to `{scheme}://{host}:{port}/api`
pub struct ApiPath;

impl ApiPath {
    pub fn endpoint(environment_id: EnvironmentId) -> String {
        format!("endpoints/{}", environment_id)
    }

    pub fn recreate(environment_id: EnvironmentId, container_id: &str) -> String {
        format!("docker/{}/containers/{}/recreate", environment_id, container_id)
    }

    pub fn image_status(environment_id: EnvironmentId, container_id: &str) -> String {
        format!("docker/{}/containers/{}/image_status", environment_id, container_id)
    }

    pub fn container_action(
        environment_id: EnvironmentId,
        container_id: &str,
        action: ContainerAction,
    ) -> String {
        format!(
            "endpoints/{}/docker/containers/{}/{}",
            environment_id, container_id, action
        )
    }
}

/// Docker engine operations proxied through `endpoints/{id}/docker/containers/{id}/...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerAction {
    Stats,
    Start,
    Stop,
    Restart,
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerAction::Stats => write!(f, "stats"),
            ContainerAction::Start => write!(f, "start"),
            ContainerAction::Stop => write!(f, "stop"),
            ContainerAction::Restart => write!(f, "restart"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Response body after content-type normalization
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Empty,
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ResponseBody::Empty => true,
            ResponseBody::Text(text) => text.is_empty(),
            ResponseBody::Json(_) => false,
        }
    }
}

/// `{status_code, body}` pair returned by every dispatched request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn new(status_code: u16, body: ResponseBody) -> Self {
        Self { status_code, body }
    }

    pub fn json(status_code: u16, value: Value) -> Self {
        Self::new(status_code, ResponseBody::Json(value))
    }

    pub fn text(status_code: u16, text: impl Into<String>) -> Self {
        Self::new(status_code, ResponseBody::Text(text.into()))
    }

    pub fn empty(status_code: u16) -> Self {
        Self::new(status_code, ResponseBody::Empty)
    }

    pub fn is_status(&self, status: u16) -> bool {
        self.status_code == status
    }

    /// Decode the body into a typed payload.
    ///
    /// A body that is not JSON, or JSON of the wrong shape, is a decode failure.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        match &self.body {
            ResponseBody::Json(value) => Ok(T::deserialize(value)?),
            ResponseBody::Text(text) => Err(TransportError::Decode(format!(
                "expected a JSON body, got text: {}",
                truncate(text, 120)
            ))),
            ResponseBody::Empty => Err(TransportError::Decode(
                "expected a JSON body, got an empty response".to_string(),
            )),
        }
    }

    /// The raw JSON body, or a decode failure if the body is not JSON
    pub fn into_json(self) -> Result<Value, TransportError> {
        match self.body {
            ResponseBody::Json(value) => Ok(value),
            other => Err(TransportError::Decode(format!(
                "expected a JSON body, got {:?}",
                other
            ))),
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
