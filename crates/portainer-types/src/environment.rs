//! Environment ("endpoint") wire types

use crate::container::{null_as_default, ContainerPayload};
use crate::api::EnvironmentId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Environment platform as reported in the `Type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum EnvironmentType {
    Docker,
    Agent,
    Azure,
    EdgeAgent,
    KubernetesLocal,
    KubernetesAgent,
    EdgeKubernetes,
    Unknown(i64),
}

impl From<i64> for EnvironmentType {
    fn from(value: i64) -> Self {
        match value {
            1 => EnvironmentType::Docker,
            2 => EnvironmentType::Agent,
            3 => EnvironmentType::Azure,
            4 => EnvironmentType::EdgeAgent,
            5 => EnvironmentType::KubernetesLocal,
            6 => EnvironmentType::KubernetesAgent,
            7 => EnvironmentType::EdgeKubernetes,
            other => EnvironmentType::Unknown(other),
        }
    }
}

impl From<EnvironmentType> for i64 {
    fn from(value: EnvironmentType) -> Self {
        match value {
            EnvironmentType::Docker => 1,
            EnvironmentType::Agent => 2,
            EnvironmentType::Azure => 3,
            EnvironmentType::EdgeAgent => 4,
            EnvironmentType::KubernetesLocal => 5,
            EnvironmentType::KubernetesAgent => 6,
            EnvironmentType::EdgeKubernetes => 7,
            EnvironmentType::Unknown(other) => other,
        }
    }
}

impl Default for EnvironmentType {
    fn default() -> Self {
        EnvironmentType::Unknown(0)
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentType::Docker => write!(f, "docker"),
            EnvironmentType::Agent => write!(f, "agent"),
            EnvironmentType::Azure => write!(f, "azure"),
            EnvironmentType::EdgeAgent => write!(f, "edge-agent"),
            EnvironmentType::KubernetesLocal => write!(f, "kubernetes"),
            EnvironmentType::KubernetesAgent => write!(f, "kubernetes-agent"),
            EnvironmentType::EdgeKubernetes => write!(f, "edge-kubernetes"),
            EnvironmentType::Unknown(other) => write!(f, "unknown({})", other),
        }
    }
}

/// Reachability as reported in the `Status` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum EnvironmentStatus {
    Up,
    Down,
    Unknown(i64),
}

impl EnvironmentStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, EnvironmentStatus::Up)
    }
}

impl From<i64> for EnvironmentStatus {
    fn from(value: i64) -> Self {
        match value {
            1 => EnvironmentStatus::Up,
            2 => EnvironmentStatus::Down,
            other => EnvironmentStatus::Unknown(other),
        }
    }
}

impl From<EnvironmentStatus> for i64 {
    fn from(value: EnvironmentStatus) -> Self {
        match value {
            EnvironmentStatus::Up => 1,
            EnvironmentStatus::Down => 2,
            EnvironmentStatus::Unknown(other) => other,
        }
    }
}

impl Default for EnvironmentStatus {
    fn default() -> Self {
        EnvironmentStatus::Unknown(0)
    }
}

impl fmt::Display for EnvironmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentStatus::Up => write!(f, "up"),
            EnvironmentStatus::Down => write!(f, "down"),
            EnvironmentStatus::Unknown(other) => write!(f, "unknown({})", other),
        }
    }
}

/// `StatusMessage` is an object on current servers and a bare string on old ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusMessage {
    Structured {
        #[serde(rename = "Summary", default)]
        summary: String,
        #[serde(rename = "Detail", default)]
        detail: String,
    },
    Text(String),
}

impl StatusMessage {
    pub fn is_empty(&self) -> bool {
        match self {
            StatusMessage::Structured { summary, detail } => summary.is_empty() && detail.is_empty(),
            StatusMessage::Text(text) => text.is_empty(),
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::Structured { summary, detail } if detail.is_empty() => write!(f, "{}", summary),
            StatusMessage::Structured { summary, detail } => write!(f, "{}: {}", summary, detail),
            StatusMessage::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Raw Docker snapshot embedded in an environment snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockerSnapshotRaw {
    #[serde(rename = "Containers", default)]
    pub containers: Option<Vec<ContainerPayload>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotPayload {
    #[serde(rename = "DockerSnapshotRaw", default)]
    pub docker_snapshot_raw: Option<DockerSnapshotRaw>,
}

/// Environment object as returned by `GET endpoints` and `GET endpoints/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentPayload {
    #[serde(rename = "Id")]
    pub id: EnvironmentId,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Type", default)]
    pub environment_type: EnvironmentType,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "GroupId", default)]
    pub group_id: i64,
    #[serde(rename = "PublicURL", default)]
    pub public_url: String,
    #[serde(rename = "Status", default)]
    pub status: EnvironmentStatus,
    #[serde(rename = "StatusMessage", default)]
    pub status_message: Option<StatusMessage>,
    #[serde(rename = "QueryDate", default)]
    pub query_date: Option<i64>,
    #[serde(rename = "Snapshots", default, deserialize_with = "null_as_default")]
    pub snapshots: Vec<SnapshotPayload>,
}

impl EnvironmentPayload {
    /// Containers of the first snapshot, or `None` when the payload carries no
    /// Docker snapshot at all.
    pub fn snapshot_containers(&self) -> Option<&[ContainerPayload]> {
        self.snapshots
            .first()?
            .docker_snapshot_raw
            .as_ref()?
            .containers
            .as_deref()
    }
}

/// Query filter for `GET endpoints`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentFilter {
    pub start: Option<u32>,
    pub limit: Option<u32>,
    pub group_ids: Option<Vec<i64>>,
    pub endpoint_ids: Option<Vec<EnvironmentId>>,
}

impl EnvironmentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_group_ids(mut self, group_ids: Vec<i64>) -> Self {
        self.group_ids = Some(group_ids);
        self
    }

    pub fn with_endpoint_ids(mut self, endpoint_ids: Vec<EnvironmentId>) -> Self {
        self.endpoint_ids = Some(endpoint_ids);
        self
    }

    /// Request parameters using the server's query names. Unset fields are omitted.
    pub fn to_params(&self) -> Option<Value> {
        let mut params = Map::new();
        if let Some(start) = self.start {
            params.insert("start".to_string(), Value::from(start));
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), Value::from(limit));
        }
        if let Some(group_ids) = &self.group_ids {
            params.insert("groupIds".to_string(), Value::from(group_ids.clone()));
        }
        if let Some(endpoint_ids) = &self.endpoint_ids {
            params.insert("endpointIds".to_string(), Value::from(endpoint_ids.clone()));
        }

        if params.is_empty() {
            None
        } else {
            Some(Value::Object(params))
        }
    }
}
