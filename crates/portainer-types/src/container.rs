//! Container wire types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Container lifecycle state as reported by the Docker engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Unknown(String),
}

impl ContainerState {
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ContainerState::Exited | ContainerState::Dead | ContainerState::Created)
    }
}

impl Default for ContainerState {
    fn default() -> Self {
        ContainerState::Unknown(String::new())
    }
}

impl From<&str> for ContainerState {
    fn from(state: &str) -> Self {
        match state.to_lowercase().as_str() {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "removing" => ContainerState::Removing,
            "exited" => ContainerState::Exited,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown(state.to_string()),
        }
    }
}

impl From<String> for ContainerState {
    fn from(state: String) -> Self {
        ContainerState::from(state.as_str())
    }
}

impl From<ContainerState> for String {
    fn from(state: ContainerState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerState::Created => write!(f, "created"),
            ContainerState::Running => write!(f, "running"),
            ContainerState::Paused => write!(f, "paused"),
            ContainerState::Restarting => write!(f, "restarting"),
            ContainerState::Removing => write!(f, "removing"),
            ContainerState::Exited => write!(f, "exited"),
            ContainerState::Dead => write!(f, "dead"),
            ContainerState::Unknown(state) => write!(f, "{}", state),
        }
    }
}

/// Container record from `Snapshots[0].DockerSnapshotRaw.Containers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerPayload {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Names", default, deserialize_with = "null_as_default")]
    pub names: Vec<String>,
    #[serde(rename = "Image", default)]
    pub image: String,
    #[serde(rename = "ImageID", default)]
    pub image_id: String,
    #[serde(rename = "State", default)]
    pub state: ContainerState,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Created", default)]
    pub created: i64,
}

impl ContainerPayload {
    /// Stable key for this container: `Names[0]` without its leading `/`
    pub fn name(&self) -> Option<String> {
        self.names.first().map(|name| derive_container_name(name))
    }
}

/// Deserialize an explicit `null` the same way as a missing key. The server
/// encodes empty lists as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Strip the single leading `/` Docker puts in front of container names
pub fn derive_container_name(raw: &str) -> String {
    raw.strip_prefix('/').unwrap_or(raw).to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecreateState {
    #[serde(rename = "Status")]
    pub status: ContainerState,
}

/// Subset of the inspect body returned by `POST .../recreate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecreateResponse {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "State")]
    pub state: RecreateState,
}

/// Body of `GET .../image_status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageStatusResponse {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecreateRequest {
    #[serde(rename = "PullImage")]
    pub pull_image: bool,
}

/// Point-in-time stats body as returned by the Docker engine.
///
/// The raw JSON is kept verbatim; `summary()` derives the usual headline numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerStats {
    pub raw: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
    pub cpu_usage_percent: f64,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
}

impl StatsSummary {
    pub fn memory_usage_percent(&self) -> f64 {
        if self.memory_limit_bytes == 0 {
            0.0
        } else {
            (self.memory_usage_bytes as f64 / self.memory_limit_bytes as f64) * 100.0
        }
    }
}

impl ContainerStats {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn summary(&self) -> StatsSummary {
        let u64_at = |pointer: &str| self.raw.pointer(pointer).and_then(Value::as_u64).unwrap_or(0);

        let cpu_delta = u64_at("/cpu_stats/cpu_usage/total_usage")
            .saturating_sub(u64_at("/precpu_stats/cpu_usage/total_usage"));
        let system_delta = u64_at("/cpu_stats/system_cpu_usage")
            .saturating_sub(u64_at("/precpu_stats/system_cpu_usage"));
        let online_cpus = match u64_at("/cpu_stats/online_cpus") {
            0 => self
                .raw
                .pointer("/cpu_stats/cpu_usage/percpu_usage")
                .and_then(Value::as_array)
                .map(|cpus| cpus.len() as u64)
                .unwrap_or(1)
                .max(1),
            n => n,
        };

        let cpu_usage_percent = if system_delta == 0 {
            0.0
        } else {
            (cpu_delta as f64 / system_delta as f64) * online_cpus as f64 * 100.0
        };

        StatsSummary {
            cpu_usage_percent,
            memory_usage_bytes: u64_at("/memory_stats/usage"),
            memory_limit_bytes: u64_at("/memory_stats/limit"),
        }
    }
}
