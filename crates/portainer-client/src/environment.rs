//! Environment mirror: in-place refresh and upsert-by-name of containers

use crate::container::Container;
use crate::session::Session;
use portainer_types::{
    ApiError, ApiPath, EnvironmentId, EnvironmentPayload, EnvironmentStatus, EnvironmentType,
    Result, StatusMessage,
};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Environment {
    session: Arc<Session>,
    id: EnvironmentId,
    name: String,
    environment_type: EnvironmentType,
    url: String,
    group_id: i64,
    public_url: String,
    status: EnvironmentStatus,
    status_message: Option<StatusMessage>,
    query_date: Option<i64>,
    containers: BTreeMap<String, Arc<Container>>,
}

impl Environment {
    pub(crate) fn from_payload(session: Arc<Session>, payload: EnvironmentPayload) -> Self {
        let mut environment = Self {
            session,
            id: payload.id,
            name: String::new(),
            environment_type: EnvironmentType::default(),
            url: String::new(),
            group_id: 0,
            public_url: String::new(),
            status: EnvironmentStatus::default(),
            status_message: None,
            query_date: None,
            containers: BTreeMap::new(),
        };
        environment.apply_payload(payload);
        environment
    }

    /// Re-fetch this environment and apply it in place
    pub async fn refresh(&mut self) -> Result<()> {
        let path = ApiPath::endpoint(self.id);
        let response = self.session.get(&path, None).await?;

        if !response.is_status(200) {
            return Err(ApiError::from_response(path, &response).into());
        }

        let payload: EnvironmentPayload = response.parse()?;
        self.apply_payload(payload);
        Ok(())
    }

    /// Copy the environment fields and merge the container snapshot.
    ///
    /// Containers are upserted by name: known names are updated in place so
    /// outstanding handles observe the change, unseen names get a new handle,
    /// and names missing from the snapshot are dropped from the map. A payload
    /// without a Docker snapshot leaves the container map untouched.
    pub(crate) fn apply_payload(&mut self, payload: EnvironmentPayload) {
        if let Some(containers) = payload.snapshot_containers() {
            let mut seen = HashSet::with_capacity(containers.len());

            for record in containers {
                let Some(name) = record.name() else {
                    warn!("Skipping container {} without a name in environment {}", record.id, payload.id);
                    continue;
                };

                match self.containers.get(&name) {
                    Some(existing) => existing.apply_payload(record),
                    None => {
                        debug!("New container {} in environment {}", name, payload.id);
                        let container = Container::from_payload(
                            Arc::clone(&self.session),
                            payload.id,
                            name.clone(),
                            record,
                        );
                        self.containers.insert(name.clone(), Arc::new(container));
                    }
                }
                seen.insert(name);
            }

            self.containers.retain(|name, _| {
                let keep = seen.contains(name);
                if !keep {
                    debug!("Container {} no longer reported in environment {}", name, payload.id);
                }
                keep
            });
        } else {
            debug!("Environment {} has no Docker snapshot", payload.id);
        }

        self.id = payload.id;
        self.name = payload.name;
        self.environment_type = payload.environment_type;
        self.url = payload.url;
        self.group_id = payload.group_id;
        self.public_url = payload.public_url;
        self.status = payload.status;
        self.status_message = payload.status_message;
        self.query_date = payload.query_date;
    }

    pub fn id(&self) -> EnvironmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment_type(&self) -> EnvironmentType {
        self.environment_type
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    pub fn status(&self) -> EnvironmentStatus {
        self.status
    }

    pub fn status_message(&self) -> Option<&StatusMessage> {
        self.status_message.as_ref()
    }

    /// Unix timestamp of the server's last query of this environment
    pub fn query_date(&self) -> Option<i64> {
        self.query_date
    }

    pub fn containers(&self) -> &BTreeMap<String, Arc<Container>> {
        &self.containers
    }

    pub fn container(&self, name: &str) -> Option<Arc<Container>> {
        self.containers.get(name).cloned()
    }

    pub fn container_names(&self) -> Vec<&str> {
        self.containers.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.environment_type)
            .field("status", &self.status)
            .field("containers", &self.container_names())
            .finish()
    }
}
