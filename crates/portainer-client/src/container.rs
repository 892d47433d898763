//! Container handles and per-container control operations

use crate::session::Session;
use portainer_types::{
    ApiError, ApiPath, ContainerAction, ContainerPayload, ContainerState, ContainerStats,
    EnvironmentId, ImageStatusResponse, RecreateRequest, RecreateResponse, Result,
    StatsSummary,
};
use serde_json::{json, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

const STATUS_NO_CONTENT: u16 = 204;

/// Last known server-side view of a container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerDetails {
    pub container_id: String,
    pub image: String,
    pub image_id: String,
    pub state: ContainerState,
    pub status: String,
    pub created: i64,
    pub stats: Option<Value>,
    pub image_status: Option<String>,
}

/// A container inside an environment, keyed by its name.
///
/// Handles are shared (`Arc<Container>`) and stay valid across environment
/// refreshes; the server id changes after a recreate, the name never does.
pub struct Container {
    name: String,
    environment_id: EnvironmentId,
    session: Arc<Session>,
    details: RwLock<ContainerDetails>,
}

impl Container {
    pub(crate) fn from_payload(
        session: Arc<Session>,
        environment_id: EnvironmentId,
        name: String,
        payload: &ContainerPayload,
    ) -> Self {
        let container = Self {
            name,
            environment_id,
            session,
            details: RwLock::new(ContainerDetails::default()),
        };
        container.apply_payload(payload);
        container
    }

    /// Overwrite the snapshot fields. Stats and image status are kept.
    pub(crate) fn apply_payload(&self, payload: &ContainerPayload) {
        let mut details = self.details.write().unwrap_or_else(PoisonError::into_inner);
        details.container_id = payload.id.clone();
        details.image = payload.image.clone();
        details.image_id = payload.image_id.clone();
        details.state = payload.state.clone();
        details.status = payload.status.clone();
        details.created = payload.created;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.environment_id
    }

    /// Copy of the current details
    pub fn details(&self) -> ContainerDetails {
        self.details.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn id(&self) -> String {
        self.read(|details| details.container_id.clone())
    }

    pub fn image(&self) -> String {
        self.read(|details| details.image.clone())
    }

    pub fn state(&self) -> ContainerState {
        self.read(|details| details.state.clone())
    }

    pub fn status(&self) -> String {
        self.read(|details| details.status.clone())
    }

    pub fn stats(&self) -> Option<Value> {
        self.read(|details| details.stats.clone())
    }

    pub fn stats_summary(&self) -> Option<StatsSummary> {
        self.stats().map(|raw| ContainerStats::new(raw).summary())
    }

    pub fn image_status(&self) -> Option<String> {
        self.read(|details| details.image_status.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&ContainerDetails) -> T) -> T {
        f(&self.details.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn update(&self, f: impl FnOnce(&mut ContainerDetails)) {
        f(&mut self.details.write().unwrap_or_else(PoisonError::into_inner))
    }

    /// Fetch whether a newer image is available, store and return it
    pub async fn get_image_status(&self) -> Result<String> {
        let path = ApiPath::image_status(self.environment_id, &self.id());
        let response = self.session.get(&path, None).await?;

        if !response.is_status(200) {
            return Err(ApiError::from_response(path, &response).into());
        }

        let image_status: ImageStatusResponse = response.parse()?;
        debug!("Image status for {}: {}", self.name, image_status.status);
        self.update(|details| details.image_status = Some(image_status.status.clone()));
        Ok(image_status.status)
    }

    /// Fetch a point-in-time stats snapshot, store it and return it unmodified
    pub async fn get_stats(&self) -> Result<Value> {
        let path = ApiPath::container_action(self.environment_id, &self.id(), ContainerAction::Stats);
        let response = self
            .session
            .get(&path, Some(json!({"stream": false})))
            .await?;

        if !response.is_status(200) {
            return Err(ApiError::from_response(path, &response).into());
        }

        let stats = response.into_json()?;
        self.update(|details| details.stats = Some(stats.clone()));
        Ok(stats)
    }

    /// Recreate the container, optionally pulling its image first.
    ///
    /// Updates the id and state from the response and returns the full body.
    pub async fn recreate(&self, pull_image: bool) -> Result<Value> {
        let path = ApiPath::recreate(self.environment_id, &self.id());
        let request = serde_json::to_value(RecreateRequest { pull_image })?;
        let response = self.session.post(&path, Some(request)).await?;

        if !response.is_status(200) {
            return Err(ApiError::from_response(path, &response).into());
        }

        let recreated: RecreateResponse = response.parse()?;
        info!(
            "Recreated container {} ({} -> {})",
            self.name,
            self.id(),
            recreated.id
        );
        self.update(|details| {
            details.container_id = recreated.id.clone();
            details.state = recreated.state.status.clone();
            details.status = recreated.state.status.to_string();
        });
        Ok(response.into_json()?)
    }

    pub async fn stop(&self) -> Result<()> {
        self.lifecycle(ContainerAction::Stop).await
    }

    pub async fn start(&self) -> Result<()> {
        self.lifecycle(ContainerAction::Start).await
    }

    pub async fn restart(&self) -> Result<()> {
        self.lifecycle(ContainerAction::Restart).await
    }

    // Only 204 counts as success; error bodies here may lack `details`
    async fn lifecycle(&self, action: ContainerAction) -> Result<()> {
        let path = ApiPath::container_action(self.environment_id, &self.id(), action);
        let response = self.session.post(&path, None).await?;

        if response.status_code != STATUS_NO_CONTENT {
            return Err(ApiError::from_response_message_only(path, &response).into());
        }

        info!("Container {} {}", self.name, action);
        Ok(())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("environment_id", &self.environment_id)
            .field("details", &self.details())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::transport::{HttpRequest, MockTransport};
    use portainer_types::{ApiResponse, HttpMethod, PortainerError};

    fn payload(id: &str, name: &str) -> ContainerPayload {
        serde_json::from_value(json!({
            "Id": id,
            "Names": [format!("/{}", name)],
            "Image": "nginx:latest",
            "ImageID": "sha256:aaa",
            "State": "running",
            "Status": "Up 5 minutes",
            "Created": 1700000000
        }))
        .unwrap()
    }

    /// Session with a token already in place; the first call is the login.
    async fn logged_in(mut transport: MockTransport) -> Arc<Session> {
        transport
            .expect_execute()
            .withf(|request: &HttpRequest| request.url.ends_with("/api/auth"))
            .times(1)
            .returning(|_| Ok(ApiResponse::json(200, json!({"jwt": "t"}))));
        let session = Arc::new(Session::new(
            Credentials::new("admin", "pw", "http://portainer:9000/api"),
            Arc::new(transport),
        ));
        session.login().await.unwrap();
        session
    }

    fn expect_call(
        transport: &mut MockTransport,
        method: HttpMethod,
        suffix: &'static str,
        response: ApiResponse,
    ) {
        transport
            .expect_execute()
            .withf(move |request: &HttpRequest| request.method == method && request.url.ends_with(suffix))
            .times(1)
            .returning(move |_| Ok(response.clone()));
    }

    #[test]
    fn test_from_payload() {
        let transport = MockTransport::new();
        let session = Arc::new(Session::new(
            Credentials::new("admin", "pw", "http://portainer:9000/api"),
            Arc::new(transport),
        ));
        let container = Container::from_payload(session, 1, "web".to_string(), &payload("abc", "web"));

        assert_eq!(container.name(), "web");
        assert_eq!(container.id(), "abc");
        assert_eq!(container.state(), ContainerState::Running);
        assert_eq!(container.status(), "Up 5 minutes");
        assert_eq!(container.details().created, 1700000000);
        assert!(container.stats().is_none());
    }

    #[tokio::test]
    async fn test_recreate_updates_id_and_status_but_not_name() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request: &HttpRequest| {
                request.url.ends_with("/api/docker/1/containers/abc/recreate")
                    && request.body == Some(json!({"PullImage": true}))
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::json(200, json!({"Id": "xyz", "State": {"Status": "running"}}))));
        let session = logged_in(transport).await;

        let container = Container::from_payload(session, 1, "web".to_string(), &payload("abc", "web"));
        let body = container.recreate(true).await.unwrap();

        assert_eq!(body, json!({"Id": "xyz", "State": {"Status": "running"}}));
        assert_eq!(container.id(), "xyz");
        assert_eq!(container.status(), "running");
        assert_eq!(container.state(), ContainerState::Running);
        assert_eq!(container.name(), "web");
    }

    #[tokio::test]
    async fn test_recreate_without_pull() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request: &HttpRequest| request.body == Some(json!({"PullImage": false})))
            .times(1)
            .returning(|_| Ok(ApiResponse::json(500, json!({"message": "pull failed", "details": "timeout"}))));
        let session = logged_in(transport).await;

        let container = Container::from_payload(session, 1, "web".to_string(), &payload("abc", "web"));
        let err = container.recreate(false).await.unwrap_err();
        match err {
            PortainerError::Api(api) => {
                assert_eq!(api.path, "docker/1/containers/abc/recreate");
                assert_eq!(api.details.as_deref(), Some("timeout"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
        assert_eq!(container.id(), "abc");
    }

    #[tokio::test]
    async fn test_get_stats_returns_and_stores_body() {
        let stats = json!({"memory_stats": {"usage": 10, "limit": 40}, "pids_stats": {"current": 3}});
        let mut transport = MockTransport::new();
        let expected = stats.clone();
        transport
            .expect_execute()
            .withf(|request: &HttpRequest| {
                request.url.ends_with("/api/endpoints/1/docker/containers/abc/stats")
                    && request.query == vec![("stream".to_string(), "false".to_string())]
            })
            .times(1)
            .returning(move |_| Ok(ApiResponse::json(200, expected.clone())));
        let session = logged_in(transport).await;

        let container = Container::from_payload(session, 1, "web".to_string(), &payload("abc", "web"));
        let returned = container.get_stats().await.unwrap();

        assert_eq!(returned, stats);
        assert_eq!(container.stats(), Some(stats));
        assert_eq!(container.stats_summary().unwrap().memory_usage_percent(), 25.0);
    }

    #[tokio::test]
    async fn test_get_image_status() {
        let mut transport = MockTransport::new();
        expect_call(
            &mut transport,
            HttpMethod::Get,
            "/api/docker/1/containers/abc/image_status",
            ApiResponse::json(200, json!({"Status": "outdated", "Message": ""})),
        );
        let session = logged_in(transport).await;

        let container = Container::from_payload(session, 1, "web".to_string(), &payload("abc", "web"));
        assert_eq!(container.get_image_status().await.unwrap(), "outdated");
        assert_eq!(container.image_status().as_deref(), Some("outdated"));
    }

    #[tokio::test]
    async fn test_lifecycle_requires_no_content() {
        let mut transport = MockTransport::new();
        expect_call(
            &mut transport,
            HttpMethod::Post,
            "/api/endpoints/1/docker/containers/abc/stop",
            ApiResponse::empty(204),
        );
        expect_call(
            &mut transport,
            HttpMethod::Post,
            "/api/endpoints/1/docker/containers/abc/start",
            ApiResponse::json(200, json!({})),
        );
        expect_call(
            &mut transport,
            HttpMethod::Post,
            "/api/endpoints/1/docker/containers/abc/restart",
            ApiResponse::json(304, json!({"message": "Container already started", "details": "ignored"})),
        );
        let session = logged_in(transport).await;

        let container = Container::from_payload(session, 1, "web".to_string(), &payload("abc", "web"));
        container.stop().await.unwrap();

        let err = container.start().await.unwrap_err();
        assert_eq!(err.status(), Some(200));

        match container.restart().await.unwrap_err() {
            PortainerError::Api(api) => {
                assert_eq!(api.status, 304);
                assert_eq!(api.message.as_deref(), Some("Container already started"));
                assert_eq!(api.details, None);
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }
}
