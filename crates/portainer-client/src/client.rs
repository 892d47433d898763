//! Client entry point

use crate::config::{ClientConfig, ConfigError, Credentials};
use crate::environment::Environment;
use crate::session::Session;
use crate::transport::{ReqwestTransport, Transport};
use portainer_types::{
    ApiError, ApiPath, ApiResponse, EnvironmentFilter, EnvironmentId, EnvironmentPayload,
    HttpMethod, Result, API_ENDPOINTS,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Portainer API client.
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use portainer_client::{ClientConfig, EnvironmentFilter, Portainer};
///
/// let config = ClientConfig::new("192.168.0.100", 9000, "admin", "password");
/// let portainer = Portainer::new(&config)?;
/// portainer.login().await?;
///
/// for environment in portainer.load_environments(&EnvironmentFilter::default()).await? {
///     for (name, container) in environment.containers() {
///         println!("{} {}", name, container.state());
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Portainer {
    session: Arc<Session>,
}

impl Portainer {
    pub fn new(config: &ClientConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout(), config.accept_invalid_certs)?;
        Ok(Self::with_transport(Credentials::from(config), Arc::new(transport)))
    }

    pub fn with_transport(credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            session: Arc::new(Session::new(credentials, transport)),
        }
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session)
    }

    pub async fn login(&self) -> Result<bool> {
        self.session.login().await
    }

    pub async fn get(&self, path: &str, params: Option<Value>) -> Result<ApiResponse> {
        self.session.request(HttpMethod::Get, path, params).await
    }

    pub async fn post(&self, path: &str, params: Option<Value>) -> Result<ApiResponse> {
        self.session.request(HttpMethod::Post, path, params).await
    }

    /// List environments matching `filter`, each with its container snapshot
    pub async fn load_environments(&self, filter: &EnvironmentFilter) -> Result<Vec<Environment>> {
        let response = self.get(API_ENDPOINTS, filter.to_params()).await?;

        if !response.is_status(200) {
            return Err(ApiError::from_response(API_ENDPOINTS, &response).into());
        }

        let payloads: Vec<EnvironmentPayload> = response.parse()?;
        debug!("Loaded {} environments", payloads.len());

        Ok(payloads
            .into_iter()
            .map(|payload| Environment::from_payload(self.session(), payload))
            .collect())
    }

    /// Same as [`Portainer::load_environments`] with the filter spelled out
    pub async fn get_endpoints(
        &self,
        start: Option<u32>,
        limit: Option<u32>,
        group_ids: Option<Vec<i64>>,
        endpoint_ids: Option<Vec<EnvironmentId>>,
    ) -> Result<Vec<Environment>> {
        let filter = EnvironmentFilter {
            start,
            limit,
            group_ids,
            endpoint_ids,
        };
        self.load_environments(&filter).await
    }

    /// Fetch a single environment by id
    pub async fn environment(&self, id: EnvironmentId) -> Result<Environment> {
        let path = ApiPath::endpoint(id);
        let response = self.get(&path, None).await?;

        if !response.is_status(200) {
            return Err(ApiError::from_response(path, &response).into());
        }

        let payload: EnvironmentPayload = response.parse()?;
        Ok(Environment::from_payload(self.session(), payload))
    }
}
