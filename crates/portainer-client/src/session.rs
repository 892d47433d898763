//! Authenticated session: bearer token ownership and the one-shot re-login on 401

use crate::config::Credentials;
use crate::transport::{query_pairs, HttpRequest, Transport};
use portainer_types::{
    ApiError, ApiResponse, HttpMethod, PortainerError, Result, API_AUTH,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

const STATUS_UNAUTHORIZED: u16 = 401;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    jwt: String,
}

pub struct Session {
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    token: RwLock<Option<String>>,
    // Held for the whole login exchange so concurrent 401s trigger one login
    login_lock: Mutex<()>,
}

impl Session {
    pub fn new(credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            credentials,
            transport,
            token: RwLock::new(None),
            login_lock: Mutex::new(()),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Forget the current token. The next authenticated call fails with
    /// `NotAuthenticated` until `login()` succeeds again.
    pub async fn logout(&self) {
        *self.token.write().await = None;
    }

    /// Authenticate with the stored credentials and replace any previous token
    pub async fn login(&self) -> Result<bool> {
        let _guard = self.login_lock.lock().await;
        self.login_exclusive().await
    }

    async fn login_exclusive(&self) -> Result<bool> {
        debug!("Creating new session for {}", self.credentials.username());

        let params = json!({
            "username": self.credentials.username(),
            "password": self.credentials.password(),
        });
        let response = self
            .dispatch(HttpMethod::Post, API_AUTH, Some(&params), None)
            .await?;

        if !response.is_status(200) {
            return Err(ApiError::from_response(API_AUTH, &response).into());
        }

        let auth: AuthResponse = response.parse()?;
        *self.token.write().await = Some(auth.jwt);
        info!("Logged in to {} as {}", self.credentials.base_url(), self.credentials.username());
        Ok(true)
    }

    /// Re-login after a 401 unless another caller already replaced the token
    /// that was rejected, in which case its new token is reused.
    async fn relogin(&self, rejected: Option<&str>) -> Result<bool> {
        let _guard = self.login_lock.lock().await;

        let current = self.token.read().await.clone();
        if current.is_some() && current.as_deref() != rejected {
            debug!("Token already refreshed by a concurrent login");
            return Ok(true);
        }

        self.login_exclusive().await
    }

    pub async fn get(&self, path: &str, params: Option<Value>) -> Result<ApiResponse> {
        self.request(HttpMethod::Get, path, params).await
    }

    pub async fn post(&self, path: &str, params: Option<Value>) -> Result<ApiResponse> {
        self.request(HttpMethod::Post, path, params).await
    }

    /// Dispatch a request and return its `{status_code, body}` unmodified.
    ///
    /// GET parameters go to the query string, POST parameters to the JSON body.
    /// A 401 on a non-auth path triggers at most one re-login and one retry.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<Value>,
    ) -> Result<ApiResponse> {
        let is_auth = path == API_AUTH;
        let mut may_retry = !is_auth;

        loop {
            let token = self.token.read().await.clone();
            if token.is_none() && !is_auth {
                return Err(PortainerError::NotAuthenticated);
            }

            let response = self
                .dispatch(method, path, params.as_ref(), token.clone())
                .await?;

            if response.status_code == STATUS_UNAUTHORIZED && may_retry {
                warn!("Session expired on {} {}, logging in again", method, path);
                may_retry = false;
                if self.relogin(token.as_deref()).await? {
                    continue;
                }
            }

            return Ok(response);
        }
    }

    async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&Value>,
        bearer_token: Option<String>,
    ) -> Result<ApiResponse> {
        let (query, body) = match method {
            HttpMethod::Get => (query_pairs(params), None),
            HttpMethod::Post => (Vec::new(), params.cloned()),
        };

        let request = HttpRequest {
            method,
            url: self.credentials.url_for(path),
            query,
            body,
            bearer_token,
        };

        debug!("API {} {}", method, path);
        let response = self.transport.execute(request).await?;
        debug!("API {} {} returned {}", method, path, response.status_code);
        Ok(response)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
