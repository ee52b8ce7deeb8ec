//! Authenticated API client.

use std::sync::Arc;

use grocer_data::{ApiRequest, Response, Transport};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::attach_csrf;
use crate::config::{matches_any, ClientConfig, CsrfConfig};
use crate::coordinator::RefreshCoordinator;
use crate::error::ClientError;
use crate::manager::SessionManager;

/// Sends API requests on behalf of the current session.
///
/// Non-public requests carry the session's bearer token. Every request
/// carries the anti-forgery header when its cookie is set. A 401 on a
/// non-public request triggers one refresh through the
/// [`RefreshCoordinator`] and one retry with the new token; whatever the
/// retry returns is final.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
    coordinator: Arc<RefreshCoordinator>,
    public_paths: Vec<String>,
    csrf: CsrfConfig,
}

impl ApiClient {
    /// Create a client with the default public paths and anti-forgery names.
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<SessionManager>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        let defaults = ClientConfig::default();
        Self {
            transport,
            session,
            coordinator,
            public_paths: defaults.public_paths,
            csrf: defaults.csrf,
        }
    }

    /// Take public paths and anti-forgery names from a config.
    pub fn configured(mut self, config: &ClientConfig) -> Self {
        self.public_paths = config.public_paths.clone();
        self.csrf = config.csrf.clone();
        self
    }

    /// Replace the public path list.
    pub fn with_public_paths(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.public_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// The session this client authenticates as.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// The refresh coordinator.
    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Whether a request goes out without credentials.
    pub fn is_public(&self, request: &ApiRequest) -> bool {
        request.is_public() || matches_any(&self.public_paths, request.path())
    }

    /// Send a request.
    ///
    /// Non-2xx responses become [`ClientError::Fetch`] carrying the status
    /// and the backend's message, except that a 401 on a non-public request
    /// is first answered with a refresh and a single retry.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ClientError> {
        let public = self.is_public(&request);
        let sent_token = if public { None } else { self.session.token() };

        let response = self
            .transport
            .send(self.prepare(request.clone(), sent_token.as_deref()))
            .await?;
        if public || !response.is_unauthorized() {
            return Ok(response.error_for_status()?);
        }

        // Someone else may already have refreshed, or given up, since this
        // request left.
        let current = self.session.token();
        let token = match current {
            Some(current) if sent_token.as_deref() != Some(current.as_str()) => {
                tracing::debug!(path = request.route(), "401 with a stale token, retrying");
                current
            }
            None if sent_token.is_some() => {
                tracing::debug!(path = request.route(), "401 after the session ended");
                return Ok(response.error_for_status()?);
            }
            _ => {
                tracing::debug!(path = request.route(), "401, refreshing token");
                self.coordinator.refresh().await?
            }
        };

        let retried = self
            .transport
            .send(self.prepare(request, Some(&token)))
            .await?;
        Ok(retried.error_for_status()?)
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        Ok(self.send(ApiRequest::get(path)).await?.json()?)
    }

    /// POST a JSON body to `path` and decode the JSON answer.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        Ok(self.send(ApiRequest::post(path).json(body)?).await?.json()?)
    }

    /// DELETE `path`, discarding the body.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(ApiRequest::delete(path)).await?;
        Ok(())
    }

    fn prepare(&self, mut request: ApiRequest, token: Option<&str>) -> ApiRequest {
        match token {
            Some(token) => request.set_bearer(token),
            None => request.remove_header("authorization"),
        }
        attach_csrf(request, self.transport.as_ref(), &self.csrf)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("public_paths", &self.public_paths)
            .field("csrf", &self.csrf)
            .finish_non_exhaustive()
    }
}
