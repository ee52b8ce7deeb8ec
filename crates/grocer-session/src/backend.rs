//! Authentication endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use grocer_auth::{Identity, LoginCredentials, Profile, Role};
use grocer_data::{ApiRequest, FetchError, Response, Transport};
use serde::Deserialize;

use crate::config::{CsrfConfig, EndpointConfig};
use crate::error::ClientError;

/// The backend's authentication surface.
///
/// Separated from [`Transport`] so session logic can be exercised without
/// HTTP at all.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for an identity.
    async fn login(&self, credentials: &LoginCredentials) -> Result<Identity, ClientError>;

    /// Obtain a fresh token using the ambient session cookie.
    async fn refresh(&self) -> Result<String, FetchError>;

    /// Tear down the server-side session.
    async fn logout(&self, token: Option<&str>) -> Result<(), FetchError>;
}

/// Successful login payload.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    pub username: String,
    #[serde(default)]
    pub profile: Option<serde_json::Value>,
}

impl LoginResponse {
    /// Build the identity this payload describes.
    ///
    /// An unknown role is an error. A missing or malformed profile becomes
    /// [`Profile::placeholder`].
    pub fn into_identity(self) -> Result<Identity, ClientError> {
        if self.token.is_empty() {
            return Err(ClientError::InvalidResponse("empty token".to_string()));
        }
        let role: Role = self.role.parse()?;
        let profile = match self.profile {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "login profile is malformed, using placeholder");
                Profile::placeholder()
            }),
            None => Profile::placeholder(),
        };
        Ok(Identity::new(self.token, role, self.username, profile))
    }
}

/// Successful refresh payload.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// [`AuthBackend`] speaking the dashboard's REST API.
pub struct HttpAuthBackend {
    transport: Arc<dyn Transport>,
    endpoints: EndpointConfig,
    csrf: CsrfConfig,
}

impl HttpAuthBackend {
    /// Create a backend with the default endpoints.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            endpoints: EndpointConfig::default(),
            csrf: CsrfConfig::default(),
        }
    }

    /// Use custom endpoint paths.
    pub fn with_endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Use custom anti-forgery names.
    pub fn with_csrf(mut self, csrf: CsrfConfig) -> Self {
        self.csrf = csrf;
        self
    }

    async fn post(&self, request: ApiRequest) -> Result<Response, FetchError> {
        let request = attach_csrf(request, self.transport.as_ref(), &self.csrf);
        self.transport.send(request).await
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> Result<Identity, ClientError> {
        let request = ApiRequest::post(self.endpoints.login.as_str())
            .public()
            .json(credentials)?;
        let response = self.post(request).await?;

        if response.is_client_error() {
            return Err(ClientError::CredentialsRejected {
                status: response.status,
                message: response.error_message(),
            });
        }
        let payload: LoginResponse = response
            .error_for_status()?
            .json()
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        payload.into_identity()
    }

    async fn refresh(&self) -> Result<String, FetchError> {
        let response = self
            .post(ApiRequest::post(self.endpoints.refresh.as_str()))
            .await?
            .error_for_status()?;
        let payload: RefreshResponse = response.json()?;
        if payload.token.is_empty() {
            return Err(FetchError::ParseError("refresh returned an empty token".to_string()));
        }
        Ok(payload.token)
    }

    async fn logout(&self, token: Option<&str>) -> Result<(), FetchError> {
        let mut request = ApiRequest::post(self.endpoints.logout.as_str());
        if let Some(token) = token {
            request.set_bearer(token);
        }
        self.post(request).await?.error_for_status()?;
        Ok(())
    }
}

impl std::fmt::Debug for HttpAuthBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthBackend")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// Echo the anti-forgery cookie into its header, if the cookie is set.
pub(crate) fn attach_csrf(
    mut request: ApiRequest,
    transport: &dyn Transport,
    csrf: &CsrfConfig,
) -> ApiRequest {
    if let Some(value) = transport.cookie(&csrf.cookie_name) {
        request.set_header(&csrf.header_name, value);
    }
    request
}
