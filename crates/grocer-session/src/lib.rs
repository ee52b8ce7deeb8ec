//! Session core for the Grocer admin dashboard.
//!
//! - [`SessionManager`] owns the signed-in identity and mirrors it to a
//!   [`TokenStore`](grocer_auth::TokenStore).
//! - [`ApiClient`] attaches credentials to outbound requests and recovers
//!   from an expired token with one refresh and one retry.
//! - [`RefreshCoordinator`] makes sure concurrent expiries share a single
//!   refresh call.
//! - [`Navigator`] re-checks the current location against the
//!   [`RouteGuard`](grocer_auth::RouteGuard) whenever the location or the
//!   identity changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use grocer_auth::LoginCredentials;
//! use grocer_session::{ClientConfig, SessionStack};
//!
//! let stack = SessionStack::from_config(&ClientConfig::default())?;
//! stack.session.login(&LoginCredentials::new("ana@grocer.example", "secret")).await?;
//! let orders: serde_json::Value = stack.api.get_json("/orders").await?;
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod manager;
pub mod navigator;
pub mod scope;

use std::sync::Arc;

use grocer_auth::{RouteTable, TokenStore};
use grocer_data::HttpTransport;

pub use backend::{AuthBackend, HttpAuthBackend, LoginResponse, RefreshResponse};
pub use client::ApiClient;
pub use config::{
    ClientConfig, CsrfConfig, EndpointConfig, RoutesConfig, StorageBackend, StorageConfig,
};
pub use coordinator::RefreshCoordinator;
pub use error::{ClientError, ConfigError};
pub use manager::SessionManager;
pub use navigator::{Navigation, Navigator};
pub use scope::ViewScope;

/// Every session component wired together over HTTP.
#[derive(Debug)]
pub struct SessionStack {
    /// HTTP transport with the backend's cookie jar.
    pub transport: Arc<HttpTransport>,
    /// The signed-in session.
    pub session: Arc<SessionManager>,
    /// Authenticated API client.
    pub api: ApiClient,
    /// Guarded navigation over the dashboard routes.
    pub navigator: Navigator,
}

impl SessionStack {
    /// Build the stack described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(HttpTransport::new(&config.base_url, &config.timeouts)?);
        let store = TokenStore::new(config.storage.open()?);
        Ok(Self::with_transport(config, transport, store))
    }

    /// Build the stack on an existing transport and store.
    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<HttpTransport>,
        store: TokenStore,
    ) -> Self {
        let backend = HttpAuthBackend::new(transport.clone())
            .with_endpoints(config.endpoints.clone())
            .with_csrf(config.csrf.clone());
        let session = Arc::new(SessionManager::new(store, Arc::new(backend)));
        let coordinator = Arc::new(RefreshCoordinator::new(session.clone()));
        let api = ApiClient::new(transport.clone(), session.clone(), coordinator).configured(config);
        let navigator = Navigator::new(session.clone(), config.guard(), RouteTable::dashboard());

        Self {
            transport,
            session,
            api,
            navigator,
        }
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        ApiClient, AuthBackend, ClientConfig, ClientError, Navigation, Navigator,
        RefreshCoordinator, SessionManager, SessionStack, ViewScope,
    };
}
