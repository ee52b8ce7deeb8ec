//! The signed-in session.

use std::sync::Arc;

use grocer_auth::{Identity, LoginCredentials, TokenStore};
use tokio::sync::watch;

use crate::backend::AuthBackend;
use crate::error::ClientError;

/// Owns the current identity.
///
/// The identity is restored from the [`TokenStore`] once, at construction,
/// and afterwards only changes through [`login`](Self::login),
/// [`logout`](Self::logout), [`force_logout`](Self::force_logout) and
/// [`apply_refreshed_token`](Self::apply_refreshed_token). Every change is
/// mirrored to the store and broadcast through [`subscribe`](Self::subscribe).
pub struct SessionManager {
    store: TokenStore,
    backend: Arc<dyn AuthBackend>,
    identity: watch::Sender<Option<Identity>>,
}

impl SessionManager {
    /// Create a session manager, restoring any persisted identity.
    pub fn new(store: TokenStore, backend: Arc<dyn AuthBackend>) -> Self {
        let restored = store.load();
        match &restored {
            Some(identity) => tracing::info!(
                username = %identity.username,
                role = %identity.role,
                "restored persisted session"
            ),
            None => tracing::debug!("no persisted session"),
        }
        let (identity, _) = watch::channel(restored);
        Self {
            store,
            backend,
            identity,
        }
    }

    /// Sign in.
    ///
    /// On success the new identity is persisted and becomes current before
    /// this returns. On failure the previous identity is left as it was.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Identity, ClientError> {
        let identity = match self.backend.login(credentials).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(identifier = %credentials.identifier, error = %e, "login failed");
                return Err(e);
            }
        };

        self.identity.send_modify(|current| {
            if let Err(e) = self.store.save(&identity) {
                tracing::warn!(error = %e, "failed to persist session, keeping it in memory");
            }
            *current = Some(identity.clone());
        });
        tracing::info!(username = %identity.username, role = %identity.role, "signed in");
        Ok(identity)
    }

    /// Sign out.
    ///
    /// The server is told on a best-effort basis; the local session is
    /// cleared whatever it answers.
    pub async fn logout(&self) {
        if let Err(e) = self.backend.logout(self.token().as_deref()).await {
            tracing::warn!(error = %e, "server logout failed, clearing local session anyway");
        }
        self.clear("logout");
    }

    /// Drop the session without contacting the server.
    pub fn force_logout(&self) {
        self.clear("forced");
    }

    /// Swap the current identity's token for a refreshed one.
    ///
    /// Without a current identity the token is not stored anywhere.
    pub fn apply_refreshed_token(&self, token: &str) {
        let applied = self.identity.send_if_modified(|current| match current {
            Some(identity) => {
                identity.token = token.to_string();
                if let Err(e) = self.store.save(identity) {
                    tracing::warn!(error = %e, "failed to persist refreshed token");
                }
                true
            }
            None => false,
        });
        if !applied {
            tracing::debug!("token refreshed with nobody signed in, not persisting it");
        }
    }

    /// The signed-in identity, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Whether someone is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.identity.borrow().is_some()
    }

    /// Current bearer token.
    pub fn token(&self) -> Option<String> {
        self.identity.borrow().as_ref().map(|i| i.token.clone())
    }

    /// Watch identity changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    /// Backend used for sign-in, refresh and sign-out.
    pub fn backend(&self) -> &Arc<dyn AuthBackend> {
        &self.backend
    }

    /// Persistence layer.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    fn clear(&self, reason: &'static str) {
        self.identity.send_modify(|current| {
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "failed to clear persisted session");
            }
            if let Some(previous) = current.take() {
                tracing::info!(username = %previous.username, reason, "signed out");
            }
        });
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("identity", &*self.identity.borrow())
            .finish_non_exhaustive()
    }
}
