//! Guarded navigation.

use std::sync::{Arc, Mutex, PoisonError};

use grocer_auth::{DashboardRoute, GuardDecision, RouteGuard, RouteTable};
use serde::Serialize;

use crate::manager::SessionManager;

/// Result of navigating somewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Navigation {
    /// The requested page renders.
    Render {
        path: String,
        route: Option<DashboardRoute>,
    },
    /// The user was sent elsewhere.
    Redirect {
        from: String,
        to: String,
        decision: GuardDecision,
    },
}

impl Navigation {
    /// Where the user ends up.
    pub fn location(&self) -> &str {
        match self {
            Navigation::Render { path, .. } => path,
            Navigation::Redirect { to, .. } => to,
        }
    }

    /// Whether the requested page rendered.
    pub fn is_render(&self) -> bool {
        matches!(self, Navigation::Render { .. })
    }
}

/// Tracks the current location and re-checks it against the guard on every
/// navigation and every identity change.
pub struct Navigator {
    session: Arc<SessionManager>,
    guard: RouteGuard,
    routes: RouteTable,
    location: Mutex<String>,
}

impl Navigator {
    /// Create a navigator positioned where the current identity belongs:
    /// the landing page if signed in, the sign-in screen otherwise.
    pub fn new(session: Arc<SessionManager>, guard: RouteGuard, routes: RouteTable) -> Self {
        let start = if session.is_authenticated() {
            guard.landing_path.clone()
        } else {
            guard.login_path.clone()
        };
        Self {
            session,
            guard,
            routes,
            location: Mutex::new(start),
        }
    }

    /// Current location.
    pub fn location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Route table in use.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide what navigating to `path` would do, without moving.
    pub fn resolve(&self, path: &str) -> Navigation {
        let identity = self.session.current_identity();
        let route = path.split(['?', '#']).next().unwrap_or(path);

        if route == self.guard.login_path {
            return if identity.is_some() {
                self.redirect(path, GuardDecision::RedirectToLanding)
            } else {
                Navigation::Render {
                    path: path.to_string(),
                    route: None,
                }
            };
        }

        match self.routes.resolve(path) {
            Some(target) => match self.guard.check(identity.as_ref(), target.requirement) {
                GuardDecision::Render => Navigation::Render {
                    path: path.to_string(),
                    route: Some(target.clone()),
                },
                decision => self.redirect(path, decision),
            },
            None if identity.is_some() => self.redirect(path, GuardDecision::RedirectToLanding),
            None => self.redirect(path, GuardDecision::RedirectToLogin),
        }
    }

    /// Navigate to `path`, following any redirect.
    pub fn navigate(&self, path: &str) -> Navigation {
        let outcome = self.resolve(path);
        match &outcome {
            Navigation::Render { .. } => tracing::debug!(path, "navigated"),
            Navigation::Redirect { to, decision, .. } => {
                tracing::debug!(path, to = %to, ?decision, "navigation redirected")
            }
        }
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) =
            outcome.location().to_string();
        outcome
    }

    /// Re-check the current location against the current identity.
    ///
    /// Returns the redirect when the location is no longer allowed.
    pub fn sync(&self) -> Option<Navigation> {
        let current = self.location();
        match self.navigate(&current) {
            Navigation::Render { .. } => None,
            redirect => Some(redirect),
        }
    }

    /// Re-check the location on every identity change until the session is
    /// dropped.
    pub async fn follow_identity(&self) {
        let mut changes = self.session.subscribe();
        self.sync();
        while changes.changed().await.is_ok() {
            if let Some(redirect) = self.sync() {
                tracing::info!(to = redirect.location(), "identity changed, redirected");
            }
        }
    }

    fn redirect(&self, from: &str, decision: GuardDecision) -> Navigation {
        let to = self
            .guard
            .redirect_target(decision)
            .unwrap_or(&self.guard.landing_path)
            .to_string();
        Navigation::Redirect {
            from: from.to_string(),
            to,
            decision,
        }
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("location", &self.location())
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
