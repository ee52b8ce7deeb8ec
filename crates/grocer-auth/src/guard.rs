//! Role-gated rendering decisions.

use serde::{Deserialize, Serialize};

use crate::user::{Identity, Role};

/// Default sign-in screen.
pub const LOGIN_PATH: &str = "/login";

/// Default landing page for signed-in users.
pub const LANDING_PATH: &str = "/dashboard";

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardDecision {
    /// The subtree may render.
    Render,
    /// Nobody is signed in; send the user to the sign-in screen.
    RedirectToLogin,
    /// Signed in but not allowed here; send the user to the landing page.
    RedirectToLanding,
}

impl GuardDecision {
    /// Whether the subtree renders.
    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render)
    }
}

/// Decide whether a subtree with `requirement` renders for `identity`.
pub fn evaluate(identity: Option<&Identity>, requirement: Option<Role>) -> GuardDecision {
    match (identity, requirement) {
        (None, _) => GuardDecision::RedirectToLogin,
        (Some(_), None) => GuardDecision::Render,
        (Some(identity), Some(required)) if identity.role == required => GuardDecision::Render,
        (Some(_), Some(_)) => GuardDecision::RedirectToLanding,
    }
}

/// Route guard carrying the redirect destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteGuard {
    /// Sign-in screen path.
    pub login_path: String,
    /// Landing page path.
    pub landing_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(LOGIN_PATH, LANDING_PATH)
    }
}

impl RouteGuard {
    /// Create a guard with custom redirect destinations.
    pub fn new(login_path: impl Into<String>, landing_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            landing_path: landing_path.into(),
        }
    }

    /// Check a subtree; see [`evaluate`].
    pub fn check(&self, identity: Option<&Identity>, requirement: Option<Role>) -> GuardDecision {
        evaluate(identity, requirement)
    }

    /// Path to navigate to for a decision, or `None` when it renders.
    pub fn redirect_target(&self, decision: GuardDecision) -> Option<&str> {
        match decision {
            GuardDecision::Render => None,
            GuardDecision::RedirectToLogin => Some(&self.login_path),
            GuardDecision::RedirectToLanding => Some(&self.landing_path),
        }
    }
}
