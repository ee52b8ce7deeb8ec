//! Identity, token persistence and role-gated routing for the Grocer admin client.
//!
//! - [`Identity`] / [`Role`] / [`Profile`] describe who is signed in.
//! - [`TokenStore`] mirrors the identity into durable storage, all or nothing.
//! - [`RouteGuard`] decides whether a dashboard section renders.
//! - [`RouteTable`] lists the dashboard sections and their role requirements.

mod error;
mod guard;
mod routes;
mod token_store;
mod user;

pub use error::AuthError;
pub use guard::{evaluate, GuardDecision, RouteGuard, LANDING_PATH, LOGIN_PATH};
pub use routes::{DashboardRoute, RouteTable};
pub use token_store::{keys, TokenStore};
pub use user::{Identity, LoginCredentials, Profile, ProfileStatus, Role};
