//! Dashboard sections and their role requirements.

use serde::{Deserialize, Serialize};

use crate::user::Role;

/// A navigable dashboard section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRoute {
    /// Path prefix of the section (e.g. `/products`).
    pub path: String,
    /// Sidebar title.
    pub title: String,
    /// Role allowed to render it, or `None` for any signed-in user.
    #[serde(default)]
    pub requirement: Option<Role>,
}

impl DashboardRoute {
    /// Section open to any signed-in user.
    pub fn open(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            requirement: None,
        }
    }

    /// Section restricted to one role.
    pub fn restricted(path: impl Into<String>, title: impl Into<String>, role: Role) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            requirement: Some(role),
        }
    }

    /// Whether `path` falls inside this section.
    ///
    /// Matches on whole segments, so `/products/42` is inside `/products`
    /// but `/products-archive` is not.
    pub fn contains(&self, path: &str) -> bool {
        let base = self.path.trim_end_matches('/');
        let path = strip_query(path).trim_end_matches('/');
        if base.is_empty() {
            return path.is_empty();
        }
        path == base
            || path
                .strip_prefix(base)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Whether a user with `role` may open this section.
    pub fn allows(&self, role: Role) -> bool {
        self.requirement.map_or(true, |required| required == role)
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Set of dashboard sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<DashboardRoute>,
}

impl RouteTable {
    /// Build a table from a list of sections.
    pub fn new(routes: Vec<DashboardRoute>) -> Self {
        Self { routes }
    }

    /// The grocery admin dashboard.
    pub fn dashboard() -> Self {
        Self::new(vec![
            DashboardRoute::open("/dashboard", "Dashboard"),
            DashboardRoute::restricted("/products", "Products", Role::Admin),
            DashboardRoute::restricted("/categories", "Categories", Role::Admin),
            DashboardRoute::restricted("/prices", "Prices", Role::Admin),
            DashboardRoute::restricted("/sub-admins", "Sub-admins", Role::Admin),
            DashboardRoute::restricted("/memberships", "Memberships", Role::Admin),
            DashboardRoute::restricted("/analytics", "Analytics", Role::Admin),
            DashboardRoute::open("/orders", "Orders"),
            DashboardRoute::open("/customers", "Customers"),
            DashboardRoute::restricted("/deliveries", "Deliveries", Role::SubAdmin),
            DashboardRoute::restricted("/riders", "Riders", Role::SubAdmin),
            DashboardRoute::open("/notifications", "Notifications"),
            DashboardRoute::open("/profile", "Profile"),
        ])
    }

    /// Add a section.
    pub fn with_route(mut self, route: DashboardRoute) -> Self {
        self.routes.push(route);
        self
    }

    /// Find the section containing `path`, preferring the longest match.
    pub fn resolve(&self, path: &str) -> Option<&DashboardRoute> {
        self.routes
            .iter()
            .filter(|route| route.contains(path))
            .max_by_key(|route| route.path.trim_end_matches('/').len())
    }

    /// Sections a user with `role` may open, in definition order.
    pub fn visible_for(&self, role: Role) -> impl Iterator<Item = &DashboardRoute> {
        self.routes.iter().filter(move |route| route.allows(role))
    }

    /// All sections.
    pub fn routes(&self) -> &[DashboardRoute] {
        &self.routes
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::dashboard()
    }
}
