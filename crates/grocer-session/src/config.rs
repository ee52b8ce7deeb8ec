//! Client configuration.
//!
//! A config file is TOML unless its name ends in `.json`. Every field has a
//! default, so an empty file (or no file at all) yields a working setup
//! pointed at a local backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use grocer_auth::{RouteGuard, RouteTable, LANDING_PATH, LOGIN_PATH};
use grocer_data::TimeoutConfig;
use grocer_store::{FileStore, KeyValueStore, MemoryStore};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ConfigError};

/// File names searched for, in order, in each directory.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["grocer.toml", ".grocer.toml", "grocer.json"];

/// Environment variable overriding [`ClientConfig::base_url`].
pub const BASE_URL_ENV: &str = "GROCER_BASE_URL";

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL; request paths are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Paths sent without credentials and exempt from refresh-on-401.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,

    /// Authentication endpoint paths.
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Anti-forgery cookie/header names.
    #[serde(default)]
    pub csrf: CsrfConfig,

    /// Where the session is persisted.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Request timeouts, in milliseconds.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Navigation redirect targets.
    #[serde(default)]
    pub routes: RoutesConfig,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_public_paths() -> Vec<String> {
    let endpoints = EndpointConfig::default();
    vec![endpoints.login, endpoints.refresh]
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            public_paths: default_public_paths(),
            endpoints: EndpointConfig::default(),
            csrf: CsrfConfig::default(),
            storage: StorageConfig::default(),
            timeouts: TimeoutConfig::default(),
            routes: RoutesConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = if is_json(path) {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Save config to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        };

        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find a config file in `start` or any of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start.ancestors().find_map(|dir| {
            CONFIG_FILE_NAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Resolve the effective config.
    ///
    /// An explicit path must exist. Otherwise the first discovered file is
    /// used, falling back to defaults. Environment overrides are applied and
    /// the result validated. Returns the file the config came from, if any.
    pub fn resolve(
        explicit: Option<&Path>,
        cwd: &Path,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let source = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(cwd),
        };

        let mut config = match &source {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(path)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok((config, source))
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(%base_url, "base URL overridden from environment");
            self.base_url = base_url.trim().to_string();
        }
    }

    /// Check the config is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::Invalid("base_url is empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https://, got {}",
                base
            )));
        }

        for (name, path) in [
            ("endpoints.login", &self.endpoints.login),
            ("endpoints.refresh", &self.endpoints.refresh),
            ("endpoints.logout", &self.endpoints.logout),
            ("routes.login_path", &self.routes.login_path),
            ("routes.landing_path", &self.routes.landing_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{} must start with '/', got {:?}",
                    name, path
                )));
            }
        }

        if !self.is_public(&self.endpoints.login) {
            return Err(ConfigError::Invalid(format!(
                "login endpoint {} must be listed in public_paths",
                self.endpoints.login
            )));
        }

        if self.csrf.header_name.trim().is_empty() || self.csrf.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "csrf cookie_name and header_name must not be empty".to_string(),
            ));
        }

        if self.timeouts.total < self.timeouts.connect {
            return Err(ConfigError::Invalid(
                "timeouts.total must not be shorter than timeouts.connect".to_string(),
            ));
        }

        self.validate_routes(&RouteTable::dashboard())
    }

    /// Check the redirect targets against `table`.
    ///
    /// The landing page must be a section every signed-in role can open,
    /// and the sign-in screen must not be claimed by any section.
    pub fn validate_routes(&self, table: &RouteTable) -> Result<(), ConfigError> {
        let landing = &self.routes.landing_path;
        match table.resolve(landing) {
            Some(route) if route.requirement.is_none() => {}
            Some(route) => {
                return Err(ConfigError::Invalid(format!(
                    "routes.landing_path {} is inside {}, which is restricted to {:?}",
                    landing, route.path, route.requirement
                )))
            }
            None => {
                return Err(ConfigError::Invalid(format!(
                    "routes.landing_path {} is not a dashboard section",
                    landing
                )))
            }
        }

        let login = &self.routes.login_path;
        if let Some(route) = table.resolve(login) {
            return Err(ConfigError::Invalid(format!(
                "routes.login_path {} is inside dashboard section {}",
                login, route.path
            )));
        }
        if login == landing {
            return Err(ConfigError::Invalid(
                "routes.login_path and routes.landing_path must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether `path` is covered by [`public_paths`](Self::public_paths).
    pub fn is_public(&self, path: &str) -> bool {
        matches_any(&self.public_paths, path)
    }

    /// Route guard built from the configured redirect targets.
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(&self.routes.login_path, &self.routes.landing_path)
    }

    /// Commented default config, as written by `grocer config init`.
    pub fn default_toml() -> String {
        let defaults = Self::default();
        format!(
            r#"# Grocer admin client configuration.

# Backend base URL. Overridden by ${env}.
base_url = "{base_url}"

# Requests to these paths carry no bearer token and never trigger a refresh.
public_paths = [{public_paths}]

[endpoints]
login = "{login}"
refresh = "{refresh}"
logout = "{logout}"

[csrf]
cookie_name = "{cookie}"
header_name = "{header}"

[storage]
# "file" keeps the session across runs, "memory" forgets it on exit.
backend = "file"
path = "{storage_path}"

[timeouts]
connect = {connect}
response = {response}
total = {total}

[routes]
login_path = "{login_path}"
landing_path = "{landing_path}"
"#,
            env = BASE_URL_ENV,
            base_url = defaults.base_url,
            public_paths = defaults
                .public_paths
                .iter()
                .map(|p| format!("\"{}\"", p))
                .collect::<Vec<_>>()
                .join(", "),
            login = defaults.endpoints.login,
            refresh = defaults.endpoints.refresh,
            logout = defaults.endpoints.logout,
            cookie = defaults.csrf.cookie_name,
            header = defaults.csrf.header_name,
            storage_path = default_storage_path().display(),
            connect = defaults.timeouts.connect.as_millis(),
            response = defaults.timeouts.response.as_millis(),
            total = defaults.timeouts.total.as_millis(),
            login_path = defaults.routes.login_path,
            landing_path = defaults.routes.landing_path,
        )
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Whether `path` (query ignored) equals one of `prefixes` or sits below it.
pub(crate) fn matches_any(prefixes: &[String], path: &str) -> bool {
    let route = path.split(['?', '#']).next().unwrap_or(path);
    prefixes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        route == prefix
            || route
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Authentication endpoint paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Credential exchange.
    #[serde(default = "default_login")]
    pub login: String,
    /// Cookie-based token refresh.
    #[serde(default = "default_refresh")]
    pub refresh: String,
    /// Server-side session teardown.
    #[serde(default = "default_logout")]
    pub logout: String,
}

fn default_login() -> String {
    "/auth/login".to_string()
}

fn default_refresh() -> String {
    "/auth/refresh".to_string()
}

fn default_logout() -> String {
    "/auth/logout".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            login: default_login(),
            refresh: default_refresh(),
            logout: default_logout(),
        }
    }
}

/// Anti-forgery token names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfConfig {
    /// Cookie the backend sets.
    #[serde(default = "default_csrf_cookie")]
    pub cookie_name: String,
    /// Header the cookie value is echoed in.
    #[serde(default = "default_csrf_header")]
    pub header_name: String,
}

fn default_csrf_cookie() -> String {
    "csrf_token".to_string()
}

fn default_csrf_header() -> String {
    "X-CSRF-Token".to_string()
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_csrf_cookie(),
            header_name: default_csrf_header(),
        }
    }
}

/// Session storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file on disk.
    #[default]
    File,
    /// Process memory only.
    Memory,
}

/// Session storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend kind.
    #[serde(default)]
    pub backend: StorageBackend,
    /// File path for the `file` backend.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".grocer").join("session.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

impl StorageConfig {
    /// Keep the session in memory only.
    pub fn memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            ..Self::default()
        }
    }

    /// Open the configured key-value store.
    pub fn open(&self) -> Result<Arc<dyn KeyValueStore>, ClientError> {
        match self.backend {
            StorageBackend::File => Ok(Arc::new(FileStore::open(&self.path)?)),
            StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

/// Navigation redirect targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Sign-in screen.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Landing page for signed-in users.
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
}

fn default_login_path() -> String {
    LOGIN_PATH.to_string()
}

fn default_landing_path() -> String {
    LANDING_PATH.to_string()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            landing_path: default_landing_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_toml_parses_to_defaults() {
        let config: ClientConfig = toml::from_str(&ClientConfig::default_toml()).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            base_url = "https://api.grocer.example/v1"

            [csrf]
            header_name = "X-XSRF-TOKEN"

            [storage]
            backend = "memory"

            [timeouts]
            connect = 1000
            response = 2000
            total = 4000
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://api.grocer.example/v1");
        assert_eq!(config.csrf.header_name, "X-XSRF-TOKEN");
        assert_eq!(config.csrf.cookie_name, "csrf_token");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.timeouts.total, Duration::from_secs(4));
        assert_eq!(config.endpoints.login, "/auth/login");
    }

    #[test]
    fn test_save_and_load_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::default();
        config.base_url = "https://staging.grocer.example".to_string();

        for name in ["grocer.toml", "grocer.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(ClientConfig::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grocer.toml");
        std::fs::write(&path, "base_url = [").unwrap();
        assert!(matches!(
            ClientConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            ClientConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(ClientConfig::discover(&nested), None);

        std::fs::write(dir.path().join(".grocer.toml"), "").unwrap();
        assert_eq!(
            ClientConfig::discover(&nested),
            Some(dir.path().join(".grocer.toml"))
        );

        std::fs::write(dir.path().join("a").join("grocer.json"), "{}").unwrap();
        assert_eq!(
            ClientConfig::discover(&nested),
            Some(dir.path().join("a").join("grocer.json"))
        );
    }

    #[test]
    fn test_env_override() {
        let mut config = ClientConfig::default();
        config.apply_env(|key| {
            (key == BASE_URL_ENV).then(|| " https://prod.grocer.example ".to_string())
        });
        assert_eq!(config.base_url, "https://prod.grocer.example");

        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.base_url, "https://prod.grocer.example");
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = ClientConfig::default();
        config.base_url = "ftp://grocer.example".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.public_paths.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ClientConfig::default();
        config.endpoints.logout = "auth/logout".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.timeouts.total = Duration::from_millis(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_restricted_landing_page() {
        let mut config = ClientConfig::default();
        config.routes.landing_path = "/products".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.routes.landing_path = "/riders/online".to_string();
        assert!(config.validate().is_err());

        config.routes.landing_path = "/nowhere".to_string();
        assert!(config.validate().is_err());

        config.routes.landing_path = "/orders".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_login_path_inside_a_section() {
        let mut config = ClientConfig::default();
        config.routes.login_path = "/profile/sign-in".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.routes.login_path = "/sign-in".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_public_path_matching() {
        let config = ClientConfig::default();
        assert!(config.is_public("/auth/login"));
        assert!(config.is_public("/auth/login?next=/orders"));
        assert!(!config.is_public("/auth/logout"));
        assert!(!config.is_public("/auth/login-history"));
    }

    #[test]
    fn test_storage_open_memory() {
        let store = StorageConfig::memory().open().unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
