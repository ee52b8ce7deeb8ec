//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use grocer_auth::TokenStore;
use grocer_data::HttpTransport;
use grocer_session::{ClientConfig, SessionStack, StorageBackend};

use crate::output::Output;

/// Store key holding the backend's cookies between runs.
const COOKIES_KEY: &str = "grocer.cookies";

/// Execution context for CLI commands.
pub struct Context {
    /// Effective client configuration.
    pub config: ClientConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context, discovering the config file when none is given.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let explicit = config_path.map(|path| resolve_path(&cwd, path));

        let (config, config_path) = ClientConfig::resolve(explicit.as_deref(), &cwd)
            .context("Failed to load configuration")?;
        match &config_path {
            Some(path) => output.debug(&format!("Using config {}", path.display())),
            None => output.debug("No config file found, using defaults"),
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Build the session stack, restoring cookies saved by a previous run.
    pub fn stack(&self) -> Result<SessionStack> {
        let mut config = self.config.clone();
        if config.storage.backend == StorageBackend::File {
            config.storage.path = resolve_path(&self.cwd, &config.storage.path);
        }

        let transport = Arc::new(
            HttpTransport::new(&config.base_url, &config.timeouts)
                .with_context(|| format!("Invalid base URL: {}", config.base_url))?,
        );
        let kv = config.storage.open().with_context(|| {
            format!("Failed to open session store {}", config.storage.path.display())
        })?;

        match kv.get(COOKIES_KEY) {
            Ok(Some(cookies)) => transport.restore_cookies(&cookies),
            Ok(None) => {}
            Err(e) => self.output.warn(&format!("Ignoring saved cookies: {}", e)),
        }

        tracing::debug!(base_url = %config.base_url, storage = ?config.storage.backend, "session stack ready");
        Ok(SessionStack::with_transport(
            &config,
            transport,
            TokenStore::new(kv),
        ))
    }

    /// Save the backend's cookies for the next run.
    pub fn save_cookies(&self, stack: &SessionStack) -> Result<()> {
        let kv = stack.session.store().backend();
        match stack.transport.cookie_header() {
            Some(cookies) if stack.session.is_authenticated() => {
                kv.set(COOKIES_KEY, &cookies).context("Failed to save cookies")
            }
            _ => kv.delete(COOKIES_KEY).context("Failed to clear cookies"),
        }
    }
}

/// Resolve a path relative to the working directory.
fn resolve_path(cwd: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
