//! Startup hooks.
//!
//! A [`Bootstrap`] runs once per process after the middleware registry is
//! loaded and before the first request. Bootstraps are looked up by name
//! in a [`BootstrapCatalog`] and run in declared order. Values they store
//! in the [`HostHandle`] are copied into every request context.

use std::collections::HashMap;
use std::sync::Arc;

use http::Extensions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::{TesseraError, TesseraResult};

/// A startup hook.
pub trait Bootstrap: Send + Sync + 'static {
    /// Runs the hook. `host` is absent when running outside a server, e.g.
    /// from a maintenance command.
    ///
    /// # Errors
    ///
    /// Any error aborts startup.
    fn start(&self, host: Option<&mut HostHandle>) -> TesseraResult<()>;
}

/// Typed values shared from startup into every request.
#[derive(Debug, Clone, Default)]
pub struct HostHandle {
    extensions: Extensions,
}

impl HostHandle {
    /// Creates an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, replacing any previous value of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.extensions.insert(value)
    }

    /// Returns the stored value of type `T`.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Consumes the handle, returning the map.
    #[must_use]
    pub fn into_extensions(self) -> Extensions {
        self.extensions
    }
}

/// Bootstraps available by name.
#[derive(Clone, Default)]
pub struct BootstrapCatalog {
    entries: HashMap<String, Arc<dyn Bootstrap>>,
}

impl BootstrapCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bootstrap` under `name`.
    pub fn register(&mut self, name: impl Into<String>, bootstrap: impl Bootstrap) -> &mut Self {
        self.entries.insert(name.into(), Arc::new(bootstrap));
        self
    }

    /// Returns the bootstrap named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Bootstrap>> {
        self.entries.get(name)
    }

    /// Returns the number of registered bootstraps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for BootstrapCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("BootstrapCatalog").field("names", &names).finish()
    }
}

/// Runs the bootstraps named in `names`, in order.
///
/// Unknown names are logged and skipped.
///
/// # Errors
///
/// Returns the first error raised by a bootstrap.
pub fn run_bootstraps<S: AsRef<str>>(
    names: &[S],
    catalog: &BootstrapCatalog,
    mut host: Option<&mut HostHandle>,
) -> TesseraResult<()> {
    for name in names {
        let name = name.as_ref();
        let Some(bootstrap) = catalog.get(name) else {
            tracing::warn!(bootstrap = name, "bootstrap not found, skipping");
            continue;
        };
        bootstrap.start(host.as_deref_mut())?;
        tracing::debug!(bootstrap = name, "bootstrap started");
    }
    Ok(())
}

/// Typed session settings.
///
/// Unknown keys are ignored. `handler_config` is taken from
/// `config.<type>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name.
    pub session_name: String,
    /// Storage handler name.
    pub handler: String,
    /// Which entry of `config` the handler uses.
    #[serde(rename = "type")]
    pub handler_type: String,
    /// Refresh the timestamp on every read.
    pub auto_update_timestamp: bool,
    /// Cookie lifetime in seconds.
    pub cookie_lifetime: u64,
    /// Garbage collection odds as `[numerator, denominator]`.
    pub gc_probability: [u32; 2],
    /// Cookie path.
    pub cookie_path: String,
    /// `HttpOnly` cookie flag.
    pub http_only: bool,
    /// `SameSite` cookie attribute, empty to omit.
    pub same_site: String,
    /// Session lifetime in seconds.
    pub lifetime: u64,
    /// Cookie domain, empty for the request host.
    pub domain: String,
    /// `Secure` cookie flag.
    pub secure: bool,
    /// Settings of the selected handler.
    #[serde(skip)]
    pub handler_config: Value,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_name: "TESSERASID".to_string(),
            handler: "file".to_string(),
            handler_type: "file".to_string(),
            auto_update_timestamp: false,
            cookie_lifetime: 365 * 24 * 3600,
            gc_probability: [1, 1000],
            cookie_path: "/".to_string(),
            http_only: true,
            same_site: String::new(),
            lifetime: 7 * 24 * 3600,
            domain: String::new(),
            secure: false,
            handler_config: Value::Null,
        }
    }
}

impl SessionConfig {
    /// Builds the settings from the raw `session` table.
    ///
    /// # Errors
    ///
    /// Returns a config error when a known key has the wrong type.
    pub fn from_map(map: &IndexMap<String, Value>) -> TesseraResult<Self> {
        let raw = Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        let mut config: Self = serde_json::from_value(raw)
            .map_err(|e| TesseraError::config(format!("invalid session config: {e}")))?;
        config.handler_config = map
            .get("config")
            .and_then(|handlers| handlers.get(&config.handler_type))
            .cloned()
            .unwrap_or(Value::Null);
        Ok(config)
    }
}

/// Publishes [`SessionConfig`] to the host.
#[derive(Debug, Clone)]
pub struct SessionBootstrap {
    config: SessionConfig,
}

impl SessionBootstrap {
    /// Creates the bootstrap.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

impl Bootstrap for SessionBootstrap {
    fn start(&self, host: Option<&mut HostHandle>) -> TesseraResult<()> {
        if let Some(host) = host {
            host.insert(self.config.clone());
            tracing::debug!(
                session_name = %self.config.session_name,
                handler = %self.config.handler,
                "session configured"
            );
        }
        Ok(())
    }
}
