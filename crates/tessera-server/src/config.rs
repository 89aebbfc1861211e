//! Transport and dispatch settings.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tessera_server::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .listen("127.0.0.1:8787")
//!     .shutdown_timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(config.listen(), "127.0.0.1:8787");
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tessera_http::BodyLimits;

/// Default bind address.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8787";

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 2;

/// Default request body cap in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Listener settings. Use [`ServerConfig::builder()`] to construct.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    listen: String,
    shutdown_timeout: Duration,
    keep_alive: bool,
    max_body_size: usize,
}

impl ServerConfig {
    /// Creates a builder with default values.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the bind address.
    #[must_use]
    pub fn listen(&self) -> &str {
        &self.listen
    }

    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.listen.parse()
    }

    /// Returns how long shutdown waits for in-flight connections.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns whether HTTP/1.1 keep-alive is on.
    #[must_use]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Returns the request body cap in bytes.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    listen: String,
    shutdown_timeout: Duration,
    keep_alive: bool,
    max_body_size: usize,
}

impl ServerConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            keep_alive: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Sets the bind address.
    #[must_use]
    pub fn listen(mut self, addr: impl Into<String>) -> Self {
        self.listen = addr.into();
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Turns keep-alive on or off.
    #[must_use]
    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = enabled;
        self
    }

    /// Sets the request body cap. Larger bodies get `413`.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            listen: self.listen,
            shutdown_timeout: self.shutdown_timeout,
            keep_alive: self.keep_alive,
            max_body_size: self.max_body_size,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Where static assets live and whether they are served.
#[derive(Debug, Clone)]
pub struct PublicRoot {
    /// Directory holding the assets.
    pub path: PathBuf,
    /// Whether assets under this root are served.
    pub enabled: bool,
}

impl PublicRoot {
    /// Creates an enabled root.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enabled: true,
        }
    }

    /// Sets whether the root is served.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Per-request dispatch settings.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    debug: bool,
    public: PublicRoot,
    plugin_public: HashMap<String, PublicRoot>,
    body_limits: BodyLimits,
    safe_mode: bool,
}

impl DispatcherConfig {
    /// Creates settings serving `public_path` for the host.
    pub fn new(public_path: impl Into<PathBuf>) -> Self {
        Self {
            debug: false,
            public: PublicRoot::new(public_path),
            plugin_public: HashMap::new(),
            body_limits: BodyLimits::new(),
            safe_mode: true,
        }
    }

    /// Shows error details to clients when set.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Turns host static serving on or off.
    #[must_use]
    pub fn static_enabled(mut self, enabled: bool) -> Self {
        self.public.enabled = enabled;
        self
    }

    /// Adds the public root of a plugin.
    #[must_use]
    pub fn plugin_public(mut self, plugin: impl Into<String>, root: PublicRoot) -> Self {
        self.plugin_public.insert(plugin.into(), root);
        self
    }

    /// Sets the body parsing limits.
    #[must_use]
    pub fn body_limits(mut self, limits: BodyLimits) -> Self {
        self.body_limits = limits;
        self
    }

    /// Controls whether forwarded headers from public peers are ignored
    /// when resolving client IPs for reports.
    #[must_use]
    pub fn safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = safe_mode;
        self
    }

    /// Returns the debug flag.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Returns the host public root.
    #[must_use]
    pub fn public(&self) -> &PublicRoot {
        &self.public
    }

    /// Returns the public directory of the host.
    #[must_use]
    pub fn public_path(&self) -> &Path {
        &self.public.path
    }

    /// Returns the public root of `plugin`.
    #[must_use]
    pub fn plugin_root(&self, plugin: &str) -> Option<&PublicRoot> {
        self.plugin_public.get(plugin)
    }

    /// Returns the body parsing limits.
    #[must_use]
    pub fn limits(&self) -> &BodyLimits {
        &self.body_limits
    }

    /// Returns the safe mode flag.
    #[must_use]
    pub fn is_safe_mode(&self) -> bool {
        self.safe_mode
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::new("public")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen(), DEFAULT_LISTEN);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(2));
        assert!(config.keep_alive());
        assert_eq!(config.max_body_size(), DEFAULT_MAX_BODY_SIZE);
    }

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::builder()
            .listen("127.0.0.1:0")
            .keep_alive(false)
            .max_body_size(1024)
            .build();
        assert_eq!(config.socket_addr().unwrap().port(), 0);
        assert!(!config.keep_alive());
        assert_eq!(config.max_body_size(), 1024);
    }

    #[test]
    fn test_invalid_listen() {
        let config = ServerConfig::builder().listen("nowhere").build();
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_dispatcher_config() {
        let config = DispatcherConfig::new("/srv/public")
            .debug(true)
            .plugin_public("shop", PublicRoot::new("/srv/plugin/shop/public").enabled(false));

        assert!(config.is_debug());
        assert!(config.public().enabled);
        assert_eq!(config.public_path(), Path::new("/srv/public"));
        assert!(!config.plugin_root("shop").unwrap().enabled);
        assert!(config.plugin_root("blog").is_none());
    }
}
