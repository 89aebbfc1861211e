//! The top-level [`TesseraConfig`].

use std::net::SocketAddr;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_telemetry::logging::{create_env_filter, is_known_level};
use tessera_telemetry::{LogConfig, MetricsConfig};

use crate::{
    AppConfig, ConfigError, ExceptionConfig, LoggingSection, MetricsSection, MiddlewareTable,
    PluginConfig, ServerConfig, StaticFilesConfig, ViewConfig,
};

/// Complete configuration of a Tessera worker.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to assemble it from defaults,
/// files and the environment.
///
/// # Example
///
/// ```
/// use tessera_config::TesseraConfig;
///
/// let config = TesseraConfig::default();
/// assert_eq!(config.server.listen, "0.0.0.0:8787");
/// assert_eq!(config.view.suffix, "html");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct TesseraConfig {
    /// Application settings.
    pub app: AppConfig,

    /// Listener settings.
    pub server: ServerConfig,

    /// Host middleware table.
    pub middleware: MiddlewareTable,

    /// Host static file serving.
    pub static_files: StaticFilesConfig,

    /// Host bootstrap names, run in order.
    pub bootstrap: Vec<String>,

    /// Raw session settings.
    pub session: IndexMap<String, Value>,

    /// Exception reporting.
    pub exception: ExceptionConfig,

    /// Logging.
    pub logging: LoggingSection,

    /// Metrics.
    pub metrics: MetricsSection,

    /// Views.
    pub view: ViewConfig,

    /// Plugins by name, in declaration order.
    pub plugin: IndexMap<String, PluginConfig>,
}

impl TesseraConfig {
    /// Debug mode with pretty debug-level logs.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.app.debug = true;
        config.logging = LoggingSection::from(&LogConfig::development());
        config
    }

    /// Generic error pages with JSON info-level logs and metrics.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.app.debug = false;
        config.logging = LoggingSection::from(&LogConfig::production());
        config.metrics.enabled = true;
        config
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `server.listen` is not a socket address
    /// - `logging.level` is neither a known level nor a valid filter
    /// - `metrics.addr` is set but not a socket address while enabled
    /// - `app.max_body_size` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.listen",
                format!("invalid socket address: {}", self.server.listen),
            ));
        }

        let level = self.logging.level.as_str();
        let level_ok = if level.contains('=') || level.contains(',') {
            create_env_filter(level).is_ok()
        } else {
            is_known_level(level)
        };
        if !level_ok {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown log level: {level}"),
            ));
        }

        if self.metrics.enabled
            && !self.metrics.addr.is_empty()
            && self.metrics.addr.parse::<SocketAddr>().is_err()
        {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        if self.app.max_body_size == 0 {
            return Err(ConfigError::invalid_value(
                "app.max_body_size",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Logging settings for `tessera-telemetry`.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig::from(&self.logging)
    }

    /// Metrics settings for `tessera-telemetry`.
    #[must_use]
    pub fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig::from(&self.metrics)
    }

    /// Enabled plugins, in declaration order.
    pub fn enabled_plugins(&self) -> impl Iterator<Item = (&str, &PluginConfig)> {
        self.plugin
            .iter()
            .filter(|(_, plugin)| plugin.enable)
            .map(|(name, plugin)| (name.as_str(), plugin))
    }

    /// Public directory of `plugin`; the host's for `""`.
    #[must_use]
    pub fn public_path(&self, plugin: &str) -> PathBuf {
        if plugin.is_empty() {
            return self.app.public_path.clone();
        }
        self.plugin
            .get(plugin)
            .and_then(|p| p.public_path.clone())
            .unwrap_or_else(|| PathBuf::from("plugin").join(plugin).join("public"))
    }

    /// View root of `plugin`; the host's for `""`.
    #[must_use]
    pub fn view_path(&self, plugin: &str) -> PathBuf {
        if plugin.is_empty() {
            return self.app.view_path.clone();
        }
        self.plugin
            .get(plugin)
            .and_then(|p| p.view_path.clone())
            .unwrap_or_else(|| PathBuf::from("plugin").join(plugin).join("app"))
    }
}
