//! Configuration schema types.
//!
//! Every section falls back to its defaults when absent. Middleware and
//! session tables stay raw so their consumers decide what is malformed.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::ErrorCategory;
use tessera_telemetry::{LogConfig, MetricsConfig};

/// Raw middleware table: descriptor → list of middleware names.
pub type MiddlewareTable = IndexMap<String, Value>;

/// Application section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Show error details to clients.
    pub debug: bool,

    /// Directory served as static files and searched for `404.html`.
    pub public_path: PathBuf,

    /// Root of the host application's views.
    pub view_path: PathBuf,

    /// Largest accepted request body in bytes.
    pub max_body_size: usize,

    /// Largest accepted uploaded file in bytes.
    pub max_file_size: usize,

    /// Maximum number of multipart parts per request.
    pub max_fields: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            public_path: PathBuf::from("public"),
            view_path: PathBuf::from("app"),
            max_body_size: 10 * 1024 * 1024,
            max_file_size: 10 * 1024 * 1024,
            max_fields: 100,
        }
    }
}

/// HTTP listener section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (e.g. "0.0.0.0:8787").
    pub listen: String,

    /// Seconds to wait for open connections after a shutdown signal.
    pub graceful_shutdown_timeout_secs: u64,

    /// Enable HTTP/1.1 keep-alive.
    pub keep_alive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8787".to_string(),
            graceful_shutdown_timeout_secs: 2,
            keep_alive: true,
        }
    }
}

/// Static file serving for the host app or a plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StaticFilesConfig {
    /// Serve files from the public directory.
    pub enable: bool,

    /// Middleware names wrapped around static responses.
    pub middleware: Vec<String>,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enable: true,
            middleware: vec!["static_file".to_string()],
        }
    }
}

/// Exception reporting section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ExceptionConfig {
    /// Error categories never sent to the reporter.
    pub dont_report: Vec<ErrorCategory>,
}

/// Logging section, converted into a [`LogConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    pub enabled: bool,

    /// Base level or filter directives.
    pub level: String,

    /// JSON output instead of pretty output.
    pub json_format: bool,

    /// Include the module path.
    pub include_target: bool,

    /// Include file and line.
    pub include_location: bool,

    /// Include thread IDs.
    pub include_thread_ids: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self::from(&LogConfig::production())
    }
}

impl From<&LogConfig> for LoggingSection {
    fn from(config: &LogConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            json_format: config.json_format,
            include_target: config.include_target,
            include_location: config.include_location,
            include_thread_ids: config.include_thread_ids,
        }
    }
}

impl From<&LoggingSection> for LogConfig {
    fn from(config: &LoggingSection) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            json_format: config.json_format,
            include_target: config.include_target,
            include_location: config.include_location,
            include_thread_ids: config.include_thread_ids,
        }
    }
}

/// Metrics section, converted into a [`MetricsConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSection {
    /// Record request metrics.
    pub enabled: bool,

    /// Scrape listener address; empty disables the listener.
    pub addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        let defaults = MetricsConfig::default();
        Self {
            enabled: defaults.enabled,
            addr: defaults.addr,
        }
    }
}

impl From<&MetricsSection> for MetricsConfig {
    fn from(section: &MetricsSection) -> Self {
        Self {
            enabled: section.enabled,
            addr: section.addr.clone(),
        }
    }
}

/// View section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    /// Template file extension, without the dot.
    pub suffix: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            suffix: "html".to_string(),
        }
    }
}

/// A plugin: a tenant with its own middleware, bootstraps and assets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PluginConfig {
    /// Load this plugin.
    pub enable: bool,

    /// Middleware table; bare descriptors belong to this plugin.
    pub middleware: MiddlewareTable,

    /// Bootstrap names run after the host's.
    pub bootstrap: Vec<String>,

    /// Static serving for `/app/<plugin>/...`.
    pub static_files: StaticFilesConfig,

    /// Public directory, defaults to `plugin/<name>/public`.
    pub public_path: Option<PathBuf>,

    /// View root, defaults to `plugin/<name>/app`.
    pub view_path: Option<PathBuf>,

    /// Sub-projects shipped inside the plugin.
    pub projects: IndexMap<String, ProjectConfig>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enable: true,
            middleware: MiddlewareTable::new(),
            bootstrap: Vec::new(),
            static_files: StaticFilesConfig::default(),
            public_path: None,
            view_path: None,
            projects: IndexMap::new(),
        }
    }
}

/// A project inside a plugin.
///
/// Project middleware tables are loaded in the host scope, so they address
/// plugin apps with `plugin.<name>.<app>` descriptors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Middleware table.
    pub middleware: MiddlewareTable,

    /// Bootstrap names.
    pub bootstrap: Vec<String>,
}
