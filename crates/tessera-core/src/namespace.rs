//! Two-level configuration namespaces.

use std::fmt;

/// App name reserved for the bucket applied to every plugin and app.
pub const GLOBAL_APP: &str = "@";

/// App name reserved for the static-asset bucket of a plugin.
pub const STATIC_APP: &str = "__static__";

/// Identifies a configuration scope as `(plugin, app)`.
///
/// - `plugin == ""` is the host application.
/// - `app == ""` is the plugin-wide (cross-controller) scope.
/// - [`NamespaceKey::global`] is the bucket applied to every request. It lives
///   under the host with the reserved app name `"@"`, so it never collides
///   with the host's own app-wide scope `("", "")`.
///
/// # Example
///
/// ```
/// use tessera_core::NamespaceKey;
///
/// let key = NamespaceKey::new("shop", "api");
/// assert_eq!(key.plugin(), "shop");
/// assert_eq!(key.app_global(), NamespaceKey::new("shop", ""));
/// assert!(NamespaceKey::global().is_global());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceKey {
    plugin: String,
    app: String,
}

impl NamespaceKey {
    /// Creates a key for `app` inside `plugin`.
    #[must_use]
    pub fn new(plugin: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            app: app.into(),
        }
    }

    /// Creates a key for `app` inside the host.
    #[must_use]
    pub fn host(app: impl Into<String>) -> Self {
        Self::new("", app)
    }

    /// The global bucket.
    #[must_use]
    pub fn global() -> Self {
        Self::new("", GLOBAL_APP)
    }

    /// The static-asset bucket of `plugin`.
    #[must_use]
    pub fn static_assets(plugin: impl Into<String>) -> Self {
        Self::new(plugin, STATIC_APP)
    }

    /// Returns the plugin-wide key for this key's plugin.
    #[must_use]
    pub fn app_global(&self) -> Self {
        Self::new(self.plugin.clone(), "")
    }

    /// Returns the plugin name.
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Returns the app name.
    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Returns `true` for the global bucket.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.plugin.is_empty() && self.app == GLOBAL_APP
    }

    /// Returns `true` for a plugin-wide key.
    #[must_use]
    pub fn is_app_global(&self) -> bool {
        self.app.is_empty()
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() {
            f.write_str("@")
        } else if self.plugin.is_empty() {
            write!(f, "{}", self.app)
        } else if self.app.is_empty() {
            write!(f, "plugin.{}", self.plugin)
        } else {
            write!(f, "plugin.{}.{}", self.plugin, self.app)
        }
    }
}
