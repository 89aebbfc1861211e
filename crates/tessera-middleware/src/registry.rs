//! Namespace-scoped middleware registry.
//!
//! Middleware are declared per namespace in configuration:
//!
//! ```text
//! "@"                → global bucket, every request
//! ""                 → (current plugin, "") app-wide bucket
//! "admin"            → (current plugin, "admin")
//! "plugin.shop"      → ("shop", "")
//! "plugin.shop.api"  → ("shop", "api")
//! ```
//!
//! The builder collects buckets during startup and [`build`] freezes them
//! into a [`MiddlewareRegistry`] shared read-only by the dispatcher.
//!
//! [`build`]: MiddlewareRegistryBuilder::build

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tessera_core::{NamespaceKey, GLOBAL_APP};

use crate::error::RegistryError;
use crate::middleware::Middleware;
use crate::pipeline::{BoxedMiddleware, Pipeline};
use crate::stages::StaticFileMiddleware;

/// Named middleware available to configuration.
///
/// # Example
///
/// ```
/// use tessera_middleware::MiddlewareCatalog;
///
/// let catalog = MiddlewareCatalog::with_defaults();
/// assert!(catalog.get("static_file").is_some());
/// assert!(catalog.get("missing").is_none());
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareCatalog {
    entries: HashMap<String, BoxedMiddleware>,
}

impl MiddlewareCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the built-in middleware.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new().with("static_file", StaticFileMiddleware)
    }

    /// Registers `middleware` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, middleware: impl Middleware) -> &mut Self {
        self.entries.insert(name.into(), Arc::new(middleware));
        self
    }

    /// Registers an already shared middleware under `name`.
    pub fn register_shared(&mut self, name: impl Into<String>, middleware: BoxedMiddleware) -> &mut Self {
        self.entries.insert(name.into(), middleware);
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, middleware: impl Middleware) -> Self {
        self.register(name, middleware);
        self
    }

    /// Looks up a middleware by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedMiddleware> {
        self.entries.get(name)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MiddlewareCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("MiddlewareCatalog")
            .field("entries", &names)
            .finish()
    }
}

/// Maps a configuration descriptor to its namespace key.
///
/// `plugin.<name>` overrides `current_plugin` for this descriptor only.
fn parse_descriptor(descriptor: &str, current_plugin: &str) -> NamespaceKey {
    if descriptor == GLOBAL_APP {
        return NamespaceKey::global();
    }
    let Some(scoped) = descriptor.strip_prefix("plugin.") else {
        return NamespaceKey::new(current_plugin, descriptor);
    };
    let mut parts = scoped.splitn(3, '.');
    let plugin = parts.next().unwrap_or("");
    let app = parts.next().unwrap_or("");
    NamespaceKey::new(plugin, app)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Mutable registry used during startup.
#[derive(Default)]
pub struct MiddlewareRegistryBuilder {
    buckets: IndexMap<NamespaceKey, Vec<BoxedMiddleware>>,
}

impl MiddlewareRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `descriptor → [middleware names]` mapping.
    ///
    /// A `config` that is not a mapping is ignored. A value that is not a
    /// sequence aborts the load. Names missing from `catalog` are skipped
    /// with a warning. Loading the same mapping twice appends twice.
    pub fn load(
        &mut self,
        config: &Value,
        current_plugin: &str,
        catalog: &MiddlewareCatalog,
    ) -> Result<(), RegistryError> {
        let Value::Object(entries) = config else {
            tracing::debug!(kind = value_kind(config), "middleware config is not a mapping, ignoring");
            return Ok(());
        };

        self.load_entries(entries, current_plugin, catalog)
    }

    /// Loads the entries of an ordered descriptor map.
    pub fn load_map(
        &mut self,
        config: &IndexMap<String, Value>,
        current_plugin: &str,
        catalog: &MiddlewareCatalog,
    ) -> Result<(), RegistryError> {
        self.load_entries(config, current_plugin, catalog)
    }

    fn load_entries<'v>(
        &mut self,
        entries: impl IntoIterator<Item = (&'v String, &'v Value)>,
        current_plugin: &str,
        catalog: &MiddlewareCatalog,
    ) -> Result<(), RegistryError> {
        for (descriptor, names) in entries {
            let key = parse_descriptor(descriptor, current_plugin);
            let Value::Array(names) = names else {
                return Err(RegistryError::BadConfig {
                    descriptor: descriptor.clone(),
                    found: value_kind(names),
                });
            };

            for name in names {
                let Some(name) = name.as_str() else {
                    tracing::warn!(
                        namespace = %key,
                        kind = value_kind(name),
                        "middleware name is not a string, skipping"
                    );
                    continue;
                };
                match catalog.get(name) {
                    Some(middleware) => self.add_shared(key.clone(), Arc::clone(middleware)),
                    None => {
                        tracing::warn!(namespace = %key, middleware = name, "middleware not found, skipping");
                    }
                }
            }
        }

        Ok(())
    }

    /// Appends `middleware` to the bucket `key`.
    pub fn add(&mut self, key: NamespaceKey, middleware: impl Middleware) -> &mut Self {
        self.add_shared(key, Arc::new(middleware));
        self
    }

    /// Appends an already shared middleware to the bucket `key`.
    pub fn add_shared(&mut self, key: NamespaceKey, middleware: BoxedMiddleware) {
        self.buckets.entry(key).or_default().push(middleware);
    }

    /// Freezes the builder.
    #[must_use]
    pub fn build(self) -> MiddlewareRegistry {
        MiddlewareRegistry {
            buckets: self.buckets,
        }
    }
}

/// Immutable middleware buckets keyed by namespace.
///
/// # Example
///
/// ```
/// use tessera_middleware::{MiddlewareCatalog, MiddlewareRegistry};
///
/// let catalog = MiddlewareCatalog::with_defaults();
/// let mut builder = MiddlewareRegistry::builder();
/// builder
///     .load(&serde_json::json!({"@": ["static_file"]}), "", &catalog)
///     .unwrap();
/// let registry = builder.build();
///
/// assert_eq!(registry.resolve("shop", "api", true).len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    buckets: IndexMap<NamespaceKey, Vec<BoxedMiddleware>>,
}

impl MiddlewareRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> MiddlewareRegistryBuilder {
        MiddlewareRegistryBuilder::new()
    }

    /// Returns the effective chain for `(plugin, app)`, outermost first.
    ///
    /// 1. the global bucket
    /// 2. `(plugin, "")` when `include_app_global` is set
    /// 3. `(plugin, app)` when `app` is not empty
    #[must_use]
    pub fn resolve(&self, plugin: &str, app: &str, include_app_global: bool) -> Vec<BoxedMiddleware> {
        let mut chain = Vec::new();
        chain.extend_from_slice(self.bucket(&NamespaceKey::global()));
        if include_app_global {
            chain.extend_from_slice(self.bucket(&NamespaceKey::new(plugin, "")));
        }
        if !app.is_empty() {
            chain.extend_from_slice(self.bucket(&NamespaceKey::new(plugin, app)));
        }
        chain
    }

    /// Returns the resolved chain as a [`Pipeline`].
    #[must_use]
    pub fn pipeline(&self, plugin: &str, app: &str, include_app_global: bool) -> Pipeline {
        Pipeline::new(self.resolve(plugin, app, include_app_global))
    }

    /// Returns the pipeline used for a plugin's static assets.
    #[must_use]
    pub fn static_pipeline(&self, plugin: &str) -> Pipeline {
        self.pipeline(plugin, tessera_core::STATIC_APP, false)
    }

    /// Returns the static-asset bucket of `plugin`.
    #[must_use]
    pub fn static_bucket(&self, plugin: &str) -> &[BoxedMiddleware] {
        self.bucket(&NamespaceKey::static_assets(plugin))
    }

    /// Returns the entries registered directly under `key`.
    #[must_use]
    pub fn bucket(&self, key: &NamespaceKey) -> &[BoxedMiddleware] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns every populated key, in first-registration order.
    pub fn keys(&self) -> impl Iterator<Item = &NamespaceKey> {
        self.buckets.keys()
    }

    /// Returns the number of populated keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl std::fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, entries) in &self.buckets {
            let names: Vec<_> = entries.iter().map(|m| m.name()).collect();
            map.entry(&key.to_string(), &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{BoxFuture, Next};
    use serde_json::json;
    use tessera_core::{RequestContext, TesseraResult};
    use tessera_http::{Request, Response};

    struct Named(&'static str);

    impl Middleware for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, TesseraResult<Response>> {
            next_boxed(ctx, request, next)
        }
    }

    fn next_boxed<'a>(
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, TesseraResult<Response>> {
        Box::pin(next.run(ctx, request))
    }

    fn catalog() -> MiddlewareCatalog {
        MiddlewareCatalog::new()
            .with("g", Named("g"))
            .with("wide", Named("wide"))
            .with("app", Named("app"))
            .with("foo_bar", Named("foo_bar"))
            .with("foo_wide", Named("foo_wide"))
    }

    fn names(chain: &[BoxedMiddleware]) -> Vec<&'static str> {
        chain.iter().map(|m| m.name()).collect()
    }

    fn registry(config: Value) -> MiddlewareRegistry {
        let mut builder = MiddlewareRegistry::builder();
        builder.load(&config, "", &catalog()).unwrap();
        builder.build()
    }

    #[test]
    fn test_descriptor_grammar() {
        assert_eq!(parse_descriptor("@", "shop"), NamespaceKey::global());
        assert_eq!(parse_descriptor("", "shop"), NamespaceKey::new("shop", ""));
        assert_eq!(parse_descriptor("admin", ""), NamespaceKey::new("", "admin"));
        assert_eq!(parse_descriptor("plugin.foo", "x"), NamespaceKey::new("foo", ""));
        assert_eq!(parse_descriptor("plugin.foo.bar", "x"), NamespaceKey::new("foo", "bar"));
        assert_eq!(
            parse_descriptor("plugin.foo.bar.ignored", "x"),
            NamespaceKey::new("foo", "bar")
        );
        assert_eq!(parse_descriptor("plugin", "shop"), NamespaceKey::new("shop", "plugin"));
        assert_eq!(parse_descriptor("plugins", ""), NamespaceKey::new("", "plugins"));
    }

    #[test]
    fn test_bare_plugin_key_stays_in_its_app() {
        let registry = registry(json!({"plugin": ["app"]}));
        assert_eq!(registry.pipeline("", "plugin", true).names(), vec!["app"]);
        assert!(registry.pipeline("", "admin", true).is_empty());
    }

    #[test]
    fn test_global_is_outermost_everywhere() {
        let registry = registry(json!({
            "": ["wide"],
            "admin": ["app"],
            "@": ["g"],
        }));

        assert_eq!(names(&registry.resolve("", "admin", true)), vec!["g", "wide", "app"]);
        assert_eq!(names(&registry.resolve("", "", true)), vec!["g", "wide"]);
        assert_eq!(names(&registry.resolve("other", "x", true)), vec!["g"]);
    }

    #[test]
    fn test_plugin_descriptor_scopes_to_app() {
        let registry = registry(json!({
            "plugin.foo.bar": ["foo_bar"],
            "plugin.foo": ["foo_wide"],
        }));

        assert_eq!(names(&registry.resolve("foo", "bar", true)), vec!["foo_wide", "foo_bar"]);
        assert_eq!(names(&registry.resolve("foo", "baz", true)), vec!["foo_wide"]);
        assert!(registry.resolve("", "bar", true).is_empty());
    }

    #[test]
    fn test_empty_app_excludes_app_specific() {
        let registry = registry(json!({"admin": ["app"], "": ["wide"]}));
        assert_eq!(names(&registry.resolve("", "", true)), vec!["wide"]);
        assert!(registry.resolve("", "", false).is_empty());
    }

    #[test]
    fn test_plugin_override_does_not_leak() {
        let mut builder = MiddlewareRegistry::builder();
        builder
            .load(&json!({"plugin.foo": ["foo_wide"], "admin": ["app"]}), "host_plugin", &catalog())
            .unwrap();
        let registry = builder.build();

        assert_eq!(registry.bucket(&NamespaceKey::new("host_plugin", "admin")).len(), 1);
        assert!(registry.bucket(&NamespaceKey::new("foo", "admin")).is_empty());
    }

    #[test]
    fn test_non_sequence_is_fatal() {
        let mut builder = MiddlewareRegistry::builder();
        let err = builder
            .load(&json!({"admin": "app"}), "", &catalog())
            .unwrap_err();
        assert!(matches!(err, RegistryError::BadConfig { ref descriptor, found: "string" } if descriptor == "admin"));
    }

    #[test]
    fn test_non_mapping_config_is_ignored() {
        let mut builder = MiddlewareRegistry::builder();
        builder.load(&json!(["g"]), "", &catalog()).unwrap();
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_unknown_names_and_empty_sequences() {
        let registry = registry(json!({"admin": ["missing", "app"], "api": []}));
        assert_eq!(names(&registry.resolve("", "admin", true)), vec!["app"]);
        assert!(registry.resolve("", "api", true).is_empty());
    }

    #[test]
    fn test_loading_twice_appends_twice() {
        let config = json!({"@": ["g"]});
        let mut builder = MiddlewareRegistry::builder();
        builder.load(&config, "", &catalog()).unwrap();
        builder.load(&config, "", &catalog()).unwrap();
        assert_eq!(builder.build().resolve("", "", true).len(), 2);
    }

    #[test]
    fn test_static_bucket_skips_app_global() {
        let registry = registry(json!({
            "@": ["g"],
            "": ["wide"],
            "__static__": ["app"],
        }));
        assert_eq!(names(registry.static_bucket("")), vec!["app"]);
        assert_eq!(registry.static_pipeline("").names(), vec!["g", "app"]);
    }

    #[test]
    fn test_keys_preserve_registration_order() {
        let mut config = IndexMap::new();
        config.insert("admin".to_string(), json!(["app"]));
        config.insert("@".to_string(), json!(["g"]));
        let mut builder = MiddlewareRegistry::builder();
        builder.load_map(&config, "", &catalog()).unwrap();
        let registry = builder.build();
        let keys: Vec<_> = registry.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["admin", "@"]);
    }
}
