//! Request context types.
//!
//! The [`RequestContext`] carries the resolved namespace, the matched route
//! and the view variables through the middleware pipeline and into the
//! terminal handler. It is created per request and never shared.

use std::time::Instant;

use http::Extensions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tessera_router::RouteMatch;
use uuid::Uuid;

use crate::namespace::NamespaceKey;

/// A unique identifier for each request, using UUID v7.
///
/// # Example
///
/// ```
/// use tessera_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request mutable state.
///
/// # Example
///
/// ```
/// use tessera_core::RequestContext;
/// use serde_json::json;
///
/// let mut ctx = RequestContext::new();
/// ctx.assign("title", json!("Home"));
/// ctx.assign("title", json!("Dashboard"));
/// assert_eq!(ctx.view_vars()["title"], "Dashboard");
/// ```
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    plugin: String,
    app: String,
    controller: String,
    action: String,
    route: Option<RouteMatch>,
    view_vars: Map<String, Value>,
    extensions: Extensions,
    started_at: Instant,
}

impl RequestContext {
    /// Creates an empty context in the host namespace.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            plugin: String::new(),
            app: String::new(),
            controller: String::new(),
            action: String::new(),
            route: None,
            view_vars: Map::new(),
            extensions: Extensions::new(),
            started_at: Instant::now(),
        }
    }

    /// Creates a context populated from a route match.
    #[must_use]
    pub fn for_route(route: RouteMatch) -> Self {
        let mut ctx = Self::new();
        let target = route.target();
        ctx.plugin = target.plugin.clone();
        ctx.app = target.app.clone();
        ctx.controller = target.controller.clone();
        ctx.action = target.action.clone();
        ctx.route = Some(route);
        ctx
    }

    /// Returns a new context placed in `plugin`/`app`.
    #[must_use]
    pub fn with_namespace(mut self, plugin: impl Into<String>, app: impl Into<String>) -> Self {
        self.plugin = plugin.into();
        self.app = app.into();
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the resolved plugin, empty for the host.
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Returns the resolved app.
    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Returns the resolved controller.
    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Returns the resolved action.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the namespace key of this request.
    #[must_use]
    pub fn namespace(&self) -> NamespaceKey {
        NamespaceKey::new(self.plugin.clone(), self.app.clone())
    }

    /// Returns the matched route, `None` on the not-found path.
    #[must_use]
    pub fn route(&self) -> Option<&RouteMatch> {
        self.route.as_ref()
    }

    /// Returns a path parameter of the matched route.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.route.as_ref().and_then(|r| r.params.get(name))
    }

    /// Assigns one view variable. Later assignments overwrite earlier ones.
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.view_vars.insert(name.into(), value.into());
    }

    /// Assigns every entry of `vars`.
    pub fn assign_many<I, K>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (name, value) in vars {
            self.view_vars.insert(name.into(), value);
        }
    }

    /// Returns the accumulated view variables.
    #[must_use]
    pub fn view_vars(&self) -> &Map<String, Value> {
        &self.view_vars
    }

    /// Returns the typed extension storage.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the typed extension storage mutably.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tessera_router::{Router, RouteTarget};

    #[test]
    fn test_request_id_new_generates_unique_ids() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_new_context_is_host_namespace() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.namespace(), NamespaceKey::host(""));
        assert!(ctx.route().is_none());
    }

    #[test]
    fn test_for_route_copies_target() {
        let router = Router::builder()
            .get("/items/{id}", RouteTarget::new("api", "item", "show").in_plugin("shop"))
            .build()
            .unwrap();
        let matched = router
            .match_route(&http::Method::GET, "/items/5")
            .unwrap();

        let ctx = RequestContext::for_route(matched);
        assert_eq!(ctx.plugin(), "shop");
        assert_eq!(ctx.app(), "api");
        assert_eq!(ctx.controller(), "item");
        assert_eq!(ctx.action(), "show");
        assert_eq!(ctx.param("id"), Some("5"));
    }

    #[test]
    fn test_assign_many_overwrites() {
        let mut ctx = RequestContext::new();
        ctx.assign("a", 1);
        ctx.assign_many([("a", json!(2)), ("b", json!("x"))]);
        assert_eq!(ctx.view_vars()["a"], 2);
        assert_eq!(ctx.view_vars()["b"], "x");
    }

    #[test]
    fn test_extensions_roundtrip() {
        #[derive(Clone)]
        struct Tenant(Arc<str>);

        let mut ctx = RequestContext::new();
        ctx.extensions_mut().insert(Tenant(Arc::from("acme")));
        assert_eq!(&*ctx.extensions().get::<Tenant>().unwrap().0, "acme");
    }

    #[test]
    fn test_with_namespace() {
        let ctx = RequestContext::new().with_namespace("shop", "api");
        assert_eq!(ctx.namespace(), NamespaceKey::new("shop", "api"));
    }
}
