//! The route table and its builder.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::route::{Route, RouteTarget, UrlParams};
use crate::RouteMatch;

/// An immutable route table backed by a radix tree.
///
/// Built once at startup through [`RouterBuilder`] and shared read-only
/// between request tasks.
///
/// # Example
///
/// ```rust
/// use tessera_router::{Router, RouteTarget};
/// use http::Method;
///
/// let router = Router::builder()
///     .get("/admin/index", RouteTarget::new("admin", "index", "index"))
///     .name("admin.index")
///     .build()
///     .unwrap();
///
/// let matched = router.match_route(&Method::GET, "/admin/index").unwrap();
/// assert_eq!(matched.route.target().app, "admin");
/// assert_eq!(router.url_for("admin.index", &Default::default()), "/admin/index");
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/{id}`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    routes: Vec<Arc<Route>>,
    names: HashMap<String, usize>,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            root: Node::root(),
            routes: Vec::new(),
            names: HashMap::new(),
        }
    }
}

impl Router {
    /// Starts building a route table.
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Matches a method and path.
    ///
    /// Returns `None` when no route answers; the caller treats that as the
    /// not-found outcome.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let (methods, params) = self.root.match_path(path)?;
        let idx = methods.route_for(method)?;
        Some(RouteMatch::new(Arc::clone(&self.routes[idx]), params))
    }

    /// Matches a path regardless of method.
    ///
    /// Useful for building `405 Method Not Allowed` responses.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        self.root.match_path(path)
    }

    /// Looks up a route by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.names.get(name).map(|idx| &self.routes[*idx])
    }

    /// Generates the URL of a named route.
    ///
    /// Returns an empty string when the name is unknown.
    #[must_use]
    pub fn url_for(&self, name: &str, params: &UrlParams) -> String {
        self.by_name(name)
            .map(|route| route.url(params))
            .unwrap_or_default()
    }

    /// Returns every registered route in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Fluent builder for [`Router`].
///
/// Routes can be grouped under a shared prefix, and [`name`](Self::name)
/// always applies to the most recently added route.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<Route>,
    prefix: String,
}

impl RouterBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route answering `methods`. An empty slice accepts any method.
    #[must_use]
    pub fn add(mut self, methods: &[Method], path: &str, target: RouteTarget) -> Self {
        let path = join_path(&self.prefix, path);
        self.routes.push(Route {
            name: None,
            path,
            methods: methods.to_vec(),
            target,
        });
        self
    }

    /// Adds a `GET` route.
    #[must_use]
    pub fn get(self, path: &str, target: RouteTarget) -> Self {
        self.add(&[Method::GET], path, target)
    }

    /// Adds a `POST` route.
    #[must_use]
    pub fn post(self, path: &str, target: RouteTarget) -> Self {
        self.add(&[Method::POST], path, target)
    }

    /// Adds a `PUT` route.
    #[must_use]
    pub fn put(self, path: &str, target: RouteTarget) -> Self {
        self.add(&[Method::PUT], path, target)
    }

    /// Adds a `PATCH` route.
    #[must_use]
    pub fn patch(self, path: &str, target: RouteTarget) -> Self {
        self.add(&[Method::PATCH], path, target)
    }

    /// Adds a `DELETE` route.
    #[must_use]
    pub fn delete(self, path: &str, target: RouteTarget) -> Self {
        self.add(&[Method::DELETE], path, target)
    }

    /// Adds a route answering every method.
    #[must_use]
    pub fn any(self, path: &str, target: RouteTarget) -> Self {
        self.add(&[], path, target)
    }

    /// Names the most recently added route.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        if let Some(route) = self.routes.last_mut() {
            route.name = Some(name.into());
        }
        self
    }

    /// Registers the routes added inside `f` under `prefix`.
    #[must_use]
    pub fn group(mut self, prefix: &str, f: impl FnOnce(Self) -> Self) -> Self {
        let outer = std::mem::take(&mut self.prefix);
        self.prefix = join_path(&outer, prefix);
        let mut inner = f(self);
        inner.prefix = outer;
        inner
    }

    /// Builds the immutable route table.
    ///
    /// When two routes claim the same method and path the first one wins.
    /// When two routes share a name the last one wins.
    pub fn build(self) -> Result<Router, RouteError> {
        let mut router = Router::default();

        for (idx, route) in self.routes.into_iter().enumerate() {
            let segments = Node::parse_path(&route.path)?;
            let methods = router.root.entry(&segments);
            if route.methods.is_empty() {
                methods.insert_any(idx);
            } else {
                for method in &route.methods {
                    methods.insert(method.clone(), idx);
                }
            }
            if let Some(name) = &route.name {
                router.names.insert(name.clone(), idx);
            }
            router.routes.push(Arc::new(route));
        }

        Ok(router)
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }
    } else {
        format!("{prefix}/{path}")
    }
}
