//! Terminal handlers: controller actions, the not-found page and static
//! files.
//!
//! Controllers are registered against a [`RouteTarget`]. The dispatcher
//! looks the matched target up in the [`ControllerRegistry`] and runs the
//! result as the innermost step of the middleware pipeline.
//!
//! # Example
//!
//! ```rust
//! use tessera_http::response;
//! use tessera_middleware::handler_fn;
//! use tessera_router::RouteTarget;
//! use tessera_server::ControllerRegistry;
//!
//! let mut controllers = ControllerRegistry::new();
//! controllers.register(
//!     RouteTarget::new("admin", "index", "index"),
//!     handler_fn(|_request| async { Ok(response::html("admin home")) }),
//! );
//! assert!(controllers.contains(&RouteTarget::new("admin", "index", "index")));
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use http::StatusCode;
use tessera_core::{RequestContext, TesseraResult};
use tessera_http::{response, Request, Response};
use tessera_middleware::{BoxFuture, Handler};
use tessera_router::RouteTarget;

/// Fallback body when no `404.html` exists.
pub const NOT_FOUND_BODY: &str = "<h1>404 Not Found</h1>";

/// A type-erased, shareable handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// Controller actions keyed by route target.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    handlers: HashMap<RouteTarget, BoxedHandler>,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the action answering `target`, replacing any previous one.
    pub fn register(&mut self, target: RouteTarget, handler: impl Handler) -> &mut Self {
        self.handlers.insert(target, Arc::new(handler));
        self
    }

    /// Registers an already shared action.
    pub fn register_shared(&mut self, target: RouteTarget, handler: BoxedHandler) -> &mut Self {
        self.handlers.insert(target, handler);
        self
    }

    /// Returns the action for `target`.
    #[must_use]
    pub fn get(&self, target: &RouteTarget) -> Option<&BoxedHandler> {
        self.handlers.get(target)
    }

    /// Returns `true` if `target` has an action.
    #[must_use]
    pub fn contains(&self, target: &RouteTarget) -> bool {
        self.handlers.contains_key(target)
    }

    /// Returns the number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no action is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns the registered targets.
    pub fn targets(&self) -> impl Iterator<Item = &RouteTarget> {
        self.handlers.keys()
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut targets: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        targets.sort();
        f.debug_struct("ControllerRegistry")
            .field("targets", &targets)
            .finish()
    }
}

/// Answers unmatched requests with `404`.
///
/// `<public>/404.html` is read on every request so edits show up without
/// a restart.
#[derive(Debug, Clone)]
pub struct NotFoundHandler {
    page: PathBuf,
}

impl NotFoundHandler {
    /// Creates a handler reading `404.html` from `public_path`.
    pub fn new(public_path: impl Into<PathBuf>) -> Self {
        Self {
            page: public_path.into().join("404.html"),
        }
    }
}

impl Handler for NotFoundHandler {
    fn call<'a>(
        &'a self,
        _ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, TesseraResult<Response>> {
        Box::pin(async move {
            let body = match tokio::fs::read(&self.page).await {
                Ok(content) => content,
                Err(_) => NOT_FOUND_BODY.as_bytes().to_vec(),
            };
            let mut response = response::html(body);
            *response.status_mut() = StatusCode::NOT_FOUND;
            Ok(response)
        })
    }
}

/// Serves one resolved file.
#[derive(Debug, Clone)]
pub struct StaticFileHandler {
    path: PathBuf,
}

impl StaticFileHandler {
    /// Creates a handler serving `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Handler for StaticFileHandler {
    fn call<'a>(
        &'a self,
        _ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, TesseraResult<Response>> {
        Box::pin(async move { response::file(&request, &self.path).await })
    }
}
