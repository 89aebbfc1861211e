//! Per-request dispatch.
//!
//! The [`Dispatcher`] owns frozen snapshots of the route table and the
//! middleware registry. For each request it picks a terminal (static
//! file, controller action or not-found page), resolves the chain for the
//! request's namespace, runs it and converts any failure into a response.
//! It never fails.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use http::Extensions;
use tessera_core::{RequestContext, TesseraError, TesseraResult, STATIC_APP};
use tessera_http::{Request, Response, ResponseExt};
use tessera_middleware::MiddlewareRegistry;
use tessera_router::Router;

use crate::config::DispatcherConfig;
use crate::exception::{render_business, DefaultExceptionHandler, ExceptionHandler, TracingReporter};
use crate::handler::{ControllerRegistry, NotFoundHandler, StaticFileHandler};

/// Prefix under which plugin assets are served.
const PLUGIN_ASSET_PREFIX: &str = "/app/";

/// What answers a request once the chain has run.
enum Terminal {
    Static(PathBuf),
    Controller,
    NotFound,
}

/// Routes requests through their middleware chain to a terminal handler.
///
/// Built once at startup and shared by every connection.
pub struct Dispatcher {
    router: Arc<Router>,
    registry: Arc<MiddlewareRegistry>,
    controllers: ControllerRegistry,
    exception_handler: Arc<dyn ExceptionHandler>,
    not_found: NotFoundHandler,
    config: DispatcherConfig,
    shared: Extensions,
}

impl Dispatcher {
    /// Starts building a dispatcher.
    #[must_use]
    pub fn builder(router: Router, registry: MiddlewareRegistry) -> DispatcherBuilder {
        DispatcherBuilder::new(router, registry)
    }

    /// Returns the route table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the middleware registry.
    #[must_use]
    pub fn registry(&self) -> &MiddlewareRegistry {
        &self.registry
    }

    /// Returns the controller registry.
    #[must_use]
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    /// Returns the dispatch settings.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Produces the response for `request`.
    pub async fn dispatch(&self, request: Request) -> Response {
        let snapshot = request.clone();
        let (mut ctx, terminal) = self.plan(&request).await;
        ctx.extensions_mut().extend(self.shared.clone());

        let response = match self.execute(&mut ctx, request, terminal).await {
            Ok(response) => response,
            Err(error) => self.convert(&snapshot, error),
        };

        let status = response.status().as_u16();
        let elapsed = ctx.elapsed();
        tessera_telemetry::record_request(ctx.plugin(), ctx.app(), status, elapsed);
        tracing::debug!(
            request_id = %ctx.request_id(),
            plugin = ctx.plugin(),
            app = ctx.app(),
            method = %snapshot.method(),
            path = snapshot.path(),
            status,
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "request dispatched"
        );
        response
    }

    async fn plan(&self, request: &Request) -> (RequestContext, Terminal) {
        if let Some((plugin, path)) = self.resolve_static(request.path()).await {
            let ctx = RequestContext::new().with_namespace(plugin, STATIC_APP);
            return (ctx, Terminal::Static(path));
        }

        match self.router.match_route(request.method(), request.path()) {
            Some(route) => (RequestContext::for_route(route), Terminal::Controller),
            None => (RequestContext::new(), Terminal::NotFound),
        }
    }

    async fn execute(
        &self,
        ctx: &mut RequestContext,
        mut request: Request,
        terminal: Terminal,
    ) -> TesseraResult<Response> {
        match terminal {
            Terminal::Static(path) => {
                let pipeline = self.registry.static_pipeline(ctx.plugin());
                let handler = StaticFileHandler::new(path);
                pipeline.run(ctx, request, &handler).await
            }
            Terminal::Controller => {
                let handler = match ctx.route().map(|route| route.target()) {
                    Some(target) => self.controllers.get(target).cloned().ok_or_else(|| {
                        TesseraError::internal_with_code(
                            501,
                            format!("no controller action registered for {target}"),
                        )
                    })?,
                    None => return Err(TesseraError::internal("route context lost")),
                };
                request.parse_body(self.config.limits()).await?;
                let pipeline = self.registry.pipeline(ctx.plugin(), ctx.app(), true);
                pipeline.run(ctx, request, handler.as_ref()).await
            }
            Terminal::NotFound => {
                request.parse_body(self.config.limits()).await?;
                let pipeline = self.registry.pipeline("", "", true);
                pipeline.run(ctx, request, &self.not_found).await
            }
        }
    }

    fn convert(&self, request: &Request, error: TesseraError) -> Response {
        let response = match &error {
            TesseraError::Business { code, message } => render_business(request, *code, message),
            _ => {
                self.exception_handler.report(&error, Some(request));
                self.exception_handler.render(request, &error)
            }
        };
        response.attach_error(Arc::new(error))
    }

    /// Maps a request path onto an existing public file and its plugin.
    async fn resolve_static(&self, path: &str) -> Option<(String, PathBuf)> {
        let (plugin, root, relative) = match path
            .strip_prefix(PLUGIN_ASSET_PREFIX)
            .and_then(|rest| rest.split_once('/'))
            .and_then(|(plugin, rest)| Some((plugin, self.config.plugin_root(plugin)?, rest)))
        {
            Some((plugin, root, rest)) => (plugin, root, rest),
            None => ("", self.config.public(), path),
        };
        if !root.enabled {
            return None;
        }

        let file = join_public(&root.path, relative)?;
        match tokio::fs::metadata(&file).await {
            Ok(metadata) if metadata.is_file() => Some((plugin.to_string(), file)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("registry", &self.registry.len())
            .field("controllers", &self.controllers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Joins a URL path under `root`. Returns `None` for traversal segments.
fn join_public(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut file = root.to_path_buf();
    for component in Path::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => file.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(file)
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    router: Router,
    registry: MiddlewareRegistry,
    controllers: ControllerRegistry,
    exception_handler: Option<Arc<dyn ExceptionHandler>>,
    config: DispatcherConfig,
    shared: Extensions,
}

impl DispatcherBuilder {
    /// Creates a builder around the frozen route table and registry.
    #[must_use]
    pub fn new(router: Router, registry: MiddlewareRegistry) -> Self {
        Self {
            router,
            registry,
            controllers: ControllerRegistry::new(),
            exception_handler: None,
            config: DispatcherConfig::default(),
            shared: Extensions::new(),
        }
    }

    /// Sets the controller actions.
    #[must_use]
    pub fn controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = controllers;
        self
    }

    /// Replaces the exception handler.
    #[must_use]
    pub fn exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.exception_handler = Some(handler);
        self
    }

    /// Sets the dispatch settings.
    #[must_use]
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets values copied into every request context, usually what the
    /// bootstraps stored.
    #[must_use]
    pub fn shared(mut self, extensions: Extensions) -> Self {
        self.shared = extensions;
        self
    }

    /// Builds the dispatcher. Without an explicit exception handler the
    /// default one reports through `tracing`.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        let exception_handler = self.exception_handler.unwrap_or_else(|| {
            Arc::new(DefaultExceptionHandler::new(
                self.config.is_debug(),
                Arc::new(TracingReporter),
            ))
        });
        Dispatcher {
            router: Arc::new(self.router),
            registry: Arc::new(self.registry),
            controllers: self.controllers,
            exception_handler,
            not_found: NotFoundHandler::new(self.config.public_path()),
            config: self.config,
            shared: self.shared,
        }
    }
}
