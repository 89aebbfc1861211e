//! Startup orchestration.
//!
//! [`Application`] turns a loaded [`TesseraConfig`] into a running server:
//!
//! 1. logging and metrics are installed (only by [`Application::run`])
//! 2. the middleware registry is loaded from the host, project, plugin and
//!    static-file tables
//! 3. bootstraps run: the host's first, then each enabled plugin's
//!    projects and the plugin itself
//! 4. the route table is frozen and the dispatcher built
//! 5. the HTTP listener starts

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tessera_config::TesseraConfig;
use tessera_core::STATIC_APP;
use tessera_http::BodyLimits;
use tessera_middleware::{Handler, Middleware, MiddlewareCatalog, MiddlewareRegistry, RegistryError};
use tessera_router::{RouteTarget, RouterBuilder};
use tessera_server::{
    run_bootstraps, Bootstrap, BootstrapCatalog, ControllerRegistry, DefaultExceptionHandler,
    Dispatcher, DispatcherConfig, ExceptionHandler, HostHandle, PublicRoot, RawView, Server,
    ServerConfig, SessionBootstrap, SessionConfig, ShutdownSignal, TracingReporter, ViewHandle,
};

use crate::error::ApplicationError;

/// Name under which the session bootstrap is available by default.
pub const SESSION_BOOTSTRAP: &str = "session";

/// A Tessera application under construction.
///
/// # Example
///
/// ```rust
/// use tessera::prelude::*;
///
/// let app = Application::new(TesseraConfig::default())
///     .routes(|r| r.get("/admin/index", RouteTarget::new("admin", "index", "index")))
///     .controller(
///         RouteTarget::new("admin", "index", "index"),
///         handler_fn(|_req| async { Ok(response::html("admin home")) }),
///     );
///
/// let dispatcher = app.into_dispatcher().unwrap();
/// assert_eq!(dispatcher.router().len(), 1);
/// ```
pub struct Application {
    config: TesseraConfig,
    catalog: MiddlewareCatalog,
    bootstraps: BootstrapCatalog,
    routes: RouterBuilder,
    controllers: ControllerRegistry,
    exception_handler: Option<Arc<dyn ExceptionHandler>>,
}

impl Application {
    /// Creates an application from loaded configuration.
    #[must_use]
    pub fn new(config: TesseraConfig) -> Self {
        Self {
            config,
            catalog: MiddlewareCatalog::with_defaults(),
            bootstraps: BootstrapCatalog::new(),
            routes: RouterBuilder::new(),
            controllers: ControllerRegistry::new(),
            exception_handler: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TesseraConfig {
        &self.config
    }

    /// Makes a middleware available to the configuration under `name`.
    #[must_use]
    pub fn middleware(mut self, name: impl Into<String>, middleware: impl Middleware) -> Self {
        self.catalog.register(name, middleware);
        self
    }

    /// Makes a bootstrap available to the configuration under `name`.
    #[must_use]
    pub fn bootstrap(mut self, name: impl Into<String>, bootstrap: impl Bootstrap) -> Self {
        self.bootstraps.register(name, bootstrap);
        self
    }

    /// Adds routes.
    #[must_use]
    pub fn routes(mut self, f: impl FnOnce(RouterBuilder) -> RouterBuilder) -> Self {
        self.routes = f(self.routes);
        self
    }

    /// Registers the action answering `target`.
    #[must_use]
    pub fn controller(mut self, target: RouteTarget, handler: impl Handler) -> Self {
        self.controllers.register(target, handler);
        self
    }

    /// Replaces the default exception handler.
    #[must_use]
    pub fn exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.exception_handler = Some(handler);
        self
    }

    /// Loads the middleware registry from configuration.
    ///
    /// Order: host table; then for each enabled plugin, its projects'
    /// tables (loaded as host entries), its own table and its static-file
    /// list; finally the host static-file list.
    pub fn build_registry(&self) -> Result<MiddlewareRegistry, RegistryError> {
        let mut builder = MiddlewareRegistry::builder();
        builder.load_map(&self.config.middleware, "", &self.catalog)?;

        for (name, plugin) in self.config.enabled_plugins() {
            for project in plugin.projects.values() {
                builder.load_map(&project.middleware, "", &self.catalog)?;
            }
            builder.load_map(&plugin.middleware, name, &self.catalog)?;
            builder.load(
                &json!({ STATIC_APP: plugin.static_files.middleware }),
                name,
                &self.catalog,
            )?;
        }

        builder.load(
            &json!({ STATIC_APP: self.config.static_files.middleware }),
            "",
            &self.catalog,
        )?;
        Ok(builder.build())
    }

    /// Returns the bootstrap names in the order they run.
    #[must_use]
    pub fn bootstrap_order(&self) -> Vec<String> {
        let mut names = self.config.bootstrap.clone();
        for (_, plugin) in self.config.enabled_plugins() {
            for project in plugin.projects.values() {
                names.extend(project.bootstrap.iter().cloned());
            }
            names.extend(plugin.bootstrap.iter().cloned());
        }
        names
    }

    /// Returns the listener settings.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .listen(&self.config.server.listen)
            .shutdown_timeout(Duration::from_secs(self.config.server.graceful_shutdown_timeout_secs))
            .keep_alive(self.config.server.keep_alive)
            .max_body_size(self.config.app.max_body_size)
            .build()
    }

    /// Returns the dispatch settings.
    #[must_use]
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        let app = &self.config.app;
        let mut config = DispatcherConfig::new(&app.public_path)
            .debug(app.debug)
            .static_enabled(self.config.static_files.enable)
            .body_limits(
                BodyLimits::new()
                    .max_file_size(app.max_file_size)
                    .max_fields(app.max_fields),
            );
        for (name, plugin) in self.config.enabled_plugins() {
            config = config.plugin_public(
                name,
                PublicRoot::new(self.config.public_path(name)).enabled(plugin.static_files.enable),
            );
        }
        config
    }

    /// Returns the template renderer for the host and enabled plugins.
    #[must_use]
    pub fn view_renderer(&self) -> RawView {
        let mut view = RawView::new(self.config.view_path("")).suffix(&self.config.view.suffix);
        for (name, _) in self.config.enabled_plugins() {
            view = view.plugin_root(name, self.config.view_path(name));
        }
        view
    }

    /// Loads middleware, runs bootstraps and builds the dispatcher.
    ///
    /// Does not install logging or metrics.
    pub fn into_dispatcher(mut self) -> Result<Dispatcher, ApplicationError> {
        let registry = self.build_registry()?;
        tracing::debug!(namespaces = registry.len(), "middleware registry loaded");

        let names = self.bootstrap_order();
        if self.bootstraps.get(SESSION_BOOTSTRAP).is_none()
            && names.iter().any(|name| name == SESSION_BOOTSTRAP)
        {
            let session = SessionConfig::from_map(&self.config.session)?;
            self.bootstraps
                .register(SESSION_BOOTSTRAP, SessionBootstrap::new(session));
        }

        let mut host = HostHandle::new();
        host.insert(ViewHandle::new(Arc::new(self.view_renderer())));
        run_bootstraps(&names, &self.bootstraps, Some(&mut host))?;

        let dispatcher_config = self.dispatcher_config();
        let exception_handler = self.exception_handler.take().unwrap_or_else(|| {
            Arc::new(
                DefaultExceptionHandler::new(self.config.app.debug, Arc::new(TracingReporter))
                    .dont_report(self.config.exception.dont_report.iter().copied()),
            )
        });

        Ok(Dispatcher::builder(self.routes.build()?, registry)
            .controllers(self.controllers)
            .exception_handler(exception_handler)
            .config(dispatcher_config)
            .shared(host.into_extensions())
            .build())
    }

    /// Starts serving until SIGTERM or Ctrl+C.
    pub async fn run(self) -> Result<(), ApplicationError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Installs telemetry, builds the dispatcher and serves until
    /// `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ApplicationError> {
        tessera_telemetry::init_telemetry(&self.config.log_config(), &self.config.metrics_config())?;

        let server_config = self.server_config();
        let dispatcher = Arc::new(self.into_dispatcher()?);
        tracing::info!(
            routes = dispatcher.router().len(),
            controllers = dispatcher.controllers().len(),
            "application ready"
        );

        Server::new(server_config, dispatcher)
            .run_with_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("catalog", &self.catalog.len())
            .field("bootstraps", &self.bootstraps)
            .field("routes", &self.routes)
            .field("controllers", &self.controllers)
            .finish_non_exhaustive()
    }
}
