//! # Tessera Server
//!
//! Request dispatch and the HTTP transport for Tessera.
//!
//! - [`Dispatcher`]: static assets, route matching, middleware pipelines
//!   and the failure boundary
//! - [`exception`]: business rendering plus reporting and rendering of
//!   unexpected errors
//! - [`bootstrap`]: startup hooks and the typed session settings
//! - [`view`]: file templates with `{{ name }}` placeholders
//! - [`Server`]: hyper HTTP/1.1 listener with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera_http::response;
//! use tessera_middleware::{handler_fn, MiddlewareRegistry};
//! use tessera_router::{RouteTarget, Router};
//! use tessera_server::{ControllerRegistry, Dispatcher};
//!
//! let target = RouteTarget::new("admin", "index", "index");
//! let router = Router::builder().get("/admin/index", target.clone()).build().unwrap();
//!
//! let mut controllers = ControllerRegistry::new();
//! controllers.register(target, handler_fn(|_req| async { Ok(response::html("admin home")) }));
//!
//! let dispatcher = Arc::new(
//!     Dispatcher::builder(router, MiddlewareRegistry::builder().build())
//!         .controllers(controllers)
//!         .build(),
//! );
//! # let _ = dispatcher;
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bootstrap;
mod config;
mod dispatcher;
mod error;
pub mod exception;
mod handler;
mod server;
mod shutdown;
pub mod view;

pub use bootstrap::{
    run_bootstraps, Bootstrap, BootstrapCatalog, HostHandle, SessionBootstrap, SessionConfig,
};
pub use config::{
    DispatcherConfig, PublicRoot, ServerConfig, ServerConfigBuilder, DEFAULT_LISTEN,
    DEFAULT_MAX_BODY_SIZE, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::ServerError;
pub use exception::{
    render_business, DefaultExceptionHandler, ErrorReporter, ExceptionHandler, MemoryReporter,
    TracingReporter, GENERIC_ERROR_MESSAGE,
};
pub use handler::{BoxedHandler, ControllerRegistry, NotFoundHandler, StaticFileHandler, NOT_FOUND_BODY};
pub use server::{Server, PAYLOAD_TOO_LARGE_BODY};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
pub use view::{RawView, ViewHandle, ViewRenderer};
