//! # Tessera
//!
//! **Multi-tenant HTTP dispatch core with namespace-scoped middleware**
//!
//! Requests resolve through a two-level namespace, plugin then
//! application, to a controller action. Each namespace carries its own
//! middleware, and every request runs through one deterministic onion:
//!
//! ```text
//! Request → global "@" → app-wide (plugin, "") → app (plugin, app) → Controller
//!                                                                      ↓
//! Response ← global ←── app-wide ←─────────────── app ←───────────────┘
//! ```
//!
//! Failures raised anywhere in the chain are converted to a response at a
//! single boundary: business errors are echoed softly, everything else is
//! reported and rendered generically unless debug mode is on.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_defaults()
//!         .with_dotenv()?
//!         .with_optional_file("config/tessera.toml")?
//!         .with_env_prefix("TESSERA")
//!         .load()?;
//!
//!     Application::new(config)
//!         .routes(|r| r.get("/admin/index", RouteTarget::new("admin", "index", "index")))
//!         .controller(
//!             RouteTarget::new("admin", "index", "index"),
//!             handler_fn(|_req| async { Ok(response::html("admin home")) }),
//!         )
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/tessera/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;
mod error;

pub use application::{Application, SESSION_BOOTSTRAP};
pub use error::ApplicationError;

// Re-export the member crates
pub use tessera_config as config;
pub use tessera_core as core;
pub use tessera_http as http;
pub use tessera_middleware as middleware;
pub use tessera_router as router;
pub use tessera_server as server;
pub use tessera_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Application, ApplicationError};

    pub use tessera_config::{ConfigLoader, TesseraConfig};
    pub use tessera_core::{
        ErrorCategory, RequestContext, RequestId, TesseraError, TesseraResult,
    };
    pub use tessera_http::{response, Request, Response, ResponseExt, UploadFile};
    pub use tessera_middleware::{
        handler_fn, BoxFuture, FnMiddleware, Handler, Middleware, MiddlewareCatalog, Next,
    };
    pub use tessera_router::{RouteTarget, Router, RouterBuilder};
    pub use tessera_server::{
        Bootstrap, Dispatcher, ExceptionHandler, HostHandle, ShutdownSignal, ViewHandle,
    };
}
