//! # Tessera Middleware
//!
//! Namespace-scoped middleware for the Tessera dispatch core.
//!
//! Middleware are registered per namespace key `(plugin, app)` and resolved
//! into an onion [`Pipeline`] for each request:
//!
//! ```text
//! Request → global "@" → app-wide (plugin, "") → app (plugin, app) → Handler
//!                                                                      ↓
//! Response ← global ←── app-wide ←─────────────── app ←───────────────┘
//! ```
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Middleware`] | one onion layer |
//! | [`Handler`] | the pipeline terminal |
//! | [`MiddlewareCatalog`] | name → middleware, used by configuration |
//! | [`MiddlewareRegistry`] | immutable buckets keyed by namespace |
//! | [`Pipeline`] | resolved chain for one namespace |
//!
//! ## Example
//!
//! ```
//! use tessera_middleware::{MiddlewareCatalog, MiddlewareRegistry};
//!
//! let catalog = MiddlewareCatalog::with_defaults();
//! let mut builder = MiddlewareRegistry::builder();
//! builder
//!     .load(&serde_json::json!({"plugin.shop.api": ["static_file"]}), "", &catalog)
//!     .unwrap();
//! let registry = builder.build();
//!
//! assert_eq!(registry.pipeline("shop", "api", true).names(), vec!["static_file"]);
//! assert!(registry.pipeline("shop", "web", true).is_empty());
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-middleware/0.1.0")]

pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod registry;
pub mod stages;

pub use error::RegistryError;
pub use middleware::{handler_fn, BoxFuture, FnMiddleware, Handler, HandlerFn, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline};
pub use registry::{MiddlewareCatalog, MiddlewareRegistry, MiddlewareRegistryBuilder};
