//! Radix tree route table for Tessera.
//!
//! Routes map `(method, path pattern)` to a [`RouteTarget`] naming the
//! plugin, app, controller and action that should answer. The table is built
//! once through [`RouterBuilder`] and then only read.
//!
//! # Features
//!
//! - **Radix Tree Matching**: O(k) path lookup
//! - **Path Parameters**: `/users/{id}`
//! - **Wildcards**: `/files/*path`
//! - **Named Routes**: reverse URL generation with positional or named values
//! - **Groups**: shared path prefixes
//!
//! # Example
//!
//! ```rust
//! use tessera_router::{Router, RouteTarget, UrlParams};
//! use http::Method;
//!
//! let router = Router::builder()
//!     .get("/admin/index", RouteTarget::new("admin", "index", "index"))
//!     .name("admin.index")
//!     .group("/shop", |g| {
//!         g.get("/items/{id}", RouteTarget::new("api", "item", "show").in_plugin("shop"))
//!             .name("shop.item")
//!     })
//!     .build()
//!     .unwrap();
//!
//! let m = router.match_route(&Method::GET, "/shop/items/7").unwrap();
//! assert_eq!(m.route.target().plugin, "shop");
//! assert_eq!(m.params.get("id"), Some("7"));
//!
//! assert_eq!(router.url_for("shop.item", &UrlParams::positional(["9"])), "/shop/items/9");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_router;
mod node;
mod params;
mod route;
mod router;

use std::sync::Arc;

pub use error::RouteError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use route::{Route, RouteTarget, UrlParams};
pub use router::{Router, RouterBuilder};

/// A matched route with its extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The route that answered.
    pub route: Arc<Route>,
    /// Extracted path parameters
    pub params: Params,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(route: Arc<Route>, params: Params) -> Self {
        Self { route, params }
    }

    /// Shortcut for the matched target.
    #[must_use]
    pub fn target(&self) -> &RouteTarget {
        self.route.target()
    }
}
