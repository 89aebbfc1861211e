//! # Tessera Core
//!
//! Core types shared by every Tessera crate:
//!
//! - [`TesseraError`] - the error type caught at the dispatch boundary
//! - [`NamespaceKey`] - the `(plugin, app)` configuration scope
//! - [`RequestContext`] - per-request namespace, route and view variables
//! - [`RequestId`] - UUID v7 request identifier

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod namespace;

pub use context::{RequestContext, RequestId};
pub use error::{ErrorBody, ErrorCategory, TesseraError, TesseraResult, DEFAULT_ERROR_CODE};
pub use namespace::{NamespaceKey, GLOBAL_APP, STATIC_APP};
