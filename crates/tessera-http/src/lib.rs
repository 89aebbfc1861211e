//! HTTP request and response types for Tessera.
//!
//! This crate augments plain `http` requests with the accessors handlers
//! need:
//!
//! - [`Request`]: query and body fields, uploads, cookies, client address
//! - [`UploadFile`] / [`FileInput`]: uploaded files grouped by field name
//! - [`is_intranet_ip`]: intranet classification used for proxy trust
//! - [`response`]: builders for HTML, JSON, JSONP, XML, redirects and files
//!
//! # Example
//!
//! ```
//! use tessera_http::{response, Request};
//!
//! let request = Request::new(
//!     http::Request::get("/hello?name=ann")
//!         .body(bytes::Bytes::new())
//!         .unwrap(),
//! );
//! let name = request.input("name", "world");
//! let reply = response::html(format!("Hello {}", name.as_str().unwrap_or("")));
//! assert_eq!(reply.status(), http::StatusCode::OK);
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-http/0.1.0")]

mod body;
mod field;
mod ip;
mod request;
pub mod response;
mod upload;

pub use body::{BodyLimits, DEFAULT_MAX_FIELDS, DEFAULT_MAX_FILE_SIZE};
pub use field::InputMap;
pub use ip::{is_intranet_addr, is_intranet_ip, resolve_real_ip, FORWARDED_HEADERS};
pub use request::Request;
pub use response::{AttachedError, Response, ResponseExt};
pub use upload::{FileInput, UploadErrorCode, UploadFile};
