//! # Tessera Test
//!
//! In-memory testing for Tessera: requests are handed to a
//! [`Dispatcher`](tessera_server::Dispatcher) directly, so tests cover
//! routing, middleware and error conversion without binding a port.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_test::TestClient;
//!
//! #[tokio::test]
//! async fn admin_home() {
//!     let client = TestClient::new(dispatcher);
//!
//!     client
//!         .get("/admin/index")
//!         .header("accept", "application/json")
//!         .send()
//!         .await
//!         .assert_status(http::StatusCode::OK)
//!         .assert_header("x-trace", "1");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequest;
pub use response::TestResponse;
