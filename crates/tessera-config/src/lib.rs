//! Typed configuration for Tessera workers.
//!
//! - TOML and JSON files, chosen by extension
//! - `.env` files via `dotenvy`
//! - `PREFIX__SECTION__KEY` environment overrides
//! - Validation before the worker starts
//!
//! # Configuration File Format
//!
//! ```toml
//! bootstrap = ["session"]
//!
//! [app]
//! debug = false
//! public_path = "public"
//!
//! [server]
//! listen = "0.0.0.0:8787"
//!
//! [middleware]
//! "@" = ["trace"]
//! "" = ["auth"]
//! "plugin.shop.admin" = ["admin_guard"]
//!
//! [static_files]
//! enable = true
//! middleware = ["static_file"]
//!
//! [exception]
//! dont_report = ["not_found"]
//!
//! [session]
//! handler = "file"
//! session_name = "TESSERASID"
//!
//! [plugin.shop]
//! bootstrap = ["shop_db"]
//!
//! [plugin.shop.middleware]
//! api = ["rate_limit"]
//! ```
//!
//! # Environment Overrides
//!
//! - `TESSERA__APP__DEBUG=true`
//! - `TESSERA__SERVER__LISTEN=127.0.0.1:9000`
//! - `TESSERA__LOGGING__LEVEL=debug`
//! - `TESSERA__METRICS__ENABLED=true`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TesseraConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
