//! Built-in middleware.

pub mod static_file;

pub use static_file::StaticFileMiddleware;
