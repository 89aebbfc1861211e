//! Route table construction errors.

use thiserror::Error;

/// Errors raised while building a [`Router`](crate::Router).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A `*wildcard` segment was followed by further segments.
    #[error("wildcard must be the last segment in route '{0}'")]
    WildcardNotLast(String),

    /// A `{param}` segment is unclosed or empty.
    #[error("invalid route pattern '{0}'")]
    InvalidPattern(String),
}
