//! Error types for Tessera.
//!
//! [`TesseraError`] is the single error type that flows out of middleware and
//! handlers. The dispatcher catches it once, at the dispatch boundary, and
//! hands it to the exception handler.
//!
//! | Variant | Category | Numeric code |
//! |---|---|---|
//! | `Business` | `business` | carried code, `0` becomes `500` |
//! | `NotFound` | `not_found` | `404` |
//! | `File` | `file` | `404` for missing files, else `500` |
//! | `Config` | `config` | `500` |
//! | `Internal` | `internal` | carried code or `500` |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`TesseraError`].
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Numeric code used when an error carries none.
pub const DEFAULT_ERROR_CODE: i64 = 500;

/// Categories of errors, used to configure which failures are not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Expected, user-facing business rule violations.
    Business,
    /// A looked-up resource or service does not exist.
    NotFound,
    /// File access failures.
    File,
    /// Invalid configuration discovered at runtime.
    Config,
    /// Anything else.
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Business => "business",
            Self::NotFound => "not_found",
            Self::File => "file",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Standard error type for Tessera.
///
/// `Display` renders the bare message so it can be echoed to clients as-is.
/// Use [`TesseraError::detail`] for the message plus its cause chain.
///
/// # Example
///
/// ```
/// use tessera_core::{ErrorCategory, TesseraError};
///
/// let err = TesseraError::business(400, "quota exceeded");
/// assert_eq!(err.code(), 400);
/// assert_eq!(err.category(), ErrorCategory::Business);
/// assert_eq!(err.to_string(), "quota exceeded");
/// ```
#[derive(Error, Debug)]
pub enum TesseraError {
    /// An expected business rule violation, rendered softly.
    #[error("{message}")]
    Business {
        /// Application-defined code, echoed to JSON clients.
        code: i64,
        /// Message echoed to the client.
        message: String,
    },

    /// A resource or service was not found.
    #[error("{message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// A file could not be read or written.
    #[error("{message}")]
    File {
        /// Human-readable error message.
        message: String,
        /// Whether the file does not exist.
        missing: bool,
        /// The underlying I/O error.
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration is invalid.
    #[error("{message}")]
    Config {
        /// Human-readable error message.
        message: String,
    },

    /// Any other failure.
    #[error("{message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// Optional numeric code carried to the client.
        code: Option<i64>,
        /// The underlying error (not exposed to clients outside debug mode).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl TesseraError {
    /// Creates a business error.
    #[must_use]
    pub fn business(code: i64, message: impl Into<String>) -> Self {
        Self::Business {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a file error for a path that does not exist.
    #[must_use]
    pub fn file_not_found(path: impl std::fmt::Display) -> Self {
        Self::File {
            message: format!("File not found: {path}"),
            missing: true,
            source: None,
        }
    }

    /// Creates a file error from an I/O failure on `path`.
    #[must_use]
    pub fn file(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::File {
            message: format!("{path}: {source}"),
            missing: source.kind() == std::io::ErrorKind::NotFound,
            source: Some(source),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            code: None,
            source: None,
        }
    }

    /// Creates an internal error carrying a numeric code.
    #[must_use]
    pub fn internal_with_code(code: i64, message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            code: Some(code),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            code: None,
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Business { .. } => ErrorCategory::Business,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::File { .. } => ErrorCategory::File,
            Self::Config { .. } => ErrorCategory::Config,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns `true` for business errors.
    #[must_use]
    pub const fn is_business(&self) -> bool {
        matches!(self, Self::Business { .. })
    }

    /// Returns the numeric code carried to clients.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::Business { code, .. } if *code != 0 => *code,
            Self::Internal {
                code: Some(code), ..
            } if *code != 0 => *code,
            Self::NotFound { .. } | Self::File { missing: true, .. } => 404,
            _ => DEFAULT_ERROR_CODE,
        }
    }

    /// Returns the bare message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Business { message, .. }
            | Self::NotFound { message }
            | Self::File { message, .. }
            | Self::Config { message }
            | Self::Internal { message, .. } => message,
        }
    }

    /// Returns the message followed by every cause, one per line.
    #[must_use]
    pub fn detail(&self) -> String {
        let mut out = format!("{} [{}]", self.message(), self.category());
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str("\nCaused by: ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

impl From<std::io::Error> for TesseraError {
    fn from(err: std::io::Error) -> Self {
        Self::File {
            message: err.to_string(),
            missing: err.kind() == std::io::ErrorKind::NotFound,
            source: Some(err),
        }
    }
}

impl From<anyhow::Error> for TesseraError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            code: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal_with_source("JSON error", err)
    }
}

/// The `{code, msg}` body sent to JSON-expecting clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Semantic status carried in the body.
    pub code: i64,
    /// Message shown to the client.
    pub msg: String,
    /// Full error detail, present in debug mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traces: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_error() {
        let error = TesseraError::business(400, "quota exceeded");
        assert_eq!(error.category(), ErrorCategory::Business);
        assert!(error.is_business());
        assert_eq!(error.code(), 400);
        assert_eq!(error.message(), "quota exceeded");
    }

    #[test]
    fn test_zero_code_defaults_to_500() {
        assert_eq!(TesseraError::business(0, "x").code(), 500);
        assert_eq!(TesseraError::internal_with_code(0, "x").code(), 500);
        assert_eq!(TesseraError::internal("x").code(), 500);
    }

    #[test]
    fn test_internal_with_code() {
        let error = TesseraError::internal_with_code(503, "maintenance");
        assert_eq!(error.code(), 503);
        assert_eq!(error.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_io_not_found_maps_to_missing_file() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = TesseraError::from(io);
        assert_eq!(error.category(), ErrorCategory::File);
        assert_eq!(error.code(), 404);
    }

    #[test]
    fn test_io_other_maps_to_500() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(TesseraError::file("/etc/shadow", io).code(), 500);
    }

    #[test]
    fn test_detail_includes_cause_chain() {
        let root = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let error = TesseraError::internal_with_source("could not save", root);
        let detail = error.detail();
        assert!(detail.starts_with("could not save [internal]"));
        assert!(detail.contains("Caused by: disk on fire"));
    }

    #[test]
    fn test_anyhow_conversion_keeps_message() {
        let error: TesseraError = anyhow::anyhow!("boom").into();
        assert_eq!(error.message(), "boom");
        assert_eq!(error.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_error_body_serialization_omits_traces() {
        let body = ErrorBody {
            code: 400,
            msg: "quota exceeded".to_string(),
            traces: None,
        };
        let json = serde_json::to_string(&body).expect("serialization should work");
        assert_eq!(json, r#"{"code":400,"msg":"quota exceeded"}"#);
    }

    #[test]
    fn test_category_serde_names() {
        let json = serde_json::to_string(&ErrorCategory::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        let parsed: ErrorCategory = serde_json::from_str("\"business\"").unwrap();
        assert_eq!(parsed, ErrorCategory::Business);
    }
}
