//! Converting failures into responses.
//!
//! Business errors are rendered softly by [`render_business`] and never
//! reported. Everything else goes through an [`ExceptionHandler`], which
//! reports to an [`ErrorReporter`] and renders a JSON or HTML response
//! depending on what the client expects.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::StatusCode;
use parking_lot::Mutex;
use tessera_core::{ErrorBody, ErrorCategory, TesseraError, DEFAULT_ERROR_CODE};
use tessera_http::response;
use tessera_http::{Request, Response, ResponseExt};

/// Generic message shown when debug mode is off.
pub const GENERIC_ERROR_MESSAGE: &str = "Server internal error";

/// Receives formatted error reports. Fire-and-forget.
pub trait ErrorReporter: Send + Sync {
    /// Records one report.
    fn error(&self, message: &str);
}

/// Reports through `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn error(&self, message: &str) {
        tracing::error!(target: "tessera::exception", "{message}");
    }
}

/// Keeps reports in memory, for tests and diagnostics endpoints.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    messages: Mutex<Vec<String>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every report so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl ErrorReporter for MemoryReporter {
    fn error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Reports and renders non-business failures.
pub trait ExceptionHandler: Send + Sync {
    /// Reports `error`, unless its category is excluded. Never fails.
    fn report(&self, error: &TesseraError, request: Option<&Request>);

    /// Renders `error` for `request`.
    fn render(&self, request: &Request, error: &TesseraError) -> Response;
}

/// The stock [`ExceptionHandler`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tessera_core::ErrorCategory;
/// use tessera_server::{DefaultExceptionHandler, TracingReporter};
///
/// let handler = DefaultExceptionHandler::new(false, Arc::new(TracingReporter))
///     .dont_report([ErrorCategory::NotFound]);
/// assert!(!handler.is_debug());
/// ```
pub struct DefaultExceptionHandler {
    debug: bool,
    dont_report: Vec<ErrorCategory>,
    reporter: Arc<dyn ErrorReporter>,
}

impl DefaultExceptionHandler {
    /// Creates a handler reporting to `reporter`.
    #[must_use]
    pub fn new(debug: bool, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            debug,
            dont_report: Vec::new(),
            reporter,
        }
    }

    /// Adds categories that are never reported.
    #[must_use]
    pub fn dont_report(mut self, categories: impl IntoIterator<Item = ErrorCategory>) -> Self {
        self.dont_report.extend(categories);
        self
    }

    /// Returns `true` if error details are shown to clients.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    fn should_report(&self, error: &TesseraError) -> bool {
        !self.dont_report.contains(&error.category())
    }
}

impl std::fmt::Debug for DefaultExceptionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultExceptionHandler")
            .field("debug", &self.debug)
            .field("dont_report", &self.dont_report)
            .finish_non_exhaustive()
    }
}

impl ExceptionHandler for DefaultExceptionHandler {
    fn report(&self, error: &TesseraError, request: Option<&Request>) {
        if !self.should_report(error) {
            return;
        }

        let message = match request {
            Some(request) => format!(
                "{} {} {}\n{}",
                request.real_ip(true),
                request.method(),
                request.full_url().trim_matches('/'),
                error.detail()
            ),
            None => error.detail(),
        };
        self.reporter.error(&message);
    }

    fn render(&self, request: &Request, error: &TesseraError) -> Response {
        if request.expects_json() {
            let body = ErrorBody {
                code: error.code(),
                msg: if self.debug {
                    error.message().to_string()
                } else {
                    GENERIC_ERROR_MESSAGE.to_string()
                },
                traces: self.debug.then(|| error.detail()),
            };
            return json_body(&body);
        }

        let body = if self.debug {
            nl2br(&error.detail())
        } else {
            GENERIC_ERROR_MESSAGE.to_string()
        };
        let mut response = response::html(body);
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    }
}

/// Renders a business error. Always status 200.
///
/// JSON clients get `{"code": code, "msg": message}`, with a code of 0
/// replaced by 500; everyone else gets the bare message.
pub fn render_business(request: &Request, code: i64, message: &str) -> Response {
    if request.expects_json() {
        let code = if code == 0 { DEFAULT_ERROR_CODE } else { code };
        return json_body(&ErrorBody {
            code,
            msg: message.to_string(),
            traces: None,
        });
    }
    response::response(message.to_string(), StatusCode::OK)
}

fn json_body(body: &ErrorBody) -> Response {
    match response::json(body) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode error body");
            response::response(Bytes::new(), StatusCode::INTERNAL_SERVER_ERROR)
                .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        }
    }
}

/// Inserts `<br />` before every line break.
pub fn nl2br(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<br />\n");
        }
        out.push_str(line);
    }
    out
}
