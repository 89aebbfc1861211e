//! Response helpers.
//!
//! | Helper | Content-Type | Status |
//! |---|---|---|
//! | [`response`] | none | caller |
//! | [`html`] | `text/html` | 200 |
//! | [`json`] | `application/json` | 200 |
//! | [`jsonp`] | `application/javascript` | 200 |
//! | [`xml`] | `text/xml` | 200 |
//! | [`redirect`] | none | 302 |
//! | [`file`] / [`download`] | by extension | 200 or 304 |

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use tessera_core::{TesseraError, TesseraResult};

use crate::request::Request;

/// The response type produced by handlers and middleware.
pub type Response = http::Response<Full<Bytes>>;

/// Builds a response with `body` and `status` and no headers.
#[must_use]
pub fn response(body: impl Into<Bytes>, status: StatusCode) -> Response {
    let mut response = http::Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

/// Builds a `200 OK` HTML response.
#[must_use]
pub fn html(body: impl Into<Bytes>) -> Response {
    response(body, StatusCode::OK).with_header(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    )
}

/// Builds a `200 OK` JSON response with compact encoding.
///
/// # Example
///
/// ```
/// use tessera_http::response::json;
///
/// let response = json(&serde_json::json!({"code": 0, "msg": "ok"})).unwrap();
/// assert_eq!(response.headers()["content-type"], "application/json");
/// ```
pub fn json<T: Serialize + ?Sized>(value: &T) -> TesseraResult<Response> {
    let body = serde_json::to_vec(value)?;
    Ok(response(body, StatusCode::OK).with_header(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    ))
}

/// Builds a JSONP response, `callback(json)`.
pub fn jsonp<T: Serialize + ?Sized>(value: &T, callback: &str) -> TesseraResult<Response> {
    let encoded = serde_json::to_string(value)?;
    Ok(response(format!("{callback}({encoded})"), StatusCode::OK).with_header(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/javascript"),
    ))
}

/// Builds a `200 OK` XML response.
#[must_use]
pub fn xml(body: impl Into<Bytes>) -> Response {
    response(body, StatusCode::OK)
        .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/xml"))
}

/// Builds a `302 Found` redirect.
pub fn redirect(location: &str) -> TesseraResult<Response> {
    redirect_with_status(location, StatusCode::FOUND)
}

/// Builds a redirect with a custom status.
pub fn redirect_with_status(location: &str, status: StatusCode) -> TesseraResult<Response> {
    let value = HeaderValue::try_from(location)
        .map_err(|_| TesseraError::internal(format!("Invalid redirect location: {location}")))?;
    Ok(response(Bytes::new(), status).with_header(header::LOCATION, value))
}

/// Serves a file.
///
/// Answers `304 Not Modified` with an empty body when `If-Modified-Since`
/// equals the file's formatted modification time. A missing file is a
/// [`TesseraError::File`] with code 404.
pub async fn file(request: &Request, path: impl AsRef<Path>) -> TesseraResult<Response> {
    let path = path.as_ref();
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(TesseraError::file_not_found(path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(TesseraError::file_not_found(path.display()))
        }
        Err(err) => return Err(TesseraError::file(path.display(), err)),
    };

    let last_modified = metadata.modified().ok().map(httpdate::fmt_http_date);
    if let (Some(modified), Some(since)) = (&last_modified, request.header("if-modified-since")) {
        if modified == since {
            return Ok(response(Bytes::new(), StatusCode::NOT_MODIFIED));
        }
    }

    let content = tokio::fs::read(path)
        .await
        .map_err(|err| TesseraError::file(path.display(), err))?;

    let mut response = response(content, StatusCode::OK).with_header(
        header::CONTENT_TYPE,
        HeaderValue::from_static(mime_for_path(path)),
    );
    if let Some(value) = last_modified.and_then(|lm| HeaderValue::try_from(lm).ok()) {
        response
            .headers_mut()
            .insert(header::LAST_MODIFIED, value);
    }
    Ok(response)
}

/// Serves a file as an attachment named `name`, or the file's own name.
pub async fn download(
    request: &Request,
    path: impl AsRef<Path>,
    name: Option<&str>,
) -> TesseraResult<Response> {
    let path = path.as_ref();
    let mut response = file(request, path).await?;
    if response.status() == StatusCode::NOT_MODIFIED {
        return Ok(response);
    }

    let name = name
        .map(ToString::to_string)
        .or_else(|| {
            path.file_name()
                .map(|file_name| file_name.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    let disposition = format!("attachment; filename=\"{}\"", name.replace('"', ""));
    if let Ok(value) = HeaderValue::try_from(disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// Returns the content type for a path by extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "text/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// An error attached to the response it produced, for outer layers to
/// inspect after the dispatcher rendered it.
#[derive(Debug, Clone)]
pub struct AttachedError(pub Arc<TesseraError>);

/// Extension methods on [`Response`].
pub trait ResponseExt: Sized {
    /// Attaches `error` to the response.
    fn attach_error(self, error: Arc<TesseraError>) -> Self;

    /// Returns the attached error, if any.
    fn attached_error(&self) -> Option<&TesseraError>;

    /// Sets a header, replacing any previous value.
    fn with_header(self, name: HeaderName, value: HeaderValue) -> Self;

    /// Adds a `Set-Cookie` header for `name=value` on path `/`.
    fn with_cookie(self, name: &str, value: &str) -> TesseraResult<Self>;
}

impl ResponseExt for Response {
    fn attach_error(mut self, error: Arc<TesseraError>) -> Self {
        self.extensions_mut().insert(AttachedError(error));
        self
    }

    fn attached_error(&self) -> Option<&TesseraError> {
        self.extensions()
            .get::<AttachedError>()
            .map(|attached| attached.0.as_ref())
    }

    fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers_mut().insert(name, value);
        self
    }

    fn with_cookie(mut self, name: &str, value: &str) -> TesseraResult<Self> {
        let cookie = HeaderValue::try_from(format!("{name}={value}; Path=/"))
            .map_err(|_| TesseraError::internal(format!("Invalid cookie: {name}")))?;
        self.headers_mut().append(header::SET_COOKIE, cookie);
        Ok(self)
    }
}
