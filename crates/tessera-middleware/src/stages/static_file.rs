//! Guard for static asset requests.
//!
//! Hidden paths (any segment starting with a dot) are refused. Served
//! assets are made readable cross-origin.

use http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use http::StatusCode;
use tessera_core::{RequestContext, TesseraResult};
use tessera_http::{response, Request, Response, ResponseExt};

use crate::middleware::{BoxFuture, Middleware, Next};

/// Body sent for refused hidden paths.
pub const FORBIDDEN_BODY: &str = "<h1>403 Forbidden</h1>";

/// Refuses hidden files and adds permissive CORS headers to static assets.
///
/// Registered in the default catalog as `static_file`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFileMiddleware;

impl Middleware for StaticFileMiddleware {
    fn name(&self) -> &'static str {
        "static_file"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, TesseraResult<Response>> {
        Box::pin(async move {
            if request.path().contains("/.") {
                tracing::debug!(path = request.path(), "refusing hidden static path");
                return Ok(response::response(FORBIDDEN_BODY, StatusCode::FORBIDDEN).with_header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/html; charset=utf-8"),
                ));
            }

            let mut response = next.run(ctx, request).await?;
            let headers = response.headers_mut();
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::handler_fn;
    use bytes::Bytes;
    use http_body_util::BodyExt;

    fn request(path: &str) -> Request {
        Request::new(http::Request::get(path).body(Bytes::new()).unwrap())
    }

    #[tokio::test]
    async fn test_hidden_path_is_forbidden() {
        let handler = handler_fn(|_req| async { Ok(response::html("secret")) });
        let mut ctx = RequestContext::new();
        let response = Next::new(&StaticFileMiddleware, Next::handler(&handler))
            .run(&mut ctx, request("/.env"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(FORBIDDEN_BODY.as_bytes()));
    }

    #[tokio::test]
    async fn test_adds_cors_headers() {
        let handler = handler_fn(|_req| async { Ok(response::html("body{}")) });
        let mut ctx = RequestContext::new();
        let response = Next::new(&StaticFileMiddleware, Next::handler(&handler))
            .run(&mut ctx, request("/css/site.css"))
            .await
            .unwrap();

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
    }

    #[tokio::test]
    async fn test_overwrites_handler_cors_headers() {
        let handler = handler_fn(|_req| async {
            Ok(response::html("x").with_header(
                ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("https://example.com"),
            ))
        });
        let mut ctx = RequestContext::new();
        let response = Next::new(&StaticFileMiddleware, Next::handler(&handler))
            .run(&mut ctx, request("/a.js"))
            .await
            .unwrap();

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            response
                .headers()
                .get_all("access-control-allow-origin")
                .iter()
                .count(),
            1
        );
    }
}
