//! Resolved middleware pipelines.
//!
//! A [`Pipeline`] is the ordered chain resolved for one namespace. Layers
//! are stored outermost first: the first layer sees the request first and
//! the response last.
//!
//! ```text
//! request → global → app-wide → app → handler
//!                                        ↓
//! response ← global ← app-wide ← app ←───┘
//! ```

use std::sync::Arc;

use tessera_core::{RequestContext, TesseraResult};
use tessera_http::{Request, Response};

use crate::middleware::{Handler, Middleware, Next};

/// A type-erased, shareable middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered chain of middleware wrapped around a handler per request.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tessera_middleware::{stages::StaticFileMiddleware, Pipeline};
///
/// let pipeline = Pipeline::new(vec![Arc::new(StaticFileMiddleware)]);
/// assert_eq!(pipeline.names(), vec!["static_file"]);
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    layers: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a pipeline from layers ordered outermost first.
    #[must_use]
    pub fn new(layers: Vec<BoxedMiddleware>) -> Self {
        Self { layers }
    }

    /// Appends an innermost layer.
    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.layers.push(middleware);
    }

    /// Runs `request` through every layer and then `handler`.
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        request: Request,
        handler: &dyn Handler,
    ) -> TesseraResult<Response> {
        let mut next = Next::handler(handler);
        for middleware in self.layers.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next.run(ctx, request).await
    }

    /// Returns the layers, outermost first.
    #[must_use]
    pub fn layers(&self) -> &[BoxedMiddleware] {
        &self.layers
    }

    /// Returns the layer names, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if there are no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("layers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{handler_fn, BoxFuture};
    use bytes::Bytes;
    use http::header::{HeaderName, HeaderValue};
    use parking_lot::Mutex;
    use tessera_http::{response, ResponseExt};

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Record {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, TesseraResult<Response>> {
            Box::pin(async move {
                self.log.lock().push(format!("before:{}", self.name));
                let response = next.run(ctx, request).await;
                self.log.lock().push(format!("after:{}", self.name));
                response
            })
        }
    }

    struct ShortCircuit;

    impl Middleware for ShortCircuit {
        fn name(&self) -> &'static str {
            "short"
        }

        fn process<'a>(
            &'a self,
            _ctx: &'a mut RequestContext,
            _request: Request,
            _next: Next<'a>,
        ) -> BoxFuture<'a, TesseraResult<Response>> {
            Box::pin(async {
                Ok(response::html("blocked")
                    .with_header(HeaderName::from_static("x-short"), HeaderValue::from_static("1")))
            })
        }
    }

    fn request() -> Request {
        Request::new(http::Request::get("/").body(Bytes::new()).unwrap())
    }

    #[tokio::test]
    async fn test_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(vec![
            Arc::new(Record { name: "a", log: Arc::clone(&log) }),
            Arc::new(Record { name: "b", log: Arc::clone(&log) }),
        ]);
        let handler_log = Arc::clone(&log);
        let handler = handler_fn(move |_req| {
            handler_log.lock().push("handler".to_string());
            async { Ok(response::html("OK")) }
        });

        let mut ctx = RequestContext::new();
        pipeline.run(&mut ctx, request(), &handler).await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["before:a", "before:b", "handler", "after:b", "after:a"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(vec![
            Arc::new(Record { name: "a", log: Arc::clone(&log) }),
            Arc::new(ShortCircuit),
        ]);
        let handler = handler_fn(|_req| async {
            Err(tessera_core::TesseraError::internal("handler must not run"))
        });

        let mut ctx = RequestContext::new();
        let response = pipeline.run(&mut ctx, request(), &handler).await.unwrap();

        assert_eq!(response.headers()["x-short"], "1");
        assert_eq!(*log.lock(), vec!["before:a", "after:a"]);
    }

    #[tokio::test]
    async fn test_empty_pipeline_runs_handler() {
        let pipeline = Pipeline::default();
        assert!(pipeline.is_empty());
        let handler = handler_fn(|_req| async { Ok(response::html("OK")) });
        let mut ctx = RequestContext::new();
        let response = pipeline.run(&mut ctx, request(), &handler).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
    }
}
