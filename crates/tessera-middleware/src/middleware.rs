//! Core middleware and handler traits.
//!
//! A [`Middleware`] receives the request context, the request and a
//! [`Next`] continuation. It may run code before and after the inner layers
//! (onion style), short-circuit by not calling `next`, or rewrite the
//! response it gets back. A [`Handler`] is the terminal of a chain.
//!
//! # Example
//!
//! ```
//! use tessera_middleware::{BoxFuture, Middleware, Next};
//! use tessera_core::{RequestContext, TesseraResult};
//! use tessera_http::{Request, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, TesseraResult<Response>> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await?;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "request finished");
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use tessera_core::{RequestContext, TesseraResult};
use tessera_http::{Request, Response};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One unit of the onion pipeline.
///
/// # Invariants
///
/// - `next.run()` is called at most once; not calling it short-circuits
/// - Errors from inner layers propagate unless the middleware handles them
pub trait Middleware: Send + Sync + 'static {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Processes the request, usually by delegating to `next`.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, TesseraResult<Response>>;
}

/// The terminal of a pipeline: a controller action, the not-found page or
/// the static file server.
pub trait Handler: Send + Sync + 'static {
    /// Produces the response for `request`.
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, TesseraResult<Response>>;
}

/// Continuation to the rest of the chain.
///
/// Consumed by [`run`](Self::run), so it can only be invoked once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(&'a dyn Handler),
}

impl<'a> Next<'a> {
    /// Wraps `next` with `middleware`.
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal continuation invoking `handler`.
    pub fn handler(handler: &'a dyn Handler) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Invokes the next middleware, or the handler at the end of the chain.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> TesseraResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                middleware.process(ctx, request, *next).await
            }
            NextInner::Handler(handler) => handler.call(ctx, request).await,
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => f
                .debug_struct("Next")
                .field("middleware", &middleware.name())
                .finish_non_exhaustive(),
            NextInner::Handler(_) => f.write_str("Next::Handler"),
        }
    }
}

/// A middleware defined by a closure.
///
/// # Example
///
/// ```
/// use http::HeaderValue;
/// use tessera_middleware::FnMiddleware;
///
/// let trace = FnMiddleware::new("trace", |ctx, request, next| {
///     Box::pin(async move {
///         let mut response = next.run(ctx, request).await?;
///         response.headers_mut().insert("x-trace", HeaderValue::from_static("1"));
///         Ok(response)
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut RequestContext,
            Request,
            Next<'a>,
        ) -> BoxFuture<'a, TesseraResult<Response>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a closure-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut RequestContext,
            Request,
            Next<'a>,
        ) -> BoxFuture<'a, TesseraResult<Response>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, TesseraResult<Response>> {
        (self.func)(ctx, request, next)
    }
}

/// A handler that ignores the context, see [`handler_fn`].
pub struct HandlerFn<F> {
    func: F,
}

/// Wraps an async closure taking the request as a [`Handler`].
///
/// # Example
///
/// ```
/// use tessera_middleware::handler_fn;
/// use tessera_http::response;
///
/// let hello = handler_fn(|_request| async { Ok(response::html("hello")) });
/// ```
pub fn handler_fn<F, Fut>(func: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TesseraResult<Response>> + Send + 'static,
{
    HandlerFn { func }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TesseraResult<Response>> + Send + 'static,
{
    fn call<'a>(
        &'a self,
        _ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, TesseraResult<Response>> {
        Box::pin((self.func)(request))
    }
}
