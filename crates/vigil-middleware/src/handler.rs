//! Handler trait for request processing.
//!
//! [`HttpHandler`] is the request-handling capability the middleware both
//! wraps and presents: anything that turns a [`Request`] into a
//! [`Response`]. `ConformanceMiddleware` implements it too, so checked
//! handlers compose into a chain like any other handler.

use std::future::Future;
use std::sync::Arc;

use crate::types::{BoxFuture, Request, Response};

/// A component that handles HTTP requests.
///
/// Handlers are invoked from concurrent exchanges and must be shareable
/// by reference.
pub trait HttpHandler: Send + Sync + 'static {
    /// Handles one request and produces a response.
    fn call(&self, request: Request) -> BoxFuture<'_, Response>;
}

impl<H: HttpHandler> HttpHandler for Arc<H> {
    fn call(&self, request: Request) -> BoxFuture<'_, Response> {
        (**self).call(request)
    }
}

/// A handler built from an async function or closure.
///
/// # Example
///
/// ```ignore
/// let handler = FnHandler::new(|_request| async {
///     http::Response::builder()
///         .status(200)
///         .body(Full::new(Bytes::from("ok")))
///         .unwrap()
/// });
/// ```
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Wraps a function as a handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> HttpHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin((self.func)(request))
    }
}
