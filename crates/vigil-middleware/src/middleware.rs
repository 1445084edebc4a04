//! The conformance-checking middleware.
//!
//! [`ConformanceMiddleware`] wraps a handler and observes every exchange
//! that passes through it: the request is checked against the contract
//! before the handler runs, the response is captured and checked after.
//! Violations only ever land in the [`IssueLog`]; the wrapped handler's
//! response reaches the caller byte-for-byte, and the handler runs exactly
//! once per exchange whatever the checks find.

use std::sync::Arc;

use http_body_util::Full;
use tracing::warn;
use vigil_contract::ContractRouter;

use crate::handler::HttpHandler;
use crate::issues::{ConformanceReport, IssueLog, ValidationIssue};
use crate::types::{collect_bytes, BoxFuture, Request, Response};

/// Middleware that validates exchanges against an API contract.
///
/// Built via [`Checker::middleware`](crate::Checker::middleware). The
/// contract router is shared read-only across middleware instances; each
/// instance owns its own issue log.
pub struct ConformanceMiddleware<H> {
    router: Arc<ContractRouter>,
    next: H,
    issues: IssueLog,
}

impl<H: HttpHandler> ConformanceMiddleware<H> {
    /// Wraps a handler with conformance checking against the given contract.
    pub fn new(router: Arc<ContractRouter>, next: H) -> Self {
        Self {
            router,
            next,
            issues: IssueLog::new(),
        }
    }

    /// Processes one exchange.
    ///
    /// Resolution or validation failures are appended to the issue log and
    /// never alter the exchange: the wrapped handler always runs with the
    /// original request, and its response is always returned unchanged.
    pub async fn handle(&self, request: Request) -> Response {
        let method = request.method().clone();
        let uri = request.uri().clone();

        let route = match self.router.resolve(method.as_str(), uri.path()) {
            Ok(route) => route,
            Err(err) => {
                warn!(method = %method, uri = %uri, error = %err, "route not found in contract");
                self.issues.append(ValidationIssue::new(
                    &method,
                    &uri,
                    format!("Route not found in specification: {err}"),
                ));
                // Nothing to validate against; forward untouched.
                return self.next.call(request).await;
            }
        };

        // Buffer the request body so it can be inspected and still reach
        // the handler unchanged.
        let (parts, body) = request.into_parts();
        let body_bytes = collect_bytes(body).await;

        if let Err(err) =
            self.router
                .check_request(&route, &parts.headers, parts.uri.query(), &body_bytes)
        {
            warn!(method = %method, uri = %uri, error = %err, "request does not conform");
            self.issues.append(ValidationIssue::new(
                &method,
                &uri,
                format!("Invalid request: {err}"),
            ));
            // Observational only; the exchange continues.
        }

        let request = Request::from_parts(parts, Full::new(body_bytes));
        let response = self.next.call(request).await;

        // Capture the full response, then replay the same parts and bytes
        // to the caller.
        let (parts, body) = response.into_parts();
        let body_bytes = collect_bytes(body).await;

        if !body_bytes.is_empty() {
            if let Err(err) = self.router.check_response(
                &route,
                parts.status.as_u16(),
                &parts.headers,
                &body_bytes,
            ) {
                warn!(method = %method, uri = %uri, error = %err, "response does not conform");
                self.issues.append(ValidationIssue::new(
                    &method,
                    &uri,
                    format!("Invalid response: {err}"),
                ));
            }
        }

        Response::from_parts(parts, Full::new(body_bytes))
    }

    /// The issue log for this middleware instance.
    pub fn issues(&self) -> &IssueLog {
        &self.issues
    }

    /// Collapses the issue log into a single aggregate failure.
    ///
    /// Returns `None` when every exchange so far conformed.
    pub fn summarize(&self) -> Option<ConformanceReport> {
        self.issues.summarize()
    }

    /// The shared contract router.
    pub fn router(&self) -> &Arc<ContractRouter> {
        &self.router
    }
}

impl<H: HttpHandler> HttpHandler for ConformanceMiddleware<H> {
    fn call(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(self.handle(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::FnHandler;
    use bytes::Bytes;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vigil_contract::DocumentLoader;

    fn test_router() -> Arc<ContractRouter> {
        let contract = DocumentLoader::from_json(
            r#"{
                "info": { "title": "t", "version": "1" },
                "paths": {
                    "/ping": {
                        "get": { "operationId": "ping", "responses": { "200": {} } }
                    }
                }
            }"#,
        )
        .unwrap();
        Arc::new(ContractRouter::with_defaults(contract))
    }

    fn ok_handler(invocations: Arc<AtomicUsize>) -> impl HttpHandler {
        FnHandler::new(move |_request: Request| {
            let invocations = invocations.clone();
            async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                http::Response::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            }
        })
    }

    fn request(method: &str, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_conformant_exchange_logs_nothing() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let middleware = ConformanceMiddleware::new(test_router(), ok_handler(invocations.clone()));

        let response = middleware.handle(request("GET", "/ping")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert!(middleware.summarize().is_none());
    }

    #[tokio::test]
    async fn test_unknown_route_still_forwards() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let middleware = ConformanceMiddleware::new(test_router(), ok_handler(invocations.clone()));

        let response = middleware.handle(request("GET", "/unknown")).await;
        assert_eq!(response.status(), StatusCode::OK);
        // The handler ran despite the missing route.
        assert_eq!(invocations.load(Ordering::SeqCst), 1);

        let issues = middleware.issues().snapshot();
        assert_eq!(issues.len(), 1);
        assert!(issues[0]
            .description
            .starts_with("Route not found in specification:"));
        assert_eq!(issues[0].method, "GET");
        assert_eq!(issues[0].uri, "/unknown");
    }

    #[tokio::test]
    async fn test_handler_runs_exactly_once_per_exchange() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let middleware = ConformanceMiddleware::new(test_router(), ok_handler(invocations.clone()));

        for _ in 0..3 {
            middleware.handle(request("GET", "/ping")).await;
        }
        assert_eq!(invocations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_body_skips_response_validation() {
        // 503 is not documented, but the empty body means the response is
        // never checked.
        let middleware = ConformanceMiddleware::new(
            test_router(),
            FnHandler::new(|_request: Request| async {
                http::Response::builder()
                    .status(StatusCode::SERVICE_UNAVAILABLE)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            }),
        );

        let response = middleware.handle(request("GET", "/ping")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(middleware.summarize().is_none());
    }

    #[tokio::test]
    async fn test_nonempty_body_checked_against_status() {
        let middleware = ConformanceMiddleware::new(
            test_router(),
            FnHandler::new(|_request: Request| async {
                http::Response::builder()
                    .status(StatusCode::SERVICE_UNAVAILABLE)
                    .body(Full::new(Bytes::from_static(b"oops")))
                    .unwrap()
            }),
        );

        let response = middleware.handle(request("GET", "/ping")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let issues = middleware.issues().snapshot();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].description.starts_with("Invalid response:"));
        assert!(issues[0].description.contains("status 503"));
    }
}
