//! # Vigil
//!
//! **Conformance-checking middleware for HTTP handler chains**
//!
//! Vigil wraps an HTTP handler and validates every exchange against an
//! OpenAPI-style contract without altering the traffic:
//!
//! - requests are matched to documented operations and checked before the
//!   handler runs,
//! - responses are captured, replayed byte-for-byte, and checked after,
//! - every violation lands in an append-only issue log that a test
//!   harness inspects once via [`ConformanceMiddleware::summarize`].
//!
//! Non-conformant traffic is never rewritten, rejected, or
//! short-circuited; validation is purely observational.
//!
//! ## Quick start
//!
//! ```ignore
//! use vigil::{Checker, FnHandler};
//!
//! let checker = Checker::from_file("openapi.json").await?;
//! let middleware = checker.middleware(app_handler);
//!
//! // ... drive traffic through `middleware.handle(request)` ...
//!
//! if let Some(report) = middleware.summarize() {
//!     eprintln!("{report}");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/vigil/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export contract handling
pub use vigil_contract as contract;

// Re-export the middleware API at the crate root
pub use vigil_middleware::{
    BoxFuture, Checker, ConformanceMiddleware, ConformanceReport, FnHandler, HttpHandler,
    IssueLog, Request, Response, ValidationIssue,
};
