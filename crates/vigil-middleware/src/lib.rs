//! # Vigil Middleware
//!
//! Conformance-checking interception layer for HTTP handler chains.
//!
//! The middleware sits in front of a handler and observes every exchange:
//! the request is matched against an API contract and checked before the
//! handler runs; the response is captured, replayed byte-for-byte to the
//! caller, and checked after. Violations never change the traffic; they
//! accumulate in an issue log that a test harness or operator inspects
//! once, after the fact.
//!
//! ```text
//! Request → resolve → check request → Handler → capture → replay → check response
//!                │              │                                       │
//!                └──────────────┴──────────── Issue Log ────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use vigil_middleware::{Checker, FnHandler};
//!
//! let checker = Checker::from_file("openapi.json").await?;
//! let middleware = checker.middleware(my_handler);
//!
//! // ... drive traffic through `middleware.handle(request)` ...
//!
//! if let Some(report) = middleware.summarize() {
//!     panic!("{report}");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/vigil-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod checker;
pub mod handler;
pub mod issues;
pub mod middleware;
pub mod types;

// Re-export main types at crate root
pub use checker::Checker;
pub use handler::{FnHandler, HttpHandler};
pub use issues::{ConformanceReport, IssueLog, ValidationIssue};
pub use middleware::ConformanceMiddleware;
pub use types::{BoxFuture, Request, Response};
