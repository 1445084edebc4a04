//! # Vigil Contract
//!
//! Contract handling for the Vigil conformance checker: loading an
//! OpenAPI-style document, resolving requests to documented operations,
//! and checking requests/responses against the contract.
//!
//! # Overview
//!
//! The crate exposes three pieces, tied together by [`ContractRouter`]:
//!
//! - [`DocumentLoader`] parses a contract document into a [`Contract`]
//! - [`OperationResolver`] maps method + path to a documented operation
//! - [`ConformanceEngine`] checks one side of an exchange against it
//!
//! # Example
//!
//! ```ignore
//! use vigil_contract::{ContractRouter, DocumentLoader, ValidationConfig};
//!
//! let contract = DocumentLoader::from_file("openapi.json").await?;
//! let router = ContractRouter::with_defaults(contract);
//!
//! let route = router.resolve("GET", "/v1/pets")?;
//! router.check_request(&route, &headers, None, b"")?;
//! ```

#![doc(html_root_url = "https://docs.rs/vigil-contract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod document;
pub mod error;
pub mod resolver;
pub mod validation;

// Re-exports for convenience
pub use config::ValidationConfig;
pub use document::{BodySpec, Contract, DocumentLoader, Operation, ParameterLocation, Schema};
pub use error::{ContractError, ContractResult, ValidationError, ValidationFailure};
pub use resolver::{OperationResolver, RouteMatch};
pub use validation::ConformanceEngine;

use http::HeaderMap;

/// A contract plus everything needed to check exchanges against it.
///
/// The router is immutable after construction and safe to share read-only
/// across concurrent exchanges.
#[derive(Debug)]
pub struct ContractRouter {
    contract: Contract,
    resolver: OperationResolver,
    engine: ConformanceEngine,
}

impl ContractRouter {
    /// Creates a router with the given validation configuration.
    pub fn new(contract: Contract, config: ValidationConfig) -> Self {
        let resolver = OperationResolver::new(&contract);
        let engine = ConformanceEngine::new(config);

        Self {
            contract,
            resolver,
            engine,
        }
    }

    /// Creates a router with the default configuration.
    pub fn with_defaults(contract: Contract) -> Self {
        Self::new(contract, ValidationConfig::default())
    }

    /// Resolves a method + path to a documented operation.
    pub fn resolve(&self, method: &str, path: &str) -> ContractResult<RouteMatch> {
        self.resolver.resolve(method, path)
    }

    /// Returns true if an operation exists for the given method and path.
    pub fn has_route(&self, method: &str, path: &str) -> bool {
        self.resolver.has_route(method, path)
    }

    /// Checks a request against the resolved operation.
    pub fn check_request(
        &self,
        route: &RouteMatch,
        headers: &HeaderMap,
        query: Option<&str>,
        body: &[u8],
    ) -> Result<(), ValidationFailure> {
        self.engine
            .check_request(&self.contract, route, headers, query, body)
    }

    /// Checks a captured response against the resolved operation.
    pub fn check_response(
        &self,
        route: &RouteMatch,
        status: u16,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), ValidationFailure> {
        self.engine
            .check_response(&self.contract, route, status, headers, body)
    }

    /// API title from the contract.
    pub fn title(&self) -> &str {
        &self.contract.title
    }

    /// API version from the contract.
    pub fn version(&self) -> &str {
        &self.contract.version
    }

    /// Number of documented operations.
    pub fn operation_count(&self) -> usize {
        self.contract.operations.len()
    }

    /// The underlying contract.
    pub fn contract(&self) -> &Contract {
        &self.contract
    }
}
