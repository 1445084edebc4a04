//! The checker facade.
//!
//! A [`Checker`] owns one parsed contract and mints conformance
//! middleware instances around arbitrary handlers. Contract documents are
//! expensive to parse, so one checker is built per contract and its router
//! is shared read-only by every middleware it mints.

use std::path::Path;
use std::sync::Arc;

use vigil_contract::{Contract, ContractError, ContractRouter, DocumentLoader, ValidationConfig};

use crate::handler::HttpHandler;
use crate::middleware::ConformanceMiddleware;

/// Builds conformance middleware from one API contract.
#[derive(Debug, Clone)]
pub struct Checker {
    router: Arc<ContractRouter>,
}

impl Checker {
    /// Loads the contract document at `path` and builds a checker.
    ///
    /// A missing, unreadable, or invalid document fails here, once, at
    /// construction; nothing on the exchange path can raise it again.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let contract = DocumentLoader::from_file(path).await?;
        Ok(Self::new(contract))
    }

    /// Builds a checker from a contract document in a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        let contract = DocumentLoader::from_json(json)?;
        Ok(Self::new(contract))
    }

    /// Builds a checker from an already-loaded contract.
    pub fn new(contract: Contract) -> Self {
        Self::with_config(contract, ValidationConfig::default())
    }

    /// Builds a checker with a specific validation configuration.
    pub fn with_config(contract: Contract, config: ValidationConfig) -> Self {
        Self {
            router: Arc::new(ContractRouter::new(contract, config)),
        }
    }

    /// Wraps a handler with conformance checking.
    ///
    /// Every middleware minted from the same checker shares the parsed
    /// contract; each gets its own issue log.
    pub fn middleware<H: HttpHandler>(&self, next: H) -> ConformanceMiddleware<H> {
        ConformanceMiddleware::new(self.router.clone(), next)
    }

    /// The shared contract router.
    pub fn router(&self) -> &Arc<ContractRouter> {
        &self.router
    }
}
