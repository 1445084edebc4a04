//! Validation behavior configuration.

use serde::{Deserialize, Serialize};

/// Configuration for conformance checking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Whether to check incoming requests.
    pub validate_requests: bool,
    /// Whether to check captured responses.
    pub validate_responses: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_requests: true,
            validate_responses: true,
        }
    }
}

impl ValidationConfig {
    /// A configuration that checks nothing.
    pub fn permissive() -> Self {
        Self {
            validate_requests: false,
            validate_responses: false,
        }
    }

    /// A configuration that checks requests only.
    pub fn request_only() -> Self {
        Self {
            validate_requests: true,
            validate_responses: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_checks_both_sides() {
        let config = ValidationConfig::default();
        assert!(config.validate_requests);
        assert!(config.validate_responses);
    }

    #[test]
    fn test_permissive_checks_nothing() {
        let config = ValidationConfig::permissive();
        assert!(!config.validate_requests);
        assert!(!config.validate_responses);
    }
}
