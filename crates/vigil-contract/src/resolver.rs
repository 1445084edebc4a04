//! Route resolution from HTTP requests.
//!
//! This module maps an incoming method + path to a documented operation,
//! extracting path parameters along the way.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::document::Contract;
use crate::error::{ContractError, ContractResult};

/// Result of resolving an HTTP request to a documented operation.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Index of the operation in [`Contract::operations`].
    pub operation: usize,
    /// Operation ID.
    pub operation_id: String,
    /// HTTP method of the matched operation.
    pub method: String,
    /// Path template that was matched.
    pub path_template: String,
    /// Extracted path parameters.
    pub path_params: HashMap<String, String>,
}

/// Resolves HTTP requests to documented operations.
///
/// The resolver builds a routing table from the contract and matches
/// request paths against compiled templates, most specific first.
#[derive(Debug)]
pub struct OperationResolver {
    /// Routes indexed by HTTP method.
    routes: HashMap<String, Vec<CompiledRoute>>,
}

/// A compiled route for efficient matching.
#[derive(Debug)]
struct CompiledRoute {
    /// Original path template.
    template: String,
    /// Regex for matching paths.
    pattern: Regex,
    /// Parameter names in capture order.
    param_names: Vec<String>,
    /// Index of the operation in the contract.
    operation: usize,
    /// Operation ID.
    operation_id: String,
}

impl OperationResolver {
    /// Builds a resolver from a loaded contract.
    pub fn new(contract: &Contract) -> Self {
        let mut routes: HashMap<String, Vec<CompiledRoute>> = HashMap::new();

        for (index, op) in contract.operations.iter().enumerate() {
            if op.path.is_empty() {
                continue;
            }

            let (pattern, param_names) = Self::compile_path(&op.path);
            routes.entry(op.method.clone()).or_default().push(CompiledRoute {
                template: op.path.clone(),
                pattern,
                param_names,
                operation: index,
                operation_id: op.id.clone(),
            });
        }

        // More specific templates match first.
        for method_routes in routes.values_mut() {
            method_routes.sort_by(|a, b| Self::route_specificity(&b.template, &a.template));
        }

        debug!(
            methods = routes.len(),
            total_routes = routes.values().map(Vec::len).sum::<usize>(),
            "operation resolver initialized"
        );

        Self { routes }
    }

    /// Resolves a method + path to a documented operation.
    pub fn resolve(&self, method: &str, path: &str) -> ContractResult<RouteMatch> {
        let method_upper = method.to_uppercase();
        let routes = self
            .routes
            .get(&method_upper)
            .ok_or_else(|| ContractError::OperationNotFound {
                method: method.to_string(),
                path: path.to_string(),
            })?;

        for route in routes {
            if let Some(captures) = route.pattern.captures(path) {
                let mut path_params = HashMap::new();
                for (i, name) in route.param_names.iter().enumerate() {
                    if let Some(value) = captures.get(i + 1) {
                        path_params.insert(name.clone(), percent_decode(value.as_str(), false));
                    }
                }

                return Ok(RouteMatch {
                    operation: route.operation,
                    operation_id: route.operation_id.clone(),
                    method: method_upper,
                    path_template: route.template.clone(),
                    path_params,
                });
            }
        }

        Err(ContractError::OperationNotFound {
            method: method.to_string(),
            path: path.to_string(),
        })
    }

    /// Returns true if a route exists for the given method and path.
    pub fn has_route(&self, method: &str, path: &str) -> bool {
        self.resolve(method, path).is_ok()
    }

    fn compile_path(template: &str) -> (Regex, Vec<String>) {
        let mut pattern = String::from("^");
        let mut param_names = Vec::new();

        for segment in template.split('/') {
            if segment.is_empty() {
                continue;
            }

            pattern.push('/');

            if segment.starts_with('{') && segment.ends_with('}') {
                let name = &segment[1..segment.len() - 1];
                param_names.push(name.to_string());
                pattern.push_str("([^/]+)");
            } else {
                pattern.push_str(&regex::escape(segment));
            }
        }

        if template == "/" {
            pattern = String::from("^/$");
        } else {
            pattern.push_str("/?$");
        }

        let regex = Regex::new(&pattern).expect("valid regex");
        (regex, param_names)
    }

    /// Compares route specificity for sorting.
    /// Fewer parameters, then longer templates, come first.
    fn route_specificity(a: &str, b: &str) -> std::cmp::Ordering {
        let a_params = a.matches('{').count();
        let b_params = b.matches('{').count();

        if a_params != b_params {
            return a_params.cmp(&b_params);
        }

        b.len().cmp(&a.len())
    }
}

/// Decodes `%xx` escapes, and `+` as a space when `plus_as_space` is set
/// (query components only). Malformed escapes are left as written; decoded
/// bytes that are not valid UTF-8 leave the input unchanged.
pub(crate) fn percent_decode(input: &str, plus_as_space: bool) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' if plus_as_space => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi * 16 + lo) as u8);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}
