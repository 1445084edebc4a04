//! Request and response conformance checking.
//!
//! The [`ConformanceEngine`] checks one side of an HTTP exchange against
//! the documented operation it resolved to. Checks are pure: the only
//! output is a [`ValidationFailure`] describing what did not conform.

use std::collections::HashMap;

use http::HeaderMap;
use serde_json::Value;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::document::{Contract, Operation, ParameterLocation, Schema};
use crate::error::{ValidationError, ValidationFailure};
use crate::resolver::{percent_decode, RouteMatch};

/// Maximum schema recursion depth.
const MAX_DEPTH: usize = 32;

/// Checks requests and responses against a contract.
#[derive(Debug)]
pub struct ConformanceEngine {
    config: ValidationConfig,
}

impl ConformanceEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Checks a request against the operation it resolved to.
    ///
    /// Covers path parameter types, required query and header parameters,
    /// the `Content-Type` header of the request body, and the body itself
    /// when it is JSON. Path and query values are percent-decoded before
    /// type checks.
    pub fn check_request(
        &self,
        contract: &Contract,
        route: &RouteMatch,
        headers: &HeaderMap,
        query: Option<&str>,
        body: &[u8],
    ) -> Result<(), ValidationFailure> {
        if !self.config.validate_requests {
            return Ok(());
        }

        let op = &contract.operations[route.operation];
        let mut errors = Vec::new();

        self.check_path_params(contract, op, &route.path_params, &mut errors);
        self.check_query_params(contract, op, query, &mut errors);
        self.check_header_params(contract, op, headers, &mut errors);
        self.check_request_body(contract, op, headers, body, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::new(errors))
        }
    }

    /// Checks a captured response against the operation its request
    /// resolved to.
    ///
    /// The status code must be documented (exactly or as `default`); when
    /// the documented response declares content, the `Content-Type` header
    /// must match and a JSON body is checked against its schema.
    pub fn check_response(
        &self,
        contract: &Contract,
        route: &RouteMatch,
        status: u16,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), ValidationFailure> {
        if !self.config.validate_responses {
            return Ok(());
        }

        let op = &contract.operations[route.operation];
        let mut errors = Vec::new();

        let spec = op
            .responses
            .get(&status.to_string())
            .or_else(|| op.responses.get("default"));

        match spec {
            None => {
                errors.push(ValidationError::message(format!(
                    "status {} is not documented for operation '{}'",
                    status, op.id
                )));
            }
            Some(spec) if spec.content.is_empty() => {
                // Documented response without declared content; nothing to
                // check the body against.
                debug!(operation = op.id, status, "no content declared for status");
            }
            Some(spec) => {
                let content_type = content_type_of(headers);
                match spec.content.get(&content_type) {
                    None => {
                        errors.push(ValidationError::message(format!(
                            "header 'Content-Type' has unexpected value: \"{content_type}\""
                        )));
                    }
                    Some(schema) => {
                        self.check_json_body(contract, &content_type, schema.as_ref(), body, &mut errors);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::new(errors))
        }
    }

    fn check_path_params(
        &self,
        contract: &Contract,
        op: &Operation,
        path_params: &HashMap<String, String>,
        errors: &mut Vec<ValidationError>,
    ) {
        for param in &op.parameters {
            if param.location != ParameterLocation::Path {
                continue;
            }

            match path_params.get(&param.name) {
                Some(value) => {
                    if let Some(schema) = &param.schema {
                        let schema = contract.resolve_schema(schema);
                        if !param_matches_type(value, schema) {
                            errors.push(ValidationError::new(
                                format!("path.{}", param.name),
                                format!(
                                    "expected {}, got '{}'",
                                    schema.schema_type.as_deref().unwrap_or("string"),
                                    value
                                ),
                            ));
                        }
                    }
                }
                None => {
                    errors.push(ValidationError::new(
                        format!("path.{}", param.name),
                        format!("missing required path parameter '{}'", param.name),
                    ));
                }
            }
        }
    }

    fn check_query_params(
        &self,
        contract: &Contract,
        op: &Operation,
        query: Option<&str>,
        errors: &mut Vec<ValidationError>,
    ) {
        let query_params = parse_query(query);

        for param in &op.parameters {
            if param.location != ParameterLocation::Query {
                continue;
            }

            match query_params.get(&param.name) {
                Some(value) => {
                    if let Some(schema) = &param.schema {
                        let schema = contract.resolve_schema(schema);
                        if !param_matches_type(value, schema) {
                            errors.push(ValidationError::new(
                                format!("query.{}", param.name),
                                format!(
                                    "expected {}, got '{}'",
                                    schema.schema_type.as_deref().unwrap_or("string"),
                                    value
                                ),
                            ));
                        }
                    }
                }
                None if param.required => {
                    errors.push(ValidationError::new(
                        format!("query.{}", param.name),
                        format!("missing required query parameter '{}'", param.name),
                    ));
                }
                None => {}
            }
        }
    }

    fn check_header_params(
        &self,
        contract: &Contract,
        op: &Operation,
        headers: &HeaderMap,
        errors: &mut Vec<ValidationError>,
    ) {
        for param in &op.parameters {
            if param.location != ParameterLocation::Header {
                continue;
            }

            // HeaderMap lookups are case-insensitive.
            match headers.get(param.name.as_str()).and_then(|v| v.to_str().ok()) {
                Some(value) => {
                    if let Some(schema) = &param.schema {
                        let schema = contract.resolve_schema(schema);
                        if !param_matches_type(value, schema) {
                            errors.push(ValidationError::new(
                                format!("header.{}", param.name),
                                format!(
                                    "expected {}, got '{}'",
                                    schema.schema_type.as_deref().unwrap_or("string"),
                                    value
                                ),
                            ));
                        }
                    }
                }
                None if param.required => {
                    errors.push(ValidationError::new(
                        format!("header.{}", param.name),
                        format!("missing required header parameter '{}'", param.name),
                    ));
                }
                None => {}
            }
        }
    }

    fn check_request_body(
        &self,
        contract: &Contract,
        op: &Operation,
        headers: &HeaderMap,
        body: &[u8],
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(body_spec) = &op.request_body else {
            return;
        };

        if body.is_empty() {
            if body_spec.required {
                errors.push(ValidationError::message("request body is required"));
            }
            return;
        }

        let content_type = content_type_of(headers);
        match body_spec.content.get(&content_type) {
            None => {
                errors.push(ValidationError::message(format!(
                    "header 'Content-Type' has unexpected value: \"{content_type}\""
                )));
            }
            Some(schema) => {
                self.check_json_body(contract, &content_type, schema.as_ref(), body, errors);
            }
        }
    }

    /// Parses and schema-checks a body when its media type is JSON.
    fn check_json_body(
        &self,
        contract: &Contract,
        content_type: &str,
        schema: Option<&Schema>,
        body: &[u8],
        errors: &mut Vec<ValidationError>,
    ) {
        if !is_json_media_type(content_type) {
            return;
        }

        let value: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                errors.push(ValidationError::new("body", format!("invalid JSON: {e}")));
                return;
            }
        };

        if let Some(schema) = schema {
            self.check_value(contract, schema, &value, "body", errors, 0);
        }
    }

    fn check_value(
        &self,
        contract: &Contract,
        schema: &Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
        depth: usize,
    ) {
        if depth > MAX_DEPTH {
            return;
        }

        let schema = contract.resolve_schema(schema);

        // Null is accepted for any type.
        if value.is_null() {
            return;
        }

        if !schema.allowed_values.is_empty() && !schema.allowed_values.contains(value) {
            errors.push(ValidationError::new(
                path,
                format!("value {value} is not one of the allowed values"),
            ));
        }

        match schema.schema_type.as_deref() {
            Some("object") => {
                let Some(obj) = value.as_object() else {
                    errors.push(ValidationError::new(path, "expected object"));
                    return;
                };

                for required in &schema.required {
                    if !obj.contains_key(required) {
                        errors.push(ValidationError::new(
                            join_path(path, required),
                            format!("missing required field '{required}'"),
                        ));
                    }
                }

                for (name, field_schema) in &schema.properties {
                    if let Some(field_value) = obj.get(name) {
                        self.check_value(
                            contract,
                            field_schema,
                            field_value,
                            &join_path(path, name),
                            errors,
                            depth + 1,
                        );
                    }
                }
            }
            Some("array") => {
                let Some(items) = value.as_array() else {
                    errors.push(ValidationError::new(path, "expected array"));
                    return;
                };

                if let Some(item_schema) = &schema.items {
                    for (i, item) in items.iter().enumerate() {
                        self.check_value(
                            contract,
                            item_schema,
                            item,
                            &format!("{path}[{i}]"),
                            errors,
                            depth + 1,
                        );
                    }
                }
            }
            Some("string") => {
                if !value.is_string() {
                    errors.push(ValidationError::new(path, "expected string"));
                }
            }
            Some("integer") => {
                if !value.is_i64() && !value.is_u64() {
                    errors.push(ValidationError::new(path, "expected integer"));
                }
            }
            Some("number") => {
                if !value.is_number() {
                    errors.push(ValidationError::new(path, "expected number"));
                }
            }
            Some("boolean") => {
                if !value.is_boolean() {
                    errors.push(ValidationError::new(path, "expected boolean"));
                }
            }
            Some(other) => {
                debug!(schema_type = other, "unknown schema type");
            }
            None => {}
        }
    }
}

/// Returns the media type of the `Content-Type` header, without parameters.
fn content_type_of(headers: &HeaderMap) -> String {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

fn is_json_media_type(media_type: &str) -> bool {
    media_type == "application/json" || media_type.ends_with("+json")
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = query {
        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.insert(percent_decode(name, true), percent_decode(value, true));
        }
    }
    params
}

fn join_path(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

fn param_matches_type(value: &str, schema: &Schema) -> bool {
    match schema.schema_type.as_deref() {
        Some("integer") => value.parse::<i64>().is_ok(),
        Some("number") => value.parse::<f64>().is_ok(),
        Some("boolean") => value == "true" || value == "false",
        _ => true,
    }
}
