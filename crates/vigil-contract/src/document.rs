//! Contract document loading.
//!
//! This module parses an OpenAPI-style JSON document into a [`Contract`]:
//! a flat list of operations optimized for route matching and conformance
//! checking. Only the subset of the document format that conformance
//! checking consumes is modeled; unknown fields are ignored.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{ContractError, ContractResult};

/// Methods recognized in a path item, in documentation order.
const METHODS: [&str; 7] = ["get", "put", "post", "delete", "patch", "head", "options"];

/// A loaded contract ready for runtime use.
#[derive(Debug, Clone)]
pub struct Contract {
    /// API title from the `info` block.
    pub title: String,
    /// API version from the `info` block.
    pub version: String,
    /// All documented operations, with server base paths applied.
    pub operations: Vec<Operation>,
    /// Named schemas from `components.schemas`.
    pub schemas: IndexMap<String, Schema>,
}

/// One documented operation.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Operation ID, or `<METHOD> <path>` when the document omits one.
    pub id: String,
    /// HTTP method (uppercase).
    pub method: String,
    /// Path template including the server base path (e.g. `/v1/pets/{petId}`).
    pub path: String,
    /// Declared parameters (path-item parameters merged in).
    pub parameters: Vec<Parameter>,
    /// Declared request body, if any.
    pub request_body: Option<BodySpec>,
    /// Declared responses, keyed by status code or `default`.
    pub responses: IndexMap<String, ResponseSpec>,
}

/// A declared operation parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter appears.
    pub location: ParameterLocation,
    /// Whether the parameter is required.
    pub required: bool,
    /// Declared schema, if any.
    pub schema: Option<Schema>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    /// Path segment parameter.
    Path,
    /// Query string parameter.
    Query,
    /// Header parameter.
    Header,
    /// Cookie parameter. Parsed into the model but not checked.
    Cookie,
}

/// A declared request body.
#[derive(Debug, Clone)]
pub struct BodySpec {
    /// Whether the body is required.
    pub required: bool,
    /// Media types to body schemas.
    pub content: IndexMap<String, Option<Schema>>,
}

/// A declared response.
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    /// Media types to body schemas. Empty when the response has no content.
    pub content: IndexMap<String, Option<Schema>>,
}

/// A schema as written in the document.
///
/// Supports the conformance-relevant subset: `$ref`, `type`, `required`,
/// `properties`, `items`, and `enum`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    /// Reference to a named schema (`#/components/schemas/<Name>`).
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Schema type (object, array, string, integer, number, boolean).
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
    /// Required fields (for objects).
    #[serde(default)]
    pub required: Vec<String>,
    /// Field schemas (for objects).
    #[serde(default)]
    pub properties: IndexMap<String, Schema>,
    /// Element schema (for arrays).
    pub items: Option<Box<Schema>>,
    /// Allowed values.
    #[serde(rename = "enum", default)]
    pub allowed_values: Vec<serde_json::Value>,
}

impl Contract {
    /// Finds an operation by ID.
    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    /// Follows `$ref` chains until a concrete schema is reached.
    ///
    /// Deref depth is bounded; dangling or cyclic references yield the
    /// last schema reached.
    pub fn resolve_schema<'a>(&'a self, schema: &'a Schema) -> &'a Schema {
        let mut current = schema;
        for _ in 0..8 {
            let Some(reference) = current.reference.as_deref() else {
                break;
            };
            match self.dereference(reference) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    fn dereference(&self, reference: &str) -> Option<&Schema> {
        reference
            .strip_prefix("#/components/schemas/")
            .and_then(|name| self.schemas.get(name))
    }
}

// ---------------------------------------------------------------------------
// Raw document shapes (serde)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawDocument {
    info: Option<RawInfo>,
    #[serde(default)]
    servers: Vec<RawServer>,
    #[serde(default)]
    paths: IndexMap<String, RawPathItem>,
    components: Option<RawComponents>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawPathItem {
    get: Option<RawOperation>,
    put: Option<RawOperation>,
    post: Option<RawOperation>,
    delete: Option<RawOperation>,
    patch: Option<RawOperation>,
    head: Option<RawOperation>,
    options: Option<RawOperation>,
    /// Parameters shared by every operation under this path.
    #[serde(default)]
    parameters: Vec<RawParameter>,
}

impl RawPathItem {
    fn operations(&self) -> impl Iterator<Item = (&'static str, &RawOperation)> {
        let slots = [
            &self.get,
            &self.put,
            &self.post,
            &self.delete,
            &self.patch,
            &self.head,
            &self.options,
        ];
        METHODS
            .into_iter()
            .zip(slots)
            .filter_map(|(method, slot)| slot.as_ref().map(|op| (method, op)))
    }
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    #[serde(rename = "operationId")]
    operation_id: Option<String>,
    #[serde(default)]
    parameters: Vec<RawParameter>,
    #[serde(rename = "requestBody")]
    request_body: Option<RawRequestBody>,
    #[serde(default)]
    responses: IndexMap<String, RawResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "in")]
    location: String,
    #[serde(default)]
    required: bool,
    schema: Option<Schema>,
}

#[derive(Debug, Deserialize)]
struct RawRequestBody {
    #[serde(default)]
    required: bool,
    #[serde(default)]
    content: IndexMap<String, RawMediaType>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawMediaType {
    schema: Option<Schema>,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    content: IndexMap<String, RawMediaType>,
}

#[derive(Debug, Deserialize)]
struct RawComponents {
    #[serde(default)]
    schemas: IndexMap<String, Schema>,
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Loads contract documents from files or JSON strings.
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a contract from a file.
    pub async fn from_file(path: impl AsRef<Path>) -> ContractResult<Contract> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading contract document");

        let content = fs::read_to_string(path).await.map_err(|e| {
            ContractError::DocumentLoad(format!(
                "failed to read contract file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Load a contract from a JSON string.
    pub fn from_json(json: &str) -> ContractResult<Contract> {
        let raw: RawDocument = serde_json::from_str(json)
            .map_err(|e| ContractError::DocumentParse(e.to_string()))?;

        let info = raw.info.unwrap_or_default();
        let base_paths = Self::base_paths(&raw.servers);

        let mut operations = Vec::new();
        for (template, item) in &raw.paths {
            for (method, op) in item.operations() {
                for base in &base_paths {
                    operations.push(Self::convert_operation(
                        method,
                        base,
                        template,
                        op,
                        &item.parameters,
                    ));
                }
            }
        }

        let schemas = raw
            .components
            .map(|c| c.schemas)
            .unwrap_or_default();

        debug!(
            title = info.title,
            version = info.version,
            operations = operations.len(),
            schemas = schemas.len(),
            "contract document loaded"
        );

        Ok(Contract {
            title: info.title,
            version: info.version,
            operations,
            schemas,
        })
    }

    /// Extracts the distinct path prefixes declared by the server list.
    fn base_paths(servers: &[RawServer]) -> Vec<String> {
        let mut bases: Vec<String> = Vec::new();
        for server in servers {
            let base = Self::url_path(&server.url);
            if !bases.contains(&base) {
                bases.push(base);
            }
        }
        if bases.is_empty() {
            bases.push(String::new());
        }
        bases
    }

    /// Returns the path component of a server URL, without a trailing slash.
    fn url_path(url: &str) -> String {
        let path = match url.find("://") {
            Some(idx) => {
                let after_scheme = &url[idx + 3..];
                match after_scheme.find('/') {
                    Some(slash) => &after_scheme[slash..],
                    None => "",
                }
            }
            None if url.starts_with('/') => url,
            None => "",
        };
        path.trim_end_matches('/').to_string()
    }

    fn convert_operation(
        method: &str,
        base: &str,
        template: &str,
        op: &RawOperation,
        shared_params: &[RawParameter],
    ) -> Operation {
        let method = method.to_uppercase();
        let path = format!("{base}{template}");
        let id = op
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{method} {path}"));

        let parameters = shared_params
            .iter()
            .chain(&op.parameters)
            .map(Self::convert_parameter)
            .collect();

        let request_body = op.request_body.as_ref().map(|body| BodySpec {
            required: body.required,
            content: Self::convert_content(&body.content),
        });

        let responses = op
            .responses
            .iter()
            .map(|(status, response)| {
                (
                    status.clone(),
                    ResponseSpec {
                        content: Self::convert_content(&response.content),
                    },
                )
            })
            .collect();

        Operation {
            id,
            method,
            path,
            parameters,
            request_body,
            responses,
        }
    }

    fn convert_parameter(param: &RawParameter) -> Parameter {
        let location = match param.location.as_str() {
            "path" => ParameterLocation::Path,
            "header" => ParameterLocation::Header,
            "cookie" => ParameterLocation::Cookie,
            _ => ParameterLocation::Query,
        };

        Parameter {
            name: param.name.clone(),
            location,
            // Path parameters are always required.
            required: param.required || location == ParameterLocation::Path,
            schema: param.schema.clone(),
        }
    }

    fn convert_content(
        content: &IndexMap<String, RawMediaType>,
    ) -> IndexMap<String, Option<Schema>> {
        content
            .iter()
            .map(|(media_type, media)| (media_type.clone(), media.schema.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETSTORE: &str = r##"{
        "openapi": "3.0.0",
        "info": { "title": "Petstore", "version": "1.0.0" },
        "servers": [{ "url": "http://petstore.example.com/v1" }],
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "parameters": [
                        { "name": "limit", "in": "query", "required": false,
                          "schema": { "type": "integer" } }
                    ],
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Pets" }
                                }
                            }
                        }
                    }
                },
                "post": {
                    "operationId": "createPets",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/NewPet" }
                            }
                        }
                    },
                    "responses": { "201": {} }
                }
            },
            "/pets/{petId}": {
                "parameters": [
                    { "name": "petId", "in": "path", "schema": { "type": "integer" } }
                ],
                "get": {
                    "operationId": "getPet",
                    "responses": { "200": {} }
                }
            }
        },
        "components": {
            "schemas": {
                "NewPet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } }
                },
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" }
                    }
                },
                "Pets": {
                    "type": "array",
                    "items": { "$ref": "#/components/schemas/Pet" }
                }
            }
        }
    }"##;

    #[test]
    fn test_load_petstore() {
        let contract = DocumentLoader::from_json(PETSTORE).unwrap();

        assert_eq!(contract.title, "Petstore");
        assert_eq!(contract.version, "1.0.0");
        assert_eq!(contract.operations.len(), 3);
        assert_eq!(contract.schemas.len(), 3);
    }

    #[test]
    fn test_server_base_path_applied() {
        let contract = DocumentLoader::from_json(PETSTORE).unwrap();

        let list = contract.operation("listPets").unwrap();
        assert_eq!(list.method, "GET");
        assert_eq!(list.path, "/v1/pets");
    }

    #[test]
    fn test_shared_path_parameters_merged() {
        let contract = DocumentLoader::from_json(PETSTORE).unwrap();

        let get_pet = contract.operation("getPet").unwrap();
        assert_eq!(get_pet.parameters.len(), 1);
        assert_eq!(get_pet.parameters[0].name, "petId");
        assert_eq!(get_pet.parameters[0].location, ParameterLocation::Path);
        // Path parameters are required even when the document omits the flag.
        assert!(get_pet.parameters[0].required);
    }

    #[test]
    fn test_request_body_content() {
        let contract = DocumentLoader::from_json(PETSTORE).unwrap();

        let create = contract.operation("createPets").unwrap();
        let body = create.request_body.as_ref().unwrap();
        assert!(body.required);
        assert!(body.content.contains_key("application/json"));
    }

    #[test]
    fn test_schema_deref() {
        let contract = DocumentLoader::from_json(PETSTORE).unwrap();

        let list = contract.operation("listPets").unwrap();
        let schema = list.responses["200"].content["application/json"]
            .as_ref()
            .unwrap();
        let resolved = contract.resolve_schema(schema);
        assert_eq!(resolved.schema_type.as_deref(), Some("array"));
    }

    #[test]
    fn test_missing_servers_defaults_to_root() {
        let json = r#"{
            "info": { "title": "t", "version": "1" },
            "paths": { "/ping": { "get": { "responses": { "200": {} } } } }
        }"#;
        let contract = DocumentLoader::from_json(json).unwrap();
        assert_eq!(contract.operations[0].path, "/ping");
        // No operationId in the document, so one is derived.
        assert_eq!(contract.operations[0].id, "GET /ping");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = DocumentLoader::from_json("not json");
        assert!(matches!(result, Err(ContractError::DocumentParse(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let result = DocumentLoader::from_file("/nonexistent/contract.json").await;
        assert!(matches!(result, Err(ContractError::DocumentLoad(_))));
    }
}
