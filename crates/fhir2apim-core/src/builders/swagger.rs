//! Swagger 2.0 projection of planned operations.

// Internal imports (std, crate)
use std::collections::{BTreeMap, BTreeSet};

use super::OperationBuilder;
use crate::capability::CapabilityDocument;
use crate::coercion::PrimitiveType;
use crate::operation::{HttpMethod, OperationShape, ResponsePolicy};

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use url::Url;

pub const SWAGGER_VERSION: &str = "2.0";

/// Path of the conformance statement endpoint every FHIR server exposes
pub const METADATA_PATH: &str = "/metadata";

/// Type definitions keyed by resource type name
pub type Definitions = JsonMap<String, JsonValue>;

/// Root of the generated Swagger document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebApiDocument {
    pub swagger: String,
    pub host: String,
    pub base_path: String,
    pub schemes: Vec<String>,
    pub info: Info,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Operations available on a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
        }
    }

    fn set(&mut self, method: HttpMethod, operation: Operation) {
        let slot = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
        };
        *slot = Some(operation);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<String, Response>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Path,
    Body,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<PrimitiveType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonValue>,
    #[serde(
        rename = "x-consoleDefault",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub console_default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonValue>,
}

impl Response {
    fn success(schema: Option<JsonValue>) -> BTreeMap<String, Response> {
        BTreeMap::from([(
            "200".to_string(),
            Response {
                description: "Success".to_string(),
                schema,
            },
        )])
    }
}

impl WebApiDocument {
    /// Skeleton for a FHIR server: host, base path, scheme and `/metadata`
    pub fn new(server: &Url) -> Self {
        let host = match (server.host_str(), server.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        let base_path = match server.path().trim_end_matches('/') {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        let metadata = Operation {
            summary: Some("Get conformance statement.".to_string()),
            produces: vec![
                "application/json".to_string(),
                "application/xml".to_string(),
            ],
            parameters: Vec::new(),
            responses: Response::success(None),
        };

        Self {
            swagger: SWAGGER_VERSION.to_string(),
            host,
            base_path,
            schemes: vec![server.scheme().to_string()],
            info: Info::default(),
            paths: BTreeMap::from([(
                METADATA_PATH.to_string(),
                PathItem {
                    get: Some(metadata),
                    ..Default::default()
                },
            )]),
            definitions: None,
        }
    }

    /// Copy title, description and version from the capability statement
    pub fn apply_info(&mut self, capability: &CapabilityDocument) {
        self.info = Info {
            title: capability.publisher.clone(),
            description: capability.implementation_description.clone(),
            version: capability.fhir_version.clone(),
        };
    }

    /// File a built operation under its path
    pub fn insert(&mut self, fragment: SwaggerFragment) {
        self.paths
            .entry(fragment.path)
            .or_default()
            .set(fragment.method, fragment.operation);
    }

    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path)?.operation(method)
    }
}

/// One operation ready to be filed under `paths`
#[derive(Debug, Clone, PartialEq)]
pub struct SwaggerFragment {
    pub path: String,
    pub method: HttpMethod,
    pub operation: Operation,
}

/// Builds Swagger operations.
///
/// Resource bodies and responses reference `#/definitions/{type}` only for
/// types present in the merged definitions; other types fall back to a
/// generic object body and a bare success response.
#[derive(Debug, Clone, Default)]
pub struct SwaggerOperationBuilder {
    defined: BTreeSet<String>,
}

impl SwaggerOperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that references every type named in `definitions`
    pub fn with_definitions(definitions: &Definitions) -> Self {
        Self {
            defined: definitions.keys().cloned().collect(),
        }
    }

    fn definition_ref(&self, resource_type: &str) -> Option<JsonValue> {
        self.defined
            .contains(resource_type)
            .then(|| json!({ "$ref": format!("#/definitions/{}", resource_type) }))
    }
}

impl OperationBuilder for SwaggerOperationBuilder {
    type Fragment = SwaggerFragment;

    fn build(
        &self,
        shape: &OperationShape,
        _previous: Option<&SwaggerFragment>,
    ) -> SwaggerFragment {
        let mut parameters = Vec::new();

        if shape.has_body {
            parameters.push(Parameter {
                name: "body".to_string(),
                location: ParameterLocation::Body,
                param_type: None,
                description: None,
                required: false,
                format: None,
                schema: Some(
                    self.definition_ref(&shape.resource_type)
                        .unwrap_or_else(|| json!({ "type": "object" })),
                ),
                console_default: None,
            });
        }

        parameters.extend(shape.template_parameters.iter().map(|p| Parameter {
            name: p.name.clone(),
            location: ParameterLocation::Path,
            param_type: Some(p.param_type),
            description: p.description.clone(),
            required: p.required,
            format: None,
            schema: None,
            console_default: None,
        }));

        parameters.extend(shape.query_parameters.iter().map(|p| Parameter {
            name: p.name.clone(),
            location: ParameterLocation::Query,
            param_type: Some(p.param_type),
            description: p.description.clone(),
            required: false,
            format: p.format.clone(),
            schema: None,
            console_default: p.console_default.clone(),
        }));

        let schema = match shape.response {
            ResponsePolicy::ResourceSchema => self.definition_ref(&shape.resource_type),
            ResponsePolicy::Generic => None,
        };

        SwaggerFragment {
            path: shape.url_template.clone(),
            method: shape.method,
            operation: Operation {
                summary: None,
                produces: Vec::new(),
                parameters,
                responses: Response::success(schema),
            },
        }
    }
}
