//! Azure Resource Manager projection of planned operations.
//!
//! The template provisions one API Management API followed by one operation
//! resource per planned operation. Operations are chained through `dependsOn`
//! so that API Management creates them one at a time, in emission order.

// Internal imports (std, crate)
use super::OperationBuilder;
use crate::coercion::PrimitiveType;
use crate::config::ApimSettings;
use crate::operation::OperationShape;

// External imports (alphabetized)
use serde::{Serialize, Serializer};
use url::Url;
use uuid::Uuid;

pub const DEPLOYMENT_SCHEMA: &str =
    "http://schema.management.azure.com/schemas/2015-01-01/deploymentTemplate.json#";
pub const CONTENT_VERSION: &str = "1.0.0.0";
pub const APIM_API_VERSION: &str = "2017-03-01";
pub const API_RESOURCE_TYPE: &str = "Microsoft.ApiManagement/service/apis";
pub const OPERATION_RESOURCE_TYPE: &str = "Microsoft.ApiManagement/service/apis/operations";
/// Name of the API inside the API Management instance
pub const API_NAME: &str = "fhirapi";

/// A typed template parameter with an optional default
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmParameter {
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ArmParameter {
    pub fn string(default_value: impl Into<String>) -> Self {
        Self {
            param_type: "string".to_string(),
            default_value: Some(default_value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParameters {
    pub apim_instance_name: ArmParameter,
    pub display_name: ArmParameter,
    pub api_path: ArmParameter,
}

impl From<&ApimSettings> for TemplateParameters {
    fn from(settings: &ApimSettings) -> Self {
        Self {
            apim_instance_name: ArmParameter::string(&settings.instance_name),
            display_name: ArmParameter::string(&settings.display_name),
            api_path: ArmParameter::string(&settings.api_path),
        }
    }
}

/// The API Management API fronting the FHIR server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    pub api_version: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub properties: ApiProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProperties {
    pub display_name: String,
    pub path: String,
    pub service_url: String,
    pub protocols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApiResource {
    pub fn new(server: &Url, description: Option<String>) -> Self {
        Self {
            api_version: APIM_API_VERSION.to_string(),
            resource_type: API_RESOURCE_TYPE.to_string(),
            name: format!("[concat(parameters('apimInstanceName'), '/{}')]", API_NAME),
            properties: ApiProperties {
                display_name: "[parameters('displayName')]".to_string(),
                path: "[parameters('apiPath')]".to_string(),
                service_url: server.to_string(),
                protocols: vec![server.scheme().to_string()],
                description,
            },
        }
    }

    /// Expression other resources use to depend on this API
    pub fn identifier(&self) -> String {
        format!(
            "[resourceId('{}', parameters('apimInstanceName'), '{}')]",
            API_RESOURCE_TYPE, API_NAME
        )
    }
}

/// One API Management operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResource {
    #[serde(skip)]
    pub operation_id: Uuid,
    pub api_version: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub depends_on: Vec<String>,
    pub properties: OperationProperties,
}

impl OperationResource {
    /// Expression other resources use to depend on this operation
    pub fn identifier(&self) -> String {
        format!(
            "[resourceId('{}', parameters('apimInstanceName'), '{}', '{}')]",
            OPERATION_RESOURCE_TYPE, API_NAME, self.operation_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationProperties {
    pub display_name: String,
    pub method: String,
    pub url_template: String,
    pub template_parameters: Vec<ArmTemplateParameter>,
    pub request: OperationRequest,
    pub responses: Vec<OperationResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArmTemplateParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: PrimitiveType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub query_parameters: Vec<ArmQueryParameter>,
    pub representations: Vec<Representation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmQueryParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: PrimitiveType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Representation {
    pub content_type: String,
    pub type_name: String,
}

impl Default for Representation {
    fn default() -> Self {
        Self {
            content_type: "application/json".to_string(),
            type_name: "Body".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub status_code: u16,
    pub description: String,
}

/// Builds operation resources chained to the API and to each other
#[derive(Debug, Clone)]
pub struct ArmOperationBuilder {
    api_identifier: String,
}

impl ArmOperationBuilder {
    pub fn new(api: &ApiResource) -> Self {
        Self {
            api_identifier: api.identifier(),
        }
    }
}

impl OperationBuilder for ArmOperationBuilder {
    type Fragment = OperationResource;

    fn build(
        &self,
        shape: &OperationShape,
        previous: Option<&OperationResource>,
    ) -> OperationResource {
        let operation_id = Uuid::new_v4();

        let mut depends_on = vec![self.api_identifier.clone()];
        depends_on.extend(previous.map(OperationResource::identifier));

        let template_parameters = shape
            .template_parameters
            .iter()
            .map(|p| ArmTemplateParameter {
                name: p.name.clone(),
                param_type: p.param_type,
                required: p.required,
                description: p.description.clone(),
            })
            .collect();

        let query_parameters = shape
            .query_parameters
            .iter()
            .map(|p| ArmQueryParameter {
                name: p.name.clone(),
                param_type: p.param_type,
                description: p.description.clone().unwrap_or_default(),
                default_value: p.console_default.clone(),
            })
            .collect();

        let representations = if shape.has_body {
            vec![Representation::default()]
        } else {
            Vec::new()
        };

        OperationResource {
            operation_id,
            api_version: APIM_API_VERSION.to_string(),
            resource_type: OPERATION_RESOURCE_TYPE.to_string(),
            name: format!(
                "[concat(parameters('apimInstanceName'), '/{}/{}')]",
                API_NAME, operation_id
            ),
            depends_on,
            properties: OperationProperties {
                display_name: format!("{} - {}", shape.url_template, shape.method),
                method: shape.method.as_str().to_string(),
                url_template: shape.url_template.clone(),
                template_parameters,
                request: OperationRequest {
                    query_parameters,
                    representations,
                },
                responses: vec![OperationResponse {
                    status_code: 200,
                    description: "Success".to_string(),
                }],
            },
        }
    }
}

/// The complete deployment template.
///
/// The API is stored apart from its operations so that it is always emitted
/// as `resources[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTemplate {
    pub parameters: TemplateParameters,
    pub api: ApiResource,
    pub operations: Vec<OperationResource>,
}

impl DeploymentTemplate {
    pub fn new(parameters: TemplateParameters, api: ApiResource) -> Self {
        Self {
            parameters,
            api,
            operations: Vec::new(),
        }
    }
}

impl Serialize for DeploymentTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum ResourceRef<'a> {
            Api(&'a ApiResource),
            Operation(&'a OperationResource),
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            #[serde(rename = "$schema")]
            schema: &'a str,
            content_version: &'a str,
            parameters: &'a TemplateParameters,
            resources: Vec<ResourceRef<'a>>,
        }

        let resources = std::iter::once(ResourceRef::Api(&self.api))
            .chain(self.operations.iter().map(ResourceRef::Operation))
            .collect();

        Wire {
            schema: DEPLOYMENT_SCHEMA,
            content_version: CONTENT_VERSION,
            parameters: &self.parameters,
            resources,
        }
        .serialize(serializer)
    }
}
