//! Variant-neutral operation planning.
//!
//! Every admitted (resource type, interaction) pair is turned into one
//! [`OperationShape`] describing method, url template, parameters, body and
//! response policy. The Swagger and ARM builders only project these shapes
//! into their own schemas, so per-verb decisions are made once, here.

// Internal imports (std, crate)
use std::fmt;

use crate::capability::{InteractionCode, ResourceCapability};
use crate::coercion::{coerce, PrimitiveType};
use crate::filter::InteractionFilter;
use crate::paths::PathKind;

// External imports (alphabetized)
use log::debug;

/// Query parameter carrying the response media type
pub const FORMAT_PARAMETER: &str = "_format";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Upper case verb as used by API Management
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the success response is described
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePolicy {
    /// Reference the resource type's schema when definitions are merged in
    ResourceSchema,
    /// Always a bare `200 Success`
    Generic,
}

/// A parameter bound from the url template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParameter {
    pub name: String,
    pub param_type: PrimitiveType,
    pub required: bool,
    pub description: Option<String>,
}

impl TemplateParameter {
    fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: PrimitiveType::String,
            required: true,
            description: Some(description.to_string()),
        }
    }
}

/// An optional query string parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    pub name: String,
    pub param_type: PrimitiveType,
    pub description: Option<String>,
    pub format: Option<String>,
    /// Value pre-filled by interactive API consoles
    pub console_default: Option<String>,
}

impl QueryParameter {
    fn string(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: PrimitiveType::String,
            description: Some(description.to_string()),
            format: None,
            console_default: None,
        }
    }
}

/// Everything both output variants need to know about one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationShape {
    pub resource_type: String,
    pub interaction: InteractionCode,
    pub method: HttpMethod,
    pub path_kind: PathKind,
    pub url_template: String,
    pub template_parameters: Vec<TemplateParameter>,
    pub query_parameters: Vec<QueryParameter>,
    /// Whether the request carries a resource body
    pub has_body: bool,
    pub response: ResponsePolicy,
}

impl OperationShape {
    /// Plan the operation for one interaction of a resource type
    pub fn plan(resource: &ResourceCapability, interaction: InteractionCode) -> Self {
        use InteractionCode::*;

        let (method, path_kind) = match interaction {
            SearchType => (HttpMethod::Get, PathKind::Collection),
            Read => (HttpMethod::Get, PathKind::Instance),
            Vread => (HttpMethod::Get, PathKind::InstanceVersion),
            HistoryInstance => (HttpMethod::Get, PathKind::InstanceHistory),
            HistoryType => (HttpMethod::Get, PathKind::CollectionHistory),
            Create => (HttpMethod::Post, PathKind::Collection),
            Update => (HttpMethod::Put, PathKind::Instance),
            Delete => (HttpMethod::Delete, PathKind::Instance),
        };

        let mut template_parameters = Vec::new();
        if !matches!(path_kind, PathKind::Collection | PathKind::CollectionHistory) {
            template_parameters.push(TemplateParameter::required("id", "id of resource"));
        }
        if path_kind == PathKind::InstanceVersion {
            template_parameters.push(TemplateParameter::required("vid", "version id of resource"));
        }

        let query_parameters = match interaction {
            SearchType => search_query_parameters(resource),
            HistoryInstance | HistoryType => vec![
                QueryParameter::string("_count", "number to return"),
                QueryParameter::string("_since", "how far back"),
            ],
            _ => Vec::new(),
        };

        let response = match interaction {
            SearchType | Read | Vread => ResponsePolicy::ResourceSchema,
            _ => ResponsePolicy::Generic,
        };

        Self {
            resource_type: resource.resource_type.clone(),
            interaction,
            method,
            path_kind,
            url_template: path_kind.path_for(&resource.resource_type),
            template_parameters,
            query_parameters,
            has_body: matches!(interaction, Create | Update),
            response,
        }
    }
}

fn search_query_parameters(resource: &ResourceCapability) -> Vec<QueryParameter> {
    let mut params: Vec<QueryParameter> = resource
        .search_parameters
        .iter()
        .map(|p| QueryParameter {
            name: p.name.clone(),
            param_type: coerce(p),
            description: p.documentation.clone(),
            format: (p.declared_type == "date").then(|| "date".to_string()),
            console_default: None,
        })
        .collect();

    params.push(QueryParameter {
        console_default: Some("application/json".to_string()),
        ..QueryParameter::string(FORMAT_PARAMETER, "Output formatting")
    });
    params
}

/// Flatten resources × interactions into the admitted operations, in
/// document order and canonical verb order within each resource.
pub fn plan_operations<'a>(
    resources: &'a [ResourceCapability],
    filter: &'a InteractionFilter,
) -> impl Iterator<Item = OperationShape> + 'a {
    resources
        .iter()
        .filter(move |r| filter.admits_resource(&r.resource_type))
        .flat_map(move |resource| {
            InteractionCode::all()
                .filter(move |code| {
                    resource.supports(*code) && filter.included(&resource.resource_type, *code)
                })
                .map(move |code| {
                    let shape = OperationShape::plan(resource, code);
                    debug!(
                        "Planned {} {} for {}",
                        shape.method, shape.url_template, code
                    );
                    shape
                })
        })
}
