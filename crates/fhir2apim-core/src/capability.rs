//! FHIR capability statement parsing.
//!
//! The wire document is deserialized into private mirror structs and then
//! converted into the typed records below. Anything the generator relies on
//! (`rest[0]`, resource `type`, interaction `code`, search parameter `name`
//! and `type`) must be present, otherwise a [`Error::Validation`] is raised.
//!
//! # Examples
//!
//! ```
//! use fhir2apim_core::capability::{CapabilityDocument, InteractionCode};
//!
//! let doc = CapabilityDocument::from_json(r#"{
//!     "publisher": "Example",
//!     "rest": [{ "resource": [
//!         { "type": "Patient", "interaction": [{ "code": "read" }, { "code": "patch" }] }
//!     ]}]
//! }"#).unwrap();
//!
//! let patient = &doc.resources[0];
//! assert_eq!(patient.resource_type, "Patient");
//! assert!(patient.supports(InteractionCode::Read));
//! // `patch` is not part of the recognized vocabulary and is dropped
//! assert_eq!(patient.interactions.len(), 1);
//! ```

// Internal imports (std, crate)
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::Error;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Interaction codes the generator knows how to map.
///
/// The declaration order is the emission order for a single resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionCode {
    SearchType,
    Read,
    Vread,
    HistoryInstance,
    HistoryType,
    Create,
    Update,
    Delete,
}

impl InteractionCode {
    /// The wire code, e.g. `history-instance`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchType => "search-type",
            Self::Read => "read",
            Self::Vread => "vread",
            Self::HistoryInstance => "history-instance",
            Self::HistoryType => "history-type",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Returns an iterator over all recognized codes in emission order
    pub fn all() -> impl Iterator<Item = Self> {
        use InteractionCode::*;
        [
            SearchType,
            Read,
            Vread,
            HistoryInstance,
            HistoryType,
            Create,
            Update,
            Delete,
        ]
        .iter()
        .copied()
    }
}

impl FromStr for InteractionCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| format!("Unknown interaction code: {}", s))
    }
}

impl fmt::Display for InteractionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A search parameter declared for a resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParameter {
    /// Name used in the query string (e.g. `birthdate`)
    pub name: String,
    /// FHIR search parameter type (e.g. `date`, `token`)
    pub declared_type: String,
    /// Human readable documentation, if the server publishes any
    pub documentation: Option<String>,
}

/// What a server supports for one resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCapability {
    pub resource_type: String,
    pub interactions: BTreeSet<InteractionCode>,
    pub search_parameters: Vec<SearchParameter>,
}

impl ResourceCapability {
    pub fn supports(&self, code: InteractionCode) -> bool {
        self.interactions.contains(&code)
    }
}

/// The parts of a capability statement the generator consumes.
///
/// Only the first `rest` entry is honored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDocument {
    pub publisher: Option<String>,
    pub fhir_version: Option<String>,
    pub software_name: Option<String>,
    pub implementation_description: Option<String>,
    pub resources: Vec<ResourceCapability>,
}

impl CapabilityDocument {
    /// Parse and validate a capability statement
    pub fn from_json(content: &str) -> crate::Result<Self> {
        let wire: WireCapabilityStatement = serde_json::from_str(content)
            .map_err(|e| Error::validation(format!("Malformed capability statement: {}", e)))?;
        Self::try_from(wire)
    }

    /// Load a capability statement from a local file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content).map_err(|e| match e {
            Error::Validation(msg) => {
                Error::validation(format!("{} (in {})", msg, path.display()))
            }
            other => other,
        })
    }
}

impl TryFrom<WireCapabilityStatement> for CapabilityDocument {
    type Error = Error;

    fn try_from(wire: WireCapabilityStatement) -> crate::Result<Self> {
        let rest = wire
            .rest
            .into_iter()
            .next()
            .ok_or_else(|| Error::validation("Capability statement has no 'rest' entry"))?;

        let resources = rest
            .resource
            .into_iter()
            .map(|resource| ResourceCapability {
                interactions: resource
                    .interaction
                    .iter()
                    .filter_map(|i| i.code.parse().ok())
                    .collect(),
                search_parameters: resource
                    .search_param
                    .into_iter()
                    .map(|p| SearchParameter {
                        name: p.name,
                        declared_type: p.r#type,
                        documentation: p.documentation,
                    })
                    .collect(),
                resource_type: resource.r#type,
            })
            .collect();

        Ok(Self {
            publisher: wire.publisher,
            fhir_version: wire.fhir_version,
            software_name: wire.software.and_then(|s| s.name),
            implementation_description: wire.implementation.and_then(|i| i.description),
            resources,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCapabilityStatement {
    publisher: Option<String>,
    fhir_version: Option<String>,
    software: Option<WireSoftware>,
    implementation: Option<WireImplementation>,
    rest: Vec<WireRest>,
}

#[derive(Debug, Deserialize)]
struct WireSoftware {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireImplementation {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRest {
    #[serde(default)]
    resource: Vec<WireResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResource {
    r#type: String,
    interaction: Vec<WireInteraction>,
    #[serde(default)]
    search_param: Vec<WireSearchParam>,
}

#[derive(Debug, Deserialize)]
struct WireInteraction {
    code: String,
}

#[derive(Debug, Deserialize)]
struct WireSearchParam {
    name: String,
    r#type: String,
    documentation: Option<String>,
}
