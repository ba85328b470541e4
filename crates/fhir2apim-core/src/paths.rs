//! Path derivation for FHIR REST endpoints.
//!
//! Resource type names are identifier-safe by FHIR naming rules, so paths are
//! built by plain concatenation without escaping.

/// Collection path, e.g. `/Patient`
pub fn collection_path(resource_type: &str) -> String {
    format!("/{}", resource_type)
}

/// Instance path, e.g. `/Patient/{id}`
pub fn instance_path(resource_type: &str) -> String {
    format!("{}/{{id}}", collection_path(resource_type))
}

/// The shapes of path the generator emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// `/{type}`
    Collection,
    /// `/{type}/{id}`
    Instance,
    /// `/{type}/_history`
    CollectionHistory,
    /// `/{type}/{id}/_history`
    InstanceHistory,
    /// `/{type}/{id}/_history/{vid}`
    InstanceVersion,
}

impl PathKind {
    /// Build the path of this kind for a resource type
    pub fn path_for(&self, resource_type: &str) -> String {
        match self {
            Self::Collection => collection_path(resource_type),
            Self::Instance => instance_path(resource_type),
            Self::CollectionHistory => format!("{}/_history", collection_path(resource_type)),
            Self::InstanceHistory => format!("{}/_history", instance_path(resource_type)),
            Self::InstanceVersion => format!("{}/_history/{{vid}}", instance_path(resource_type)),
        }
    }
}

/// Inverse of [`PathKind::path_for`].
///
/// ```
/// use fhir2apim_core::paths::{decompose, PathKind};
///
/// assert_eq!(
///     decompose("/Patient/{id}/_history"),
///     Some(("Patient".to_string(), PathKind::InstanceHistory))
/// );
/// assert_eq!(decompose("/metadata/extra/bits/here/too"), None);
/// ```
pub fn decompose(path: &str) -> Option<(String, PathKind)> {
    let rest = path.strip_prefix('/')?;
    let segments: Vec<&str> = rest.split('/').collect();
    let kind = match segments.as_slice() {
        [_] => PathKind::Collection,
        [_, "{id}"] => PathKind::Instance,
        [_, "_history"] => PathKind::CollectionHistory,
        [_, "{id}", "_history"] => PathKind::InstanceHistory,
        [_, "{id}", "_history", "{vid}"] => PathKind::InstanceVersion,
        _ => return None,
    };
    let resource_type = segments[0];
    if resource_type.is_empty() {
        return None;
    }
    Some((resource_type.to_string(), kind))
}
