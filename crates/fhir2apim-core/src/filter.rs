//! Resource and interaction allow-lists.
//!
//! Both filters are written as comma separated token lists where the token
//! `all` admits everything. They are evaluated independently of each other.
//!
//! # Examples
//!
//! ```
//! use fhir2apim_core::capability::InteractionCode;
//! use fhir2apim_core::filter::InteractionFilter;
//!
//! let filter = InteractionFilter::new(
//!     "Patient,Observation".parse().unwrap(),
//!     "all".parse().unwrap(),
//! );
//! assert!(filter.included("Patient", InteractionCode::Delete));
//! assert!(!filter.included("Account", InteractionCode::Read));
//! ```

// Internal imports (std, crate)
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::capability::InteractionCode;
use crate::Error;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};

/// Token that admits every value
pub const WILDCARD: &str = "all";

/// Either the wildcard or an explicit set of tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

/// Selection over resource type names
pub type ResourceSelection = Selection<ResourceTypeName>;

/// Selection over interaction codes
pub type InteractionSelection = Selection<InteractionCode>;

impl<T: Ord> Selection<T> {
    pub fn contains(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(tokens) => tokens.contains(value),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T> Selection<T>
where
    T: Ord + FromStr<Err = String>,
{
    /// Parse tokens; any `all` token makes the whole selection a wildcard
    pub fn from_tokens<I, S>(tokens: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = BTreeSet::new();
        let mut wildcard = false;
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                return Err(Error::config("Filter contains an empty token"));
            }
            if token == WILDCARD {
                wildcard = true;
                continue;
            }
            values.insert(token.parse::<T>().map_err(Error::config)?);
        }

        if wildcard {
            Ok(Self::All)
        } else if values.is_empty() {
            Err(Error::config("Filter must name at least one token"))
        } else {
            Ok(Self::Only(values))
        }
    }
}

impl<T> FromStr for Selection<T>
where
    T: Ord + FromStr<Err = String>,
{
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::from_tokens(s.split(','))
    }
}

impl<T: Ord + fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "{}", WILDCARD),
            Self::Only(tokens) => {
                let joined = tokens
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{}", joined)
            }
        }
    }
}

impl<T: Ord + fmt::Display> Serialize for Selection<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Accepts either `"a,b"` or `["a", "b"]` in configuration files
#[derive(Deserialize)]
#[serde(untagged)]
enum SelectionRepr {
    Joined(String),
    List(Vec<String>),
}

impl<'de, T> Deserialize<'de> for Selection<T>
where
    T: Ord + FromStr<Err = String>,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match SelectionRepr::deserialize(deserializer)? {
            SelectionRepr::Joined(s) => s.parse(),
            SelectionRepr::List(items) => Self::from_tokens(items),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// A resource type token, restricted to ASCII identifiers
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceTypeName(String);

impl ResourceTypeName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ResourceTypeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!("Invalid resource type in filter: '{}'", s))
        }
    }
}

impl fmt::Display for ResourceTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Admission predicate over (resource type, interaction)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionFilter {
    resources: ResourceSelection,
    interactions: InteractionSelection,
}

impl InteractionFilter {
    pub fn new(resources: ResourceSelection, interactions: InteractionSelection) -> Self {
        Self {
            resources,
            interactions,
        }
    }

    /// Whether the resource type passes the resource allow-list
    pub fn admits_resource(&self, resource_type: &str) -> bool {
        match &self.resources {
            Selection::All => true,
            Selection::Only(names) => names.iter().any(|n| n.as_str() == resource_type),
        }
    }

    pub fn included(&self, resource_type: &str, code: InteractionCode) -> bool {
        self.admits_resource(resource_type) && self.interactions.contains(&code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_token_is_wildcard() {
        let sel: ResourceSelection = "all".parse().unwrap();
        assert!(sel.is_wildcard());
        let sel: InteractionSelection = "read,all".parse().unwrap();
        assert!(sel.is_wildcard());
    }

    #[test]
    fn test_explicit_tokens_are_trimmed() {
        let sel: InteractionSelection = " read , vread".parse().unwrap();
        assert!(sel.contains(&InteractionCode::Read));
        assert!(sel.contains(&InteractionCode::Vread));
        assert!(!sel.contains(&InteractionCode::Delete));
        assert_eq!(sel.to_string(), "read,vread");
    }

    #[test]
    fn test_invalid_syntax_is_config_error() {
        for bad in ["", "Patient,,Account", "Pat ient", "Patient/1"] {
            let err = bad.parse::<ResourceSelection>().unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{bad:?} should be rejected");
        }
        let err = "read,patch".parse::<InteractionSelection>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_included_requires_both_lists() {
        let filter = InteractionFilter::new(
            "Account".parse().unwrap(),
            "delete".parse().unwrap(),
        );
        assert!(filter.included("Account", InteractionCode::Delete));
        assert!(!filter.included("Account", InteractionCode::Read));
        assert!(!filter.included("Patient", InteractionCode::Delete));
    }

    #[test]
    fn test_default_admits_everything() {
        let filter = InteractionFilter::default();
        for code in InteractionCode::all() {
            assert!(filter.included("Anything", code));
        }
    }

    #[test]
    fn test_deserialize_from_string_or_list() {
        let joined: InteractionSelection = serde_json::from_str("\"read,create\"").unwrap();
        let listed: InteractionSelection =
            serde_json::from_str(r#"["create", "read"]"#).unwrap();
        assert_eq!(joined, listed);
        assert!(serde_json::from_str::<InteractionSelection>(r#"["bogus"]"#).is_err());
    }
}
