//! Mapping of FHIR search parameter types to Swagger primitive types.

// Internal imports (std, crate)
use std::fmt;

use crate::capability::SearchParameter;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};

/// Primitive parameter types understood by Swagger 2.0 and API Management
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Integer,
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn from_primitive_name(name: &str) -> Option<Self> {
        match name {
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pick the wire type for a search parameter from its declared FHIR type.
///
/// Primitive names pass through, `quantity` becomes `integer` and every other
/// FHIR search type (`token`, `date`, `reference`, ...) is sent as a string.
///
/// ```
/// use fhir2apim_core::capability::SearchParameter;
/// use fhir2apim_core::coercion::{coerce, PrimitiveType};
///
/// let param = SearchParameter {
///     name: "value-quantity".into(),
///     declared_type: "quantity".into(),
///     documentation: None,
/// };
/// assert_eq!(coerce(&param), PrimitiveType::Integer);
/// ```
pub fn coerce(param: &SearchParameter) -> PrimitiveType {
    let declared = param.declared_type.as_str();
    if let Some(primitive) = PrimitiveType::from_primitive_name(declared) {
        return primitive;
    }
    match declared {
        "quantity" => PrimitiveType::Integer,
        _ => PrimitiveType::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, declared_type: &str) -> SearchParameter {
        SearchParameter {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            documentation: None,
        }
    }

    #[test]
    fn test_keys_off_declared_type_not_name() {
        // a parameter called "quantity" with a token type stays a string
        assert_eq!(coerce(&param("quantity", "token")), PrimitiveType::String);
        assert_eq!(coerce(&param("amount", "quantity")), PrimitiveType::Integer);
    }

    #[test]
    fn test_primitive_names_pass_through() {
        assert_eq!(coerce(&param("n", "number")), PrimitiveType::Number);
        assert_eq!(coerce(&param("s", "string")), PrimitiveType::String);
        assert_eq!(coerce(&param("b", "boolean")), PrimitiveType::Boolean);
    }

    #[test]
    fn test_fhir_types_default_to_string() {
        for declared in ["date", "token", "reference", "uri", "composite", "special"] {
            assert_eq!(coerce(&param("x", declared)), PrimitiveType::String);
        }
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PrimitiveType::Integer).unwrap(),
            "\"integer\""
        );
    }
}
