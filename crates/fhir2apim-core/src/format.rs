//! Output variants the generator can produce.
//!
//! # Examples
//!
//! ```
//! use fhir2apim_core::format::OutputFormat;
//! use std::str::FromStr;
//!
//! let format = OutputFormat::from_str("arm").unwrap();
//! assert_eq!(format, OutputFormat::Arm);
//! assert_eq!(format.to_string(), "arm");
//!
//! // Swagger is the default
//! assert_eq!(OutputFormat::default(), OutputFormat::Swagger);
//! ```

// Internal imports (std, crate)
use std::fmt;
use std::str::FromStr;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};

/// Supported artifact kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Swagger 2.0 web-API description
    #[default]
    Swagger,
    /// Azure Resource Manager template for API Management
    Arm,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "swagger" => Ok(OutputFormat::Swagger),
            "arm" => Ok(OutputFormat::Arm),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl OutputFormat {
    /// Returns the format identifier as a string slice
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swagger => "swagger",
            Self::Arm => "arm",
        }
    }

    /// Returns an iterator over all available formats
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::Swagger, Self::Arm].iter().copied()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
