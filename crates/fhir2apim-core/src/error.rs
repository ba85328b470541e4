//! Error handling for the fhir2apim generation library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Fetch failures are usually
//! absorbed by the generator and logged, so most callers only ever see
//! configuration, validation or cancellation errors.
//!
//! # Examples
//!
//! ```
//! use fhir2apim_core::error::{Error, Result};
//!
//! fn check_version(version: &str) -> Result<()> {
//!     if version.is_empty() {
//!         return Err(Error::config("schema version must not be empty"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_version("R4").is_ok());
//! ```

use thiserror::Error;

/// Result type for fhir2apim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fhir2apim operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A remote document could not be retrieved
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The capability statement does not have the expected shape
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller cancelled the generation
    #[error("Generation cancelled")]
    Cancelled,
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(msg: S) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the generator may degrade instead of failing on this error
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}
