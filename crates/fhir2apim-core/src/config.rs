//! Configuration management for fhir2apim generation.
//!
//! This module defines the `Config` struct describing one generation run:
//! which server to read, which resources and interactions to keep, which
//! artifact to produce and how to reach the external type schema. It can be
//! created programmatically or loaded from a YAML or TOML file.
//!
//! # Examples
//!
//! ```no_run
//! use fhir2apim_core::config::Config;
//! use fhir2apim_core::format::OutputFormat;
//!
//! # #[tokio::main]
//! # async fn main() -> fhir2apim_core::Result<()> {
//! // Create a new config programmatically
//! let mut config = Config::new("http://hapi.fhir.org/baseDstu3/".parse().unwrap());
//! config.format = OutputFormat::Arm;
//! config.resources = "Patient,Observation".parse()?;
//!
//! // Or load from a config file
//! let config = Config::from_file("fhir2apim.yaml").await?;
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::{InteractionFilter, InteractionSelection, ResourceSelection};
use crate::format::OutputFormat;
use crate::Error;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use tokio::fs;
use url::Url;

pub const DEFAULT_METADATA_ENDPOINT: &str = "metadata?_format=json";
pub const DEFAULT_SCHEMA_BASE_URL: &str = "https://hl7.org/fhir/";

/// Configuration for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the FHIR server; required
    #[serde(default)]
    pub fhir_server: Option<Url>,

    /// Capability statement endpoint, relative to the server URL
    #[serde(default = "default_metadata_endpoint")]
    pub metadata_endpoint: String,

    /// Read the capability statement from this file instead of the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability_path: Option<PathBuf>,

    /// Resource types to include
    #[serde(default)]
    pub resources: ResourceSelection,

    /// Interactions to include
    #[serde(default)]
    pub interactions: InteractionSelection,

    /// Artifact to produce
    #[serde(default)]
    pub format: OutputFormat,

    /// FHIR version whose type schema is merged into Swagger output (e.g. `R4`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,

    /// Where versioned `fhir.schema.json` files are published
    #[serde(default = "default_schema_base_url")]
    pub schema_base_url: String,

    /// Per-request timeout for remote fetches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Defaults for the deployment template parameters
    #[serde(default)]
    pub apim: ApimSettings,
}

/// Default values of the deployment template parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApimSettings {
    pub instance_name: String,
    pub display_name: String,
    pub api_path: String,
}

impl Default for ApimSettings {
    fn default() -> Self {
        Self {
            instance_name: "myapim".to_string(),
            display_name: "FHIRAPI".to_string(),
            api_path: "fhir".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fhir_server: None,
            metadata_endpoint: default_metadata_endpoint(),
            capability_path: None,
            resources: ResourceSelection::default(),
            interactions: InteractionSelection::default(),
            format: OutputFormat::default(),
            schema_version: None,
            schema_base_url: default_schema_base_url(),
            timeout_secs: None,
            apim: ApimSettings::default(),
        }
    }
}

impl Config {
    /// Create a new Config for a server with default values
    pub fn new(fhir_server: Url) -> Self {
        Self {
            fhir_server: Some(fhir_server),
            ..Default::default()
        }
    }

    /// Load configuration from a `.toml` file, or YAML for any other extension
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let config = if is_toml(path) {
            toml::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Save configuration to a file, picking the format from the extension
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        let content = if is_toml(path) {
            toml::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check everything that can be checked without touching the network
    pub fn validate(&self) -> crate::Result<()> {
        let server = self.server_url()?;
        if !matches!(server.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "FHIR server URL must use http or https, got '{}'",
                server.scheme()
            )));
        }
        if self.capability_path.is_none() {
            self.metadata_url()?;
        }
        if let Some(version) = &self.schema_version {
            self.schema_url(version)?;
        }
        Ok(())
    }

    /// The FHIR server URL, or a configuration error when it is missing
    pub fn server_url(&self) -> crate::Result<&Url> {
        self.fhir_server
            .as_ref()
            .ok_or_else(|| Error::config("Missing FHIR server URL"))
    }

    /// Capability statement URL, resolved against the server URL as a directory
    pub fn metadata_url(&self) -> crate::Result<Url> {
        as_directory(self.server_url()?)
            .join(&self.metadata_endpoint)
            .map_err(|e| {
                Error::config(format!(
                    "Invalid metadata endpoint '{}': {}",
                    self.metadata_endpoint, e
                ))
            })
    }

    /// URL of the published type schema for a FHIR version
    pub fn schema_url(&self, version: &str) -> crate::Result<Url> {
        let valid = !version.is_empty()
            && version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !valid {
            return Err(Error::config(format!("Invalid schema version '{}'", version)));
        }
        let base = Url::parse(&self.schema_base_url).map_err(|e| {
            Error::config(format!(
                "Invalid schema base URL '{}': {}",
                self.schema_base_url, e
            ))
        })?;
        as_directory(&base)
            .join(&format!("{}/fhir.schema.json", version))
            .map_err(|e| Error::config(format!("Invalid schema version '{}': {}", version, e)))
    }

    pub fn filter(&self) -> InteractionFilter {
        InteractionFilter::new(self.resources.clone(), self.interactions.clone())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn as_directory(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

fn default_metadata_endpoint() -> String {
    DEFAULT_METADATA_ENDPOINT.to_string()
}

fn default_schema_base_url() -> String {
    DEFAULT_SCHEMA_BASE_URL.to_string()
}
