//! Merging of the published FHIR JSON schema into Swagger output.
//!
//! The upstream `fhir.schema.json` files contain a handful of typographic
//! quotes inside string literals, some of which break strict JSON parsers.
//! They are rewritten to escaped ASCII quotes before parsing.

// Internal imports (std, crate)
use std::borrow::Cow;

use crate::builders::swagger::Definitions;
use crate::fetch::Fetcher;
use crate::Error;

// External imports (alphabetized)
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;
use url::Url;

/// Polymorphic union of every resource; cannot be referenced as a plain type
pub const RESOURCE_LIST: &str = "ResourceList";

static SMART_QUOTES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[‘’“”]").expect("smart quote pattern is valid")
});

/// Replace typographic quotes with escaped ASCII equivalents
pub fn sanitize_quotes(raw: &str) -> Cow<'_, str> {
    SMART_QUOTES.replace_all(raw, |caps: &Captures| match &caps[0] {
        "\u{201C}" | "\u{201D}" => "\\\"",
        _ => "'",
    })
}

/// Parse a schema document and return its definitions without `ResourceList`
pub fn extract_definitions(raw: &str) -> crate::Result<Definitions> {
    let schema: JsonValue = serde_json::from_str(&sanitize_quotes(raw))?;
    let mut definitions = match schema {
        JsonValue::Object(mut root) => match root.remove("definitions") {
            Some(JsonValue::Object(definitions)) => definitions,
            _ => return Err(Error::validation("Type schema has no 'definitions' object")),
        },
        _ => return Err(Error::validation("Type schema is not a JSON object")),
    };
    definitions.remove(RESOURCE_LIST);
    Ok(definitions)
}

/// Fetches type definitions for one FHIR version
#[derive(Debug, Clone)]
pub struct SchemaAugmenter {
    url: Url,
}

impl SchemaAugmenter {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Fetch and extract definitions, degrading to an empty map on failure.
    ///
    /// Only cancellation is reported as an error.
    pub async fn definitions(&self, fetcher: &Fetcher) -> crate::Result<Definitions> {
        let raw = match fetcher.get_text(&self.url).await {
            Ok(raw) => raw,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                warn!("Continuing without type definitions: {}", e);
                return Ok(Definitions::new());
            }
        };

        match extract_definitions(&raw) {
            Ok(definitions) => {
                info!("Merged {} type definitions from {}", definitions.len(), self.url);
                Ok(definitions)
            }
            Err(e) => {
                warn!("Ignoring unusable type schema from {}: {}", self.url, e);
                Ok(Definitions::new())
            }
        }
    }
}
