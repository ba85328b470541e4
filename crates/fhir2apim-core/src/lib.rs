//! fhir2apim Core Library
//!
//! This library turns the capability statement of a FHIR server into a
//! Swagger 2.0 document or an Azure API Management deployment template.

pub mod builders;
pub mod capability;
pub mod coercion;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod format;
pub mod generate;
pub mod operation;
pub mod paths;
pub mod schema;

pub use crate::{
    capability::CapabilityDocument,
    config::Config,
    error::{Error, Result},
    filter::InteractionFilter,
    format::OutputFormat,
    generate::{generate, generate_with_cancellation, DocumentAssembler},
};
