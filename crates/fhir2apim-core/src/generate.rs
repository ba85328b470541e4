//! Artifact generation for fhir2apim.
//!
//! [`generate`] is the main entry point: it validates the configuration,
//! loads the capability statement, plans the admitted operations and projects
//! them into the requested artifact. [`DocumentAssembler`] holds the pure part
//! so it can be driven without any network access.

// Internal imports (std, crate)
use crate::{
    builders::{
        arm::{ApiResource, ArmOperationBuilder, DeploymentTemplate, TemplateParameters},
        build_all,
        swagger::{Definitions, SwaggerOperationBuilder, WebApiDocument},
    },
    capability::CapabilityDocument,
    config::Config,
    error::{Error, Result},
    fetch::Fetcher,
    format::OutputFormat,
    operation::plan_operations,
    schema::SchemaAugmenter,
};

// External imports (alphabetized)
use log::{info, warn};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Generate the configured artifact as pretty-printed JSON
pub async fn generate(config: &Config) -> Result<String> {
    generate_with_cancellation(config, &CancellationToken::new()).await
}

/// Like [`generate`], aborting with [`Error::Cancelled`] once `cancel` fires
pub async fn generate_with_cancellation(
    config: &Config,
    cancel: &CancellationToken,
) -> Result<String> {
    // 1. Reject bad configuration before any I/O
    config.validate()?;
    ensure_active(cancel)?;
    let assembler = DocumentAssembler::new(config)?;
    let fetcher = Fetcher::new(config.timeout(), cancel.clone())?;

    // 2. Load the capability statement, degrading on fetch failure
    let capability = load_capability(config, &fetcher, cancel).await?;
    ensure_active(cancel)?;

    // 3. Project into the requested variant
    match config.format {
        OutputFormat::Swagger => {
            let definitions = match &config.schema_version {
                Some(version) => {
                    let augmenter = SchemaAugmenter::new(config.schema_url(version)?);
                    Some(augmenter.definitions(&fetcher).await?)
                }
                None => None,
            };
            ensure_active(cancel)?;
            let document = assembler.web_api(capability.as_ref(), definitions);
            Ok(serde_json::to_string_pretty(&document)?)
        }
        OutputFormat::Arm => {
            let template = assembler.deployment_template(capability.as_ref());
            Ok(serde_json::to_string_pretty(&template)?)
        }
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

async fn load_capability(
    config: &Config,
    fetcher: &Fetcher,
    cancel: &CancellationToken,
) -> Result<Option<CapabilityDocument>> {
    if let Some(path) = &config.capability_path {
        info!("Reading capability statement from {}", path.display());
        return tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = CapabilityDocument::from_file(path) => result.map(Some),
        };
    }

    let url = config.metadata_url()?;
    match fetcher.get_text(&url).await {
        Ok(content) => CapabilityDocument::from_json(&content).map(Some),
        Err(e) if e.is_fetch_failure() => {
            warn!("Generating without capability statement: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Builds both artifact variants from an already loaded capability statement
#[derive(Debug, Clone)]
pub struct DocumentAssembler<'a> {
    config: &'a Config,
    server: &'a Url,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        Ok(Self {
            config,
            server: config.server_url()?,
        })
    }

    /// Swagger document; resource types named in `definitions` are referenced
    pub fn web_api(
        &self,
        capability: Option<&CapabilityDocument>,
        definitions: Option<Definitions>,
    ) -> WebApiDocument {
        let mut document = WebApiDocument::new(self.server);
        let builder = definitions
            .as_ref()
            .map_or_else(SwaggerOperationBuilder::new, SwaggerOperationBuilder::with_definitions);

        if let Some(capability) = capability {
            document.apply_info(capability);
            let filter = self.config.filter();
            let fragments = build_all(&builder, plan_operations(&capability.resources, &filter));
            info!("Emitting {} Swagger operations", fragments.len());
            for fragment in fragments {
                document.insert(fragment);
            }
        }

        document.definitions = definitions;
        document
    }

    /// Deployment template with operations chained in emission order
    pub fn deployment_template(
        &self,
        capability: Option<&CapabilityDocument>,
    ) -> DeploymentTemplate {
        let api = ApiResource::new(
            self.server,
            capability.and_then(|c| c.software_name.clone()),
        );
        let builder = ArmOperationBuilder::new(&api);
        let mut template =
            DeploymentTemplate::new(TemplateParameters::from(&self.config.apim), api);

        if let Some(capability) = capability {
            let filter = self.config.filter();
            template.operations =
                build_all(&builder, plan_operations(&capability.resources, &filter));
            info!("Emitting {} API Management operations", template.operations.len());
        }

        template
    }
}
