//! fhir2apim CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

// Internal imports (std, crate)
use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::Context;
use clap::{Args, Parser};
use fhir2apim_core::{
    config::Config,
    filter::{InteractionSelection, ResourceSelection},
    generate_with_cancellation, OutputFormat,
};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "fhir2apim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate a Swagger document or deployment template from a FHIR server
    Generate(GenerateArgs),
    /// Write a starter configuration file
    Init {
        /// Destination; `.toml` selects TOML, anything else YAML
        #[arg(long, default_value = "fhir2apim.yaml")]
        path: PathBuf,
        /// FHIR server to put in the starter file
        #[arg(long)]
        fhir_server: Option<Url>,
    },
}

/// Flags override values loaded from `--config`
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// YAML or TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the FHIR server
    #[arg(long)]
    fhir_server: Option<Url>,
    /// Capability statement endpoint relative to the server URL
    #[arg(long)]
    metadata_endpoint: Option<String>,
    /// Read the capability statement from a local JSON file
    #[arg(long)]
    capability_file: Option<PathBuf>,
    /// Comma separated resource types, or `all`
    #[arg(long)]
    resources: Option<ResourceSelection>,
    /// Comma separated interaction codes, or `all`
    #[arg(long)]
    interactions: Option<InteractionSelection>,
    /// Artifact to produce (swagger, arm)
    #[arg(long)]
    format: Option<OutputFormat>,
    /// FHIR version whose type schema is merged into Swagger output, e.g. R4
    #[arg(long)]
    schema_version: Option<String>,
    /// Where versioned fhir.schema.json files are published
    #[arg(long)]
    schema_base_url: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Default API Management instance name
    #[arg(long)]
    apim_instance_name: Option<String>,
    /// Default API display name
    #[arg(long)]
    display_name: Option<String>,
    /// Default API path
    #[arg(long)]
    api_path: Option<String>,
    /// Output file; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

impl GenerateArgs {
    async fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .await
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(server) = &self.fhir_server {
            config.fhir_server = Some(server.clone());
        }
        if let Some(endpoint) = &self.metadata_endpoint {
            config.metadata_endpoint = endpoint.clone();
        }
        if let Some(path) = &self.capability_file {
            config.capability_path = Some(path.clone());
        }
        if let Some(resources) = &self.resources {
            config.resources = resources.clone();
        }
        if let Some(interactions) = &self.interactions {
            config.interactions = interactions.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(version) = &self.schema_version {
            config.schema_version = Some(version.clone());
        }
        if let Some(base) = &self.schema_base_url {
            config.schema_base_url = base.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = Some(secs);
        }
        if let Some(name) = &self.apim_instance_name {
            config.apim.instance_name = name.clone();
        }
        if let Some(name) = &self.display_name {
            config.apim.display_name = name.clone();
        }
        if let Some(path) = &self.api_path {
            config.apim.api_path = path.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging on stderr so stdout only carries the artifact
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Generate(args) => {
            let config = args.resolve_config().await?;

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling generation");
                    on_interrupt.cancel();
                }
            });

            let artifact = generate_with_cancellation(&config, &cancel)
                .await
                .context("Generation failed")?;

            match &args.output {
                Some(path) => {
                    fs::write(path, &artifact)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {} to {}", config.format, path.display());
                }
                None => println!("{}", artifact),
            }
        }
        Commands::Init { path, fhir_server } => {
            let config = Config {
                fhir_server: fhir_server.clone(),
                ..Default::default()
            };
            config
                .save(path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote starter configuration to {}", path.display());
        }
    }

    Ok(())
}
