/// image-mirror - Kubeflow image pipeline
///
/// Extracts container images from Kubernetes manifests and mirrors them
/// into a private Harbor registry.
mod config;
mod docker;
mod error;
mod harbor;
mod image;
mod mirror;
mod scanner;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{RegistryConfig, DEFAULT_ENV_FILE};
use crate::docker::DockerCli;
use crate::harbor::{ensure_project_exists, HarborClient};
use crate::image::MirrorTarget;
use crate::mirror::Mirror;
use crate::scanner::manifest::DEFAULT_MANIFEST;
use crate::scanner::{ImageManifest, ScanOutput};

#[derive(Parser)]
#[command(name = "image-mirror")]
#[command(about = "Extract container images from manifests and mirror them into Harbor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Registry env file (HARBOR_REGISTRY, HARBOR_PROJECT, ...)
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan YAML manifests and write the images they reference
    Extract {
        /// Directory to scan
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Output manifest
        #[arg(short, long, default_value = DEFAULT_MANIFEST)]
        output: PathBuf,
    },

    /// Mirror every image of a manifest into Harbor
    Push {
        /// Image manifest produced by `extract`
        #[arg(long, default_value = DEFAULT_MANIFEST)]
        images: PathBuf,

        /// Create the Harbor project first if it does not exist
        #[arg(long)]
        ensure_project: bool,

        /// Exit with an error if any image failed
        #[arg(long)]
        strict: bool,

        /// Reuse existing docker credentials
        #[arg(long)]
        skip_login: bool,
    },

    /// Mirror a single image, prompting for missing values
    PushSingle {
        /// Image name, e.g. quay.io/jetstack/cert-manager-acmesolver
        #[arg(long)]
        image: Option<String>,

        /// Image tag, e.g. v1.16.1
        #[arg(long)]
        tag: Option<String>,

        /// Reuse existing docker credentials
        #[arg(long)]
        skip_login: bool,
    },

    /// Create the Harbor project if it does not exist
    EnsureProject,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("image_mirror={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        Commands::Extract {
            ref root,
            ref output,
        } => extract_images(root, output),
        Commands::Push {
            ref images,
            ensure_project,
            strict,
            skip_login,
        } => push_images(&cli, images, ensure_project, strict, skip_login).await,
        Commands::PushSingle {
            ref image,
            ref tag,
            skip_login,
        } => push_single_image(&cli, image.clone(), tag.clone(), skip_login).await,
        Commands::EnsureProject => ensure_harbor_project(&cli).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Scan manifests and write the image list
fn extract_images(root: &Path, output: &Path) -> Result<()> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    if let ScanOutput::Written { count, path } = scanner::extract_to_manifest(root, output)? {
        info!("Extracted {} images.", count);
        info!("Saved to {}", path.display());
    }
    Ok(())
}

/// Load registry configuration from the env file
fn load_config(cli: &Cli) -> Result<RegistryConfig> {
    let config = RegistryConfig::from_env_file(&cli.env_file)
        .context("Failed to load registry configuration")?;
    info!("Using Harbor URL: {}", config.harbor_url()?);
    Ok(config)
}

/// Prepare a docker-backed mirror for the configured registry
async fn docker_mirror(config: &RegistryConfig, skip_login: bool) -> Result<Mirror<DockerCli>> {
    let docker = DockerCli::default();
    docker.check_installed().await.context("docker is required")?;

    let mirror = Mirror::new(
        docker,
        MirrorTarget::new(config.registry_host(), config.project.clone()),
    );
    if !skip_login {
        mirror.login(&config.username, &config.password).await?;
    }
    Ok(mirror)
}

/// Mirror all images listed in the manifest
async fn push_images(
    cli: &Cli,
    images: &Path,
    ensure_project: bool,
    strict: bool,
    skip_login: bool,
) -> Result<()> {
    let config = load_config(cli)?;
    let manifest = ImageManifest::from_file(images)?;

    let mirror = docker_mirror(&config, skip_login).await?;

    if ensure_project {
        let harbor = HarborClient::new(&config)?;
        ensure_project_exists(&harbor, &config.project).await?;
    }

    let report = mirror.push_all(&manifest).await;
    for outcome in &report.outcomes {
        debug!("{}", outcome);
    }

    if report.has_failures() {
        warn!("Failed images: {}", report.failed_images().join(", "));
        if strict {
            anyhow::bail!("{} of {} images failed", report.failed(), report.outcomes.len());
        }
    } else {
        info!("All images processed successfully.");
    }

    Ok(())
}

/// Mirror one image given on the command line or at the prompt
async fn push_single_image(
    cli: &Cli,
    image: Option<String>,
    tag: Option<String>,
    skip_login: bool,
) -> Result<()> {
    let config = load_config(cli)?;

    let image = match image {
        Some(image) => image,
        None => prompt("Enter image name (e.g. quay.io/jetstack/cert-manager-acmesolver): ")?,
    };
    let tag = match tag {
        Some(tag) => tag,
        None => prompt("Enter image tag (e.g. v1.16.1): ")?,
    };

    let mirror = docker_mirror(&config, skip_login).await?;
    mirror.push_single(&image, &tag).await?;

    info!("Image pushed successfully.");
    Ok(())
}

/// Create the configured Harbor project if needed
async fn ensure_harbor_project(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let harbor = HarborClient::new(&config)?;
    ensure_project_exists(&harbor, &config.project).await?;
    Ok(())
}

/// Read one trimmed line from stdin
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}
