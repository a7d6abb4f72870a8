//! Addon operators - Kubernetes controllers for cluster add-ons

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use addon_operators::controller::runner::{
    build_component_controllers, build_knative_controller, ControllerConfig,
};
use addon_operators::controller::PreflightCondition;
use addon_operators::crd::all_crds;
use addon_operators::{
    DEFAULT_MANIFEST_DIR, DEFAULT_PREFLIGHT_DEPLOYMENT, DEFAULT_PREFLIGHT_NAMESPACE,
    DEFAULT_ROOT_NAME, DEFAULT_ROOT_NAMESPACE, FIELD_MANAGER,
};

/// Addon operators - CRD-driven controllers for Knative and friends
#[derive(Parser, Debug)]
#[command(name = "addon-operators", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the controllers (default mode)
    ///
    /// Starts the Knative root controller and one pass-through controller per
    /// component add-on, all sharing one client and manifest directory.
    Controller(ControllerArgs),
}

/// Controller mode arguments
#[derive(Parser, Debug)]
struct ControllerArgs {
    /// Directory holding the manifest channels and packages
    #[arg(long, env = "ADDON_MANIFEST_DIR", default_value = DEFAULT_MANIFEST_DIR)]
    manifest_dir: PathBuf,

    /// Name of the singleton Knative resource
    #[arg(long, env = "ADDON_ROOT_NAME", default_value = DEFAULT_ROOT_NAME)]
    root_name: String,

    /// Namespace of the singleton Knative resource
    #[arg(long, env = "ADDON_ROOT_NAMESPACE", default_value = DEFAULT_ROOT_NAMESPACE)]
    root_namespace: String,

    /// Namespace of the Deployment gating Knative installation
    #[arg(
        long,
        env = "ADDON_PREFLIGHT_NAMESPACE",
        default_value = DEFAULT_PREFLIGHT_NAMESPACE
    )]
    preflight_namespace: String,

    /// Name of the Deployment gating Knative installation
    #[arg(
        long,
        env = "ADDON_PREFLIGHT_DEPLOYMENT",
        default_value = DEFAULT_PREFLIGHT_DEPLOYMENT
    )]
    preflight_deployment: String,

    /// Do not install or update the CRDs on startup
    #[arg(long, env = "ADDON_SKIP_CRD_INSTALL")]
    skip_crd_install: bool,
}

impl Default for ControllerArgs {
    fn default() -> Self {
        Self {
            manifest_dir: PathBuf::from(DEFAULT_MANIFEST_DIR),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            preflight_namespace: DEFAULT_PREFLIGHT_NAMESPACE.to_string(),
            preflight_deployment: DEFAULT_PREFLIGHT_DEPLOYMENT.to_string(),
            skip_crd_install: false,
        }
    }
}

impl From<ControllerArgs> for ControllerConfig {
    fn from(args: ControllerArgs) -> Self {
        Self {
            manifest_dir: args.manifest_dir,
            root_name: args.root_name,
            root_namespace: args.root_namespace,
            preflight: PreflightCondition::available(
                args.preflight_namespace,
                args.preflight_deployment,
            ),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if cli.crd {
        for crd in all_crds() {
            let yaml = serde_yaml::to_string(&crd)
                .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
            println!("---\n{yaml}");
        }
        return Ok(());
    }

    match cli.command {
        Some(Commands::Controller(args)) => run_controller(args).await,
        None => run_controller(ControllerArgs::default()).await,
    }
}

/// Ensure all add-on CRDs are installed
///
/// The operator installs its own CRDs on startup using server-side apply so
/// the CRD versions always match the operator version.
async fn ensure_crds_installed(client: &Client) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    for crd in all_crds() {
        let name = crd
            .metadata
            .name
            .clone()
            .ok_or_else(|| anyhow::anyhow!("CRD without metadata.name"))?;
        tracing::info!(crd = %name, "Installing CRD...");
        crds.patch(&name, &params, &Patch::Apply(&crd))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to install {} CRD: {}", name, e))?;
    }

    tracing::info!("All add-on CRDs installed/updated");
    Ok(())
}

/// Run all controllers until a shutdown signal arrives
async fn run_controller(args: ControllerArgs) -> anyhow::Result<()> {
    tracing::info!("Addon operators starting...");

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    if args.skip_crd_install {
        tracing::info!("Skipping CRD installation");
    } else {
        ensure_crds_installed(&client).await?;
    }

    let config = ControllerConfig::from(args);

    tracing::info!(
        manifest_dir = %config.manifest_dir.display(),
        "Starting add-on controllers..."
    );
    let knative_controller = build_knative_controller(client.clone(), &config);
    let component_controllers =
        futures::future::join_all(build_component_controllers(client, &config));

    // Every controller stops on the same signal
    tokio::select! {
        _ = knative_controller => {
            tracing::info!("Knative controller completed");
        }
        _ = component_controllers => {
            tracing::info!("Component controllers completed");
        }
    }

    tracing::info!("Addon operators shutting down");
    Ok(())
}
