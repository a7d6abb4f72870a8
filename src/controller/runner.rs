//! Controller runner - builds controller futures for each add-on
//!
//! Each `build_*` function returns boxed futures that the binary composes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::runtime::watcher::{self, Config as WatcherConfig};
use kube::runtime::Controller;
use kube::{Api, Client};

use super::client::{AddonClient, KubeAddonClient};
use super::knative::{knative_reconciler, KnativeOptions};
use super::passthrough::{component_reconciler, storageclass_reconciler};
use super::preflight::PreflightCondition;
use super::registry::DependentRegistry;
use super::router::{presence_changes, EventRouter};
use super::{error_policy, reconcile};
use crate::crd::{
    AddonObject, Knative, KnativeBuild, KnativeIstio, KnativeMonitoring, KnativeServing,
};
use crate::declarative::{
    ChannelLoader, DeclarativeReconciler, KubeApplier, ManifestApplier, ManifestLoader,
};
use crate::{
    DEFAULT_MANIFEST_DIR, DEFAULT_ROOT_NAME, DEFAULT_ROOT_NAMESPACE, KNATIVE_FINALIZER,
    WATCH_TIMEOUT_SECS,
};

/// A controller future ready to be polled
pub type ControllerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Settings shared by all controllers
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Directory holding manifest channels and packages
    pub manifest_dir: PathBuf,
    /// Name of the singleton Knative root
    pub root_name: String,
    /// Namespace of the singleton Knative root
    pub root_namespace: String,
    /// Deployment gating Knative installation
    pub preflight: PreflightCondition,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            manifest_dir: PathBuf::from(DEFAULT_MANIFEST_DIR),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            preflight: PreflightCondition::default(),
        }
    }
}

fn watcher_config() -> WatcherConfig {
    WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS)
}

/// Watch only the singleton root; other Knatives in its namespace are ignored
fn root_watcher_config(config: &ControllerConfig) -> WatcherConfig {
    watcher_config().fields(&format!("metadata.name={}", config.root_name))
}

/// Build the Knative root controller
///
/// Besides the root itself it watches every registered dependent and the
/// presence of the preflight Deployment.
pub fn build_knative_controller(client: Client, config: &ControllerConfig) -> ControllerFuture {
    let addon_client: Arc<dyn AddonClient> = Arc::new(KubeAddonClient::new(client.clone()));
    let loader: Arc<dyn ManifestLoader> = Arc::new(ChannelLoader::new(&config.manifest_dir));
    let applier: Arc<dyn ManifestApplier> = Arc::new(KubeApplier::new(client.clone()));
    let registry = Arc::new(DependentRegistry::knative_default());

    let ctx = Arc::new(knative_reconciler(
        addon_client,
        loader,
        applier,
        KnativeOptions {
            preflight: config.preflight.clone(),
            registry: registry.clone(),
            finalizer: KNATIVE_FINALIZER.to_string(),
        },
    ));

    let router = EventRouter::new(&config.root_name, &config.root_namespace, registry);
    let knatives: Api<Knative> = Api::namespaced(client.clone(), &config.root_namespace);
    let deployments: Api<Deployment> =
        Api::namespaced(client.clone(), &config.preflight.namespace);
    let preflight_watch = presence_changes(watcher::watcher(
        deployments,
        watcher_config().fields(&format!("metadata.name={}", config.preflight.name)),
    ));

    tracing::info!(
        root = %router.root(),
        preflight = %config.preflight,
        "- Knative controller"
    );

    let (build_router, istio_router, monitoring_router, serving_router, deployment_router) = (
        router.clone(),
        router.clone(),
        router.clone(),
        router.clone(),
        router,
    );

    Box::pin(
        Controller::new(knatives, root_watcher_config(config))
            .watches(
                Api::<KnativeBuild>::all(client.clone()),
                watcher_config(),
                move |obj| build_router.map_dependent(&obj),
            )
            .watches(
                Api::<KnativeIstio>::all(client.clone()),
                watcher_config(),
                move |obj| istio_router.map_dependent(&obj),
            )
            .watches(
                Api::<KnativeMonitoring>::all(client.clone()),
                watcher_config(),
                move |obj| monitoring_router.map_dependent(&obj),
            )
            .watches(
                Api::<KnativeServing>::all(client),
                watcher_config(),
                move |obj| serving_router.map_dependent(&obj),
            )
            .watches_stream(preflight_watch, move |deployment| {
                deployment_router.map_deployment(&deployment)
            })
            .shutdown_on_signal()
            .run(reconcile::<Knative>, error_policy::<Knative>, ctx)
            .for_each(log_reconcile_result("Knative")),
    )
}

fn build_component_controller<K: AddonObject>(
    client: Client,
    ctx: Arc<DeclarativeReconciler<K>>,
    controller_name: &'static str,
) -> ControllerFuture {
    let api: Api<K> = Api::all(client);
    tracing::info!("- {} controller", controller_name);

    Box::pin(
        Controller::new(api, watcher_config())
            .shutdown_on_signal()
            .run(reconcile::<K>, error_policy::<K>, ctx)
            .for_each(log_reconcile_result(controller_name)),
    )
}

/// Build the controllers for the Knative components and the StorageClass add-on
pub fn build_component_controllers(
    client: Client,
    config: &ControllerConfig,
) -> Vec<ControllerFuture> {
    let addon_client: Arc<dyn AddonClient> = Arc::new(KubeAddonClient::new(client.clone()));
    let loader: Arc<dyn ManifestLoader> = Arc::new(ChannelLoader::new(&config.manifest_dir));
    let applier: Arc<dyn ManifestApplier> = Arc::new(KubeApplier::new(client.clone()));

    vec![
        build_component_controller(
            client.clone(),
            Arc::new(component_reconciler::<KnativeBuild>(
                addon_client.clone(),
                loader.clone(),
                applier.clone(),
            )),
            "KnativeBuild",
        ),
        build_component_controller(
            client.clone(),
            Arc::new(component_reconciler::<KnativeIstio>(
                addon_client.clone(),
                loader.clone(),
                applier.clone(),
            )),
            "KnativeIstio",
        ),
        build_component_controller(
            client.clone(),
            Arc::new(component_reconciler::<KnativeMonitoring>(
                addon_client.clone(),
                loader.clone(),
                applier.clone(),
            )),
            "KnativeMonitoring",
        ),
        build_component_controller(
            client.clone(),
            Arc::new(component_reconciler::<KnativeServing>(
                addon_client,
                loader.clone(),
                applier.clone(),
            )),
            "KnativeServing",
        ),
        build_component_controller(
            client,
            Arc::new(storageclass_reconciler(loader, applier)),
            "StorageClass",
        ),
    ]
}

/// Log the outcome of each reconciliation
fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", controller_name),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}
