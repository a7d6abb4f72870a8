//! Integration tests for CRD operations
//!
//! These tests tell the story of how add-on resources behave on a real API
//! server: specs persist, status is written through the status subresource,
//! and finalizer writes leave other controllers' tokens alone.

use kube::api::{Api, DeleteParams, PostParams};
use kube::{Client, Resource, ResourceExt};

use addon_operators::controller::{AddonClient, KubeAddonClient, RootRef};
use addon_operators::crd::{CommonSpec, CommonStatus, Knative, KnativeServing, KnativeSpec};
use addon_operators::KNATIVE_FINALIZER;

use super::helpers::{ensure_namespace, ensure_test_cluster};

const NAMESPACE: &str = "crd-operations";

// =============================================================================
// Test Fixtures
// =============================================================================

fn sample_knative(name: &str, version: Option<&str>) -> Knative {
    let mut knative = Knative::new(
        name,
        KnativeSpec {
            common: CommonSpec {
                version: version.map(str::to_string),
                channel: None,
            },
        },
    );
    knative.meta_mut().namespace = Some(NAMESPACE.to_string());
    knative
}

/// Helper to cleanup a Knative resource, releasing any finalizers first
async fn cleanup_knative(client: &Client, name: &str) {
    let api: Api<Knative> = Api::namespaced(client.clone(), NAMESPACE);
    if let Ok(existing) = api.get(name).await {
        let addon = KubeAddonClient::new(client.clone());
        let _ = addon
            .patch_finalizers(&RootRef::of(&existing), Vec::new())
            .await;
    }
    let _ = api.delete(name, &DeleteParams::default()).await;
}

// =============================================================================
// Spec and Status Stories
// =============================================================================

/// Story: A pinned version survives the round trip through the API server
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_user_pins_knative_version() {
    let client = ensure_test_cluster()
        .await
        .expect("failed to setup cluster");
    ensure_namespace(&client, NAMESPACE).await;
    let api: Api<Knative> = Api::namespaced(client.clone(), NAMESPACE);
    let name = "pinned";
    cleanup_knative(&client, name).await;

    api.create(&PostParams::default(), &sample_knative(name, Some("0.3.0")))
        .await
        .expect("failed to create Knative");

    let fetched = api.get(name).await.expect("failed to get Knative");
    assert_eq!(fetched.spec.common.version.as_deref(), Some("0.3.0"));
    assert!(fetched.status.is_none(), "fresh resources carry no status");

    cleanup_knative(&client, name).await;
}

/// Story: The operator reports problems through the status subresource
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_operator_writes_status() {
    let client = ensure_test_cluster()
        .await
        .expect("failed to setup cluster");
    ensure_namespace(&client, NAMESPACE).await;
    let api: Api<Knative> = Api::namespaced(client.clone(), NAMESPACE);
    let name = "status";
    cleanup_knative(&client, name).await;

    let created = api
        .create(&PostParams::default(), &sample_knative(name, None))
        .await
        .expect("failed to create Knative");
    let addon = KubeAddonClient::new(client.clone());

    let unhealthy = CommonStatus::unhealthy("istio-system/istio-pilot not found");
    addon
        .patch_status(&RootRef::of(&created), &unhealthy)
        .await
        .expect("failed to patch status");
    let fetched = api.get(name).await.expect("failed to get Knative");
    assert_eq!(fetched.status, Some(unhealthy));

    // Clearing the errors must actually empty the list on the server
    let healthy = CommonStatus::from_errors(vec![]);
    addon
        .patch_status(&RootRef::of(&fetched), &healthy)
        .await
        .expect("failed to patch status");
    let fetched = api.get(name).await.expect("failed to get Knative");
    assert_eq!(fetched.status, Some(healthy));

    cleanup_knative(&client, name).await;
}

// =============================================================================
// Finalizer Stories
// =============================================================================

/// Story: Adding our finalizer keeps the tokens other controllers placed
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_finalizer_write_preserves_foreign_tokens() {
    let client = ensure_test_cluster()
        .await
        .expect("failed to setup cluster");
    ensure_namespace(&client, NAMESPACE).await;
    let api: Api<Knative> = Api::namespaced(client.clone(), NAMESPACE);
    let name = "finalizers";
    cleanup_knative(&client, name).await;

    let mut knative = sample_knative(name, None);
    knative.meta_mut().finalizers = Some(vec!["example.com/other".to_string()]);
    let created = api
        .create(&PostParams::default(), &knative)
        .await
        .expect("failed to create Knative");

    let mut finalizers = created.finalizers().to_vec();
    finalizers.push(KNATIVE_FINALIZER.to_string());
    KubeAddonClient::new(client.clone())
        .patch_finalizers(&RootRef::of(&created), finalizers)
        .await
        .expect("failed to patch finalizers");

    let fetched = api.get(name).await.expect("failed to get Knative");
    assert_eq!(
        fetched.finalizers(),
        &["example.com/other".to_string(), KNATIVE_FINALIZER.to_string()]
    );

    cleanup_knative(&client, name).await;
}

/// Story: A finalizer write based on a stale read is rejected
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_stale_finalizer_write_conflicts() {
    let client = ensure_test_cluster()
        .await
        .expect("failed to setup cluster");
    ensure_namespace(&client, NAMESPACE).await;
    let api: Api<Knative> = Api::namespaced(client.clone(), NAMESPACE);
    let name = "stale";
    cleanup_knative(&client, name).await;

    let created = api
        .create(&PostParams::default(), &sample_knative(name, None))
        .await
        .expect("failed to create Knative");
    let addon = KubeAddonClient::new(client.clone());

    addon
        .patch_finalizers(&RootRef::of(&created), vec![KNATIVE_FINALIZER.to_string()])
        .await
        .expect("first write should succeed");
    let result = addon
        .patch_finalizers(&RootRef::of(&created), Vec::new())
        .await;
    assert!(result.is_err(), "write with an old resourceVersion must fail");

    cleanup_knative(&client, name).await;
}

// =============================================================================
// Component Stories
// =============================================================================

/// Story: Component resources live in their own namespace
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_component_resource_is_namespaced() {
    let client = ensure_test_cluster()
        .await
        .expect("failed to setup cluster");
    ensure_namespace(&client, "knative-serving").await;
    let api: Api<KnativeServing> = Api::namespaced(client.clone(), "knative-serving");
    let _ = api.delete("crd-test", &DeleteParams::default()).await;

    let created = api
        .create(
            &PostParams::default(),
            &KnativeServing::new("crd-test", Default::default()),
        )
        .await
        .expect("failed to create KnativeServing");
    assert_eq!(created.namespace().as_deref(), Some("knative-serving"));

    let _ = api.delete("crd-test", &DeleteParams::default()).await;
}
