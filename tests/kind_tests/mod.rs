//! Integration tests for the add-on operators
//!
//! These tests require a Kubernetes cluster (kind) to run.
//!
//! # Test Organization
//!
//! - `crd_operations`: Stories about creating add-on resources and writing
//!   their status and finalizers through the Kubernetes API
//!
//! - `knative_lifecycle`: Stories about the Knative reconciler running against
//!   a real API server: the preflight gate and cross-namespace teardown
//!
//! # Running These Tests
//!
//! ```bash
//! cargo test --test kind -- --ignored
//! ```

mod crd_operations;
mod helpers;
