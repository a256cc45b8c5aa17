// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Target resolution for skiff.
//!
//! This crate turns a [`TargetSelector`] into a running pod and container:
//! - [`status::classify`] derives the `kubectl`-style status of a pod
//! - [`policy`] decides which statuses abort, wait or qualify
//! - [`PodDiscovery`] polls the cluster until pods settle
//! - [`TargetResolver`] picks the pod and container a session binds to
//! - [`readiness`] prepares namespaces, RBAC and pull secrets

pub mod config;
pub mod deployment;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod net;
pub mod policy;
pub mod readiness;
pub mod resolver;
pub mod selector;
pub mod status;

#[cfg(test)]
mod fixtures;

pub use config::DiscoveryConfig;
pub use deployment::{pod_selector_for_deployment, pods_for_deployment};
pub use discovery::PodDiscovery;
pub use error::TargetError;
pub use identity::{AccountResolver, GcloudAccountResolver, StaticAccountResolver};
pub use policy::{classify_status, StatusClass};
pub use readiness::{
	ensure_cluster_role_binding, ensure_namespace, ensure_pull_secrets_on_service_account,
	is_local_kubernetes, BindingOutcome, NamespaceOutcome,
};
pub use resolver::TargetResolver;
pub use selector::{ResolvedTarget, TargetSelector};
pub use status::{classify, PodStatusString};
