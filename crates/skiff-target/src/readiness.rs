// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! One-shot cluster setup performed before sessions are opened.
//!
//! Each helper is idempotent: running it against a cluster that is already
//! set up changes nothing, and losing a creation race to another client counts
//! as success.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use skiff_k8s::{
	ClusterInfo, ClusterRoleBinding, K8sClient, LocalObjectReference, RoleRef, Subject,
};
use tracing::{debug, info, warn};

use crate::error::TargetError;
use crate::identity::AccountResolver;

/// Name of the binding that grants the developer cluster-admin.
pub const CLUSTER_ROLE_BINDING_NAME: &str = "skiff-user";

/// Kubeconfig contexts that point at a cluster on the developer's machine.
pub const LOCAL_CONTEXTS: &[&str] = &["minikube", "docker-desktop", "docker-for-desktop"];

/// Auth provider name used by Google Kubernetes Engine kubeconfigs.
pub const GCP_AUTH_PROVIDER: &str = "gcp";

/// Service account that pods run as unless told otherwise.
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceOutcome {
	Existing,
	Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOutcome {
	/// The context points at a local cluster.
	SkippedLocalCluster,
	/// A binding with the expected name already exists and was not inspected.
	AlreadyPresent,
	/// The client does not authenticate through the cloud identity provider.
	NotApplicable,
	Created,
}

pub fn is_local_kubernetes(context: Option<&str>) -> bool {
	context.is_some_and(|context| LOCAL_CONTEXTS.contains(&context))
}

/// Make sure `name` exists, creating it when missing.
pub async fn ensure_namespace(
	client: &dyn K8sClient,
	name: &str,
) -> Result<NamespaceOutcome, TargetError> {
	match client.get_namespace(name).await {
		Ok(_) => Ok(NamespaceOutcome::Existing),
		Err(e) if e.is_not_found() => match client.create_namespace(name).await {
			Ok(_) => {
				info!(namespace = %name, "Created namespace");
				Ok(NamespaceOutcome::Created)
			}
			Err(e) if e.is_already_exists() => {
				debug!(namespace = %name, "Namespace was created concurrently");
				Ok(NamespaceOutcome::Existing)
			}
			Err(e) => Err(e.into()),
		},
		Err(e) => Err(e.into()),
	}
}

fn admin_binding(account: &str) -> ClusterRoleBinding {
	ClusterRoleBinding {
		metadata: ObjectMeta {
			name: Some(CLUSTER_ROLE_BINDING_NAME.to_string()),
			..Default::default()
		},
		role_ref: RoleRef {
			api_group: "rbac.authorization.k8s.io".to_string(),
			kind: "ClusterRole".to_string(),
			name: "cluster-admin".to_string(),
		},
		subjects: Some(vec![Subject {
			kind: "User".to_string(),
			name: account.to_string(),
			..Default::default()
		}]),
	}
}

/// Grant the cloud account behind the current context cluster-admin.
///
/// Only clusters reached through the `gcp` auth provider need this. Local
/// clusters and other auth providers are skipped before the API is consulted.
pub async fn ensure_cluster_role_binding(
	client: &dyn K8sClient,
	cluster: &ClusterInfo,
	accounts: &dyn AccountResolver,
) -> Result<BindingOutcome, TargetError> {
	if is_local_kubernetes(cluster.context.as_deref()) {
		return Ok(BindingOutcome::SkippedLocalCluster);
	}

	if cluster.auth_provider.as_deref() != Some(GCP_AUTH_PROVIDER) {
		return Ok(BindingOutcome::NotApplicable);
	}

	match client.get_cluster_role_binding(CLUSTER_ROLE_BINDING_NAME).await {
		Ok(_) => return Ok(BindingOutcome::AlreadyPresent),
		Err(e) if e.is_not_found() => {}
		Err(e) => return Err(e.into()),
	}

	let account = accounts
		.active_account()
		.await
		.ok_or(TargetError::AccountUndetermined)?;

	match client.create_cluster_role_binding(admin_binding(&account)).await {
		Ok(_) => {
			info!(
				binding = CLUSTER_ROLE_BINDING_NAME,
				account = %account,
				"Created cluster role binding"
			);
			Ok(BindingOutcome::Created)
		}
		Err(e) if e.is_already_exists() => Ok(BindingOutcome::AlreadyPresent),
		Err(e) => Err(e.into()),
	}
}

/// Make the namespace's default service account reference `secrets` as image
/// pull secrets. Returns whether the account had to be updated.
///
/// A namespace without a default service account is left alone.
pub async fn ensure_pull_secrets_on_service_account(
	client: &dyn K8sClient,
	namespace: &str,
	secrets: &[String],
) -> Result<bool, TargetError> {
	let mut account = match client
		.get_service_account(DEFAULT_SERVICE_ACCOUNT, namespace)
		.await
	{
		Ok(account) => account,
		Err(e) if e.is_not_found() => {
			warn!(
				namespace = %namespace,
				error = %e,
				"Default service account missing, skipping pull secrets"
			);
			return Ok(false);
		}
		Err(e) => return Err(e.into()),
	};

	let attached = account.image_pull_secrets.get_or_insert_with(Vec::new);
	let mut changed = false;
	for secret in secrets {
		if !attached.iter().any(|existing| &existing.name == secret) {
			attached.push(LocalObjectReference {
				name: secret.clone(),
			});
			changed = true;
		}
	}

	if changed {
		client.replace_service_account(namespace, account).await?;
		info!(namespace = %namespace, "Added pull secrets to default service account");
	}
	Ok(changed)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::identity::StaticAccountResolver;
	use skiff_k8s::{MockK8sClient, ServiceAccount};

	fn gke() -> ClusterInfo {
		ClusterInfo {
			context: Some("gke_project_zone_cluster".to_string()),
			auth_provider: Some(GCP_AUTH_PROVIDER.to_string()),
		}
	}

	fn account(email: &str) -> StaticAccountResolver {
		StaticAccountResolver(Some(email.to_string()))
	}

	#[test]
	fn test_local_contexts() {
		assert!(is_local_kubernetes(Some("minikube")));
		assert!(is_local_kubernetes(Some("docker-desktop")));
		assert!(is_local_kubernetes(Some("docker-for-desktop")));
		assert!(!is_local_kubernetes(Some("kind-dev")));
		assert!(!is_local_kubernetes(None));
	}

	#[tokio::test]
	async fn test_ensure_namespace_creates_once() {
		let client = MockK8sClient::new();

		assert_eq!(
			ensure_namespace(&client, "dev").await.unwrap(),
			NamespaceOutcome::Created
		);
		assert_eq!(
			ensure_namespace(&client, "dev").await.unwrap(),
			NamespaceOutcome::Existing
		);
		assert_eq!(client.namespace_creates(), 1);
		assert_eq!(client.namespace_names(), vec!["dev".to_string()]);
	}

	#[tokio::test]
	async fn test_ensure_existing_namespace_is_idempotent() {
		let client = MockK8sClient::new();
		client.add_namespace("dev");

		for _ in 0..2 {
			assert_eq!(
				ensure_namespace(&client, "dev").await.unwrap(),
				NamespaceOutcome::Existing
			);
		}
		assert_eq!(client.namespace_creates(), 0);
		assert_eq!(client.namespace_names().len(), 1);
	}

	#[tokio::test]
	async fn test_binding_skipped_for_local_cluster() {
		let client = MockK8sClient::new();
		let cluster = ClusterInfo {
			context: Some("minikube".to_string()),
			auth_provider: Some(GCP_AUTH_PROVIDER.to_string()),
		};

		let outcome = ensure_cluster_role_binding(&client, &cluster, &account("dev@example.com"))
			.await
			.unwrap();
		assert_eq!(outcome, BindingOutcome::SkippedLocalCluster);
		assert!(client.cluster_role_binding(CLUSTER_ROLE_BINDING_NAME).is_none());
	}

	#[tokio::test]
	async fn test_binding_created_for_gcp_account() {
		let client = MockK8sClient::new();

		let outcome = ensure_cluster_role_binding(&client, &gke(), &account("dev@example.com"))
			.await
			.unwrap();
		assert_eq!(outcome, BindingOutcome::Created);

		let binding = client.cluster_role_binding(CLUSTER_ROLE_BINDING_NAME).unwrap();
		assert_eq!(binding.role_ref.name, "cluster-admin");
		assert_eq!(binding.role_ref.kind, "ClusterRole");
		let subjects = binding.subjects.unwrap();
		assert_eq!(subjects[0].kind, "User");
		assert_eq!(subjects[0].name, "dev@example.com");
	}

	#[tokio::test]
	async fn test_existing_binding_left_untouched() {
		let client = MockK8sClient::new();
		client.add_cluster_role_binding(admin_binding("someone-else@example.com"));

		let outcome = ensure_cluster_role_binding(&client, &gke(), &account("dev@example.com"))
			.await
			.unwrap();
		assert_eq!(outcome, BindingOutcome::AlreadyPresent);

		let binding = client.cluster_role_binding(CLUSTER_ROLE_BINDING_NAME).unwrap();
		assert_eq!(binding.subjects.unwrap()[0].name, "someone-else@example.com");
	}

	#[tokio::test]
	async fn test_binding_not_applicable_without_gcp_auth() {
		let client = MockK8sClient::new();
		let cluster = ClusterInfo {
			context: Some("eks-prod".to_string()),
			auth_provider: None,
		};

		let outcome = ensure_cluster_role_binding(&client, &cluster, &StaticAccountResolver(None))
			.await
			.unwrap();
		assert_eq!(outcome, BindingOutcome::NotApplicable);
		assert_eq!(client.cluster_role_binding_reads(), 0);
	}

	#[tokio::test]
	async fn test_binding_not_applicable_when_reads_are_forbidden() {
		let client = MockK8sClient::new();
		client.forbid_cluster_role_bindings();
		let cluster = ClusterInfo {
			context: Some("eks-prod".to_string()),
			auth_provider: None,
		};

		let outcome = ensure_cluster_role_binding(&client, &cluster, &StaticAccountResolver(None))
			.await
			.unwrap();
		assert_eq!(outcome, BindingOutcome::NotApplicable);
		assert_eq!(client.cluster_role_binding_reads(), 0);
	}

	#[tokio::test]
	async fn test_forbidden_read_fails_for_gcp_cluster() {
		let client = MockK8sClient::new();
		client.forbid_cluster_role_bindings();

		let err = ensure_cluster_role_binding(&client, &gke(), &account("dev@example.com"))
			.await
			.unwrap_err();
		assert!(matches!(err, TargetError::K8s(_)));
		assert!(client.cluster_role_binding(CLUSTER_ROLE_BINDING_NAME).is_none());
	}

	#[tokio::test]
	async fn test_undetermined_account_fails() {
		let client = MockK8sClient::new();

		let err = ensure_cluster_role_binding(&client, &gke(), &StaticAccountResolver(None))
			.await
			.unwrap_err();
		assert!(matches!(err, TargetError::AccountUndetermined));
		assert!(client.cluster_role_binding(CLUSTER_ROLE_BINDING_NAME).is_none());
	}

	fn default_account(secrets: &[&str]) -> ServiceAccount {
		ServiceAccount {
			metadata: ObjectMeta {
				name: Some(DEFAULT_SERVICE_ACCOUNT.to_string()),
				..Default::default()
			},
			image_pull_secrets: Some(
				secrets
					.iter()
					.map(|name| LocalObjectReference {
						name: name.to_string(),
					})
					.collect(),
			),
			..Default::default()
		}
	}

	#[tokio::test]
	async fn test_pull_secrets_added_once() {
		let client = MockK8sClient::new();
		client.add_service_account("dev", default_account(&["existing"]));
		let secrets = vec!["existing".to_string(), "registry".to_string()];

		assert!(ensure_pull_secrets_on_service_account(&client, "dev", &secrets)
			.await
			.unwrap());
		assert!(!ensure_pull_secrets_on_service_account(&client, "dev", &secrets)
			.await
			.unwrap());
		assert_eq!(client.service_account_replaces(), 1);

		let names: Vec<String> = client
			.service_account(DEFAULT_SERVICE_ACCOUNT, "dev")
			.unwrap()
			.image_pull_secrets
			.unwrap()
			.into_iter()
			.map(|s| s.name)
			.collect();
		assert_eq!(names, vec!["existing".to_string(), "registry".to_string()]);
	}

	#[tokio::test]
	async fn test_pull_secrets_without_service_account() {
		let client = MockK8sClient::new();
		let changed = ensure_pull_secrets_on_service_account(&client, "dev", &["registry".to_string()])
			.await
			.unwrap();
		assert!(!changed);
		assert_eq!(client.service_account_replaces(), 0);
	}
}
