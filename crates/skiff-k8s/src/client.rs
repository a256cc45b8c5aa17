// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::K8sError;
use crate::types::{
	AttachOptions, AttachedProcess, ClusterInfo, ClusterRoleBinding, Deployment, ForwardTunnel,
	Namespace, Pod, ServiceAccount,
};

/// Trait for K8s client operations.
///
/// Target resolution, readiness setup and sessions only talk to the cluster
/// through this trait, so tests can swap in [`crate::MockK8sClient`].
#[async_trait]
pub trait K8sClient: Send + Sync {
	/// Namespace used when a caller does not name one.
	fn default_namespace(&self) -> &str;

	/// Context and auth provider of the active kubeconfig.
	fn cluster_info(&self) -> &ClusterInfo;

	/// List pods in a namespace matching the given label selector.
	///
	/// An empty selector lists every pod in the namespace.
	async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError>;

	/// Get a specific pod by name from the specified namespace.
	async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod, K8sError>;

	/// Get a deployment by name from the specified namespace.
	async fn get_deployment(&self, name: &str, namespace: &str) -> Result<Deployment, K8sError>;

	/// Get a namespace by name.
	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError>;

	/// Create a namespace with the given name.
	async fn create_namespace(&self, name: &str) -> Result<Namespace, K8sError>;

	/// Get a cluster role binding by name.
	async fn get_cluster_role_binding(&self, name: &str) -> Result<ClusterRoleBinding, K8sError>;

	/// Create a cluster role binding.
	async fn create_cluster_role_binding(
		&self,
		binding: ClusterRoleBinding,
	) -> Result<ClusterRoleBinding, K8sError>;

	/// Get a service account by name from the specified namespace.
	async fn get_service_account(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<ServiceAccount, K8sError>;

	/// Replace a service account with an updated copy.
	async fn replace_service_account(
		&self,
		namespace: &str,
		account: ServiceAccount,
	) -> Result<ServiceAccount, K8sError>;

	/// Attach to a running container's streams for interactive I/O.
	async fn exec_attach(
		&self,
		name: &str,
		namespace: &str,
		container: &str,
		opts: AttachOptions,
	) -> Result<AttachedProcess, K8sError>;

	/// Open one tunnel to `port` inside the pod.
	async fn open_port_forward(
		&self,
		name: &str,
		namespace: &str,
		port: u16,
	) -> Result<ForwardTunnel, K8sError>;
}
