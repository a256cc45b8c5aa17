// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("Pod not found: {name}")]
	PodNotFound { name: String },

	#[error("Namespace not found: {name}")]
	NamespaceNotFound { name: String },

	#[error("Deployment not found: {name}")]
	DeploymentNotFound { name: String },

	#[error("Service account not found: {name}")]
	ServiceAccountNotFound { name: String },

	#[error("Cluster role binding not found: {name}")]
	ClusterRoleBindingNotFound { name: String },

	#[error("{kind} already exists: {name}")]
	AlreadyExists { kind: &'static str, name: String },

	#[error("Attach error: {message}")]
	AttachError { message: String },

	#[error("Port forward error: {message}")]
	PortForwardError { message: String },

	#[error("Kubeconfig error: {message}")]
	Config { message: String },
}

impl K8sError {
	/// Whether the error reports a missing object of any kind.
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			K8sError::PodNotFound { .. }
				| K8sError::NamespaceNotFound { .. }
				| K8sError::DeploymentNotFound { .. }
				| K8sError::ServiceAccountNotFound { .. }
				| K8sError::ClusterRoleBindingNotFound { .. }
		)
	}

	pub fn is_already_exists(&self) -> bool {
		matches!(self, K8sError::AlreadyExists { .. })
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}
