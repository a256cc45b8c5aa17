// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Target resolution error types.

/// Errors that can occur while resolving a selector to a ready container.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
	/// A matching pod is in a state it will not recover from on its own
	#[error("Pod '{pod}' cannot start (Status: {status})")]
	CriticalPodStatus { pod: String, status: String },

	/// The wait budget ran out before a matching pod became ready
	#[error("Waiting for pods matching {selector} in namespace {namespace} timed out")]
	Timeout { selector: String, namespace: String },

	/// No pod matched the selector during the initial grace period
	#[error("Couldn't find a pod with selector {selector} in namespace {namespace}")]
	NoMatch { selector: String, namespace: String },

	/// The cluster objects or the selector cannot be used as given
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// The requested container is not declared by the pod
	#[error("Container '{container}' not found in pod '{pod}'")]
	ContainerNotFound { pod: String, container: String },

	/// The active cloud account could not be determined
	#[error("Couldn't determine google cloud username. Make sure you are logged in to gcloud")]
	AccountUndetermined,

	/// Kubernetes error
	#[error(transparent)]
	K8s(#[from] skiff_k8s::K8sError),
}

impl TargetError {
	pub(crate) fn configuration(msg: impl Into<String>) -> Self {
		Self::Configuration(msg.into())
	}
}
