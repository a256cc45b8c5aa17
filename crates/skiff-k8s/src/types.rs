// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::pin::Pin;

use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::error::K8sError;

pub use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
pub use k8s_openapi::api::core::v1::{
	Container, ContainerState, ContainerStateRunning, ContainerStateTerminated,
	ContainerStateWaiting, ContainerStatus, LocalObjectReference, Namespace, Pod, PodSpec,
	PodStatus, ServiceAccount,
};
pub use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleRef, Subject};

/// Resolves once the remote side of a stream has finished.
pub type CompletionFuture = BoxFuture<'static, Result<(), K8sError>>;

/// Which streams to request when attaching to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachOptions {
	pub stdin: bool,
	pub tty: bool,
}

impl Default for AttachOptions {
	fn default() -> Self {
		Self {
			stdin: true,
			tty: true,
		}
	}
}

/// Owner-side handle for an upgraded connection.
///
/// Closing is idempotent. Whoever holds the handle must close it once the
/// session is over, whatever the outcome.
#[derive(Debug, Clone, Default)]
pub struct TransportHandle {
	token: CancellationToken,
}

impl TransportHandle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn close(&self) {
		self.token.cancel();
	}

	pub fn is_closed(&self) -> bool {
		self.token.is_cancelled()
	}

	/// Wait until some holder closes the transport.
	pub async fn closed(&self) {
		self.token.cancelled().await;
	}
}

/// Bidirectional stream for container I/O via attach.
pub struct AttachedProcess {
	pub stdin: Option<Pin<Box<dyn AsyncWrite + Send>>>,
	pub stdout: Pin<Box<dyn AsyncRead + Send>>,
	/// Absent for TTY sessions, where stderr is merged into stdout.
	pub stderr: Option<Pin<Box<dyn AsyncRead + Send>>>,
	pub completion: CompletionFuture,
	pub transport: TransportHandle,
}

/// Byte stream carried by a port-forward tunnel.
pub trait TunnelIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> TunnelIo for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// A single forwarded connection to one remote port.
pub struct ForwardTunnel {
	pub stream: Box<dyn TunnelIo>,
	/// Resolves when the tunnel has shut down; errors report a broken remote end.
	pub completion: CompletionFuture,
}

/// What the client knows about the cluster it is talking to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterInfo {
	/// Name of the kubeconfig context in use, if any.
	pub context: Option<String>,
	/// Name of the kubeconfig auth provider (e.g. `gcp`), if any.
	pub auth_provider: Option<String>,
}
