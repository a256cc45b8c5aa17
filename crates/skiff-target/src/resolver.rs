// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Turns a [`TargetSelector`] into concrete, running pods.

use std::sync::Arc;

use skiff_k8s::{Container, K8sClient, Pod};
use tracing::{info, instrument};

use crate::config::DiscoveryConfig;
use crate::discovery::PodDiscovery;
use crate::error::TargetError;
use crate::selector::{ResolvedTarget, TargetSelector};

pub struct TargetResolver {
	discovery: PodDiscovery,
}

impl TargetResolver {
	pub fn new(client: Arc<dyn K8sClient>, config: DiscoveryConfig) -> Self {
		Self {
			discovery: PodDiscovery::new(client, config),
		}
	}

	pub fn discovery(&self) -> &PodDiscovery {
		&self.discovery
	}

	/// Resolve every running pod the selector describes.
	///
	/// With an explicit pod name only that pod is returned. Otherwise the image
	/// selector is required and the label selector is not consulted: all pods
	/// in the namespace running one of the images are waited for.
	///
	/// Unlike [`resolve_newest`](Self::resolve_newest), an empty image list
	/// does not mean "any image" here. Without a pod name it fails with
	/// [`TargetError::Configuration`] rather than waiting on every pod in the
	/// namespace.
	#[instrument(skip(self, selector), fields(namespace = ?selector.namespace))]
	pub async fn resolve_pods(&self, selector: &TargetSelector) -> Result<Vec<Pod>, TargetError> {
		let namespace = selector.namespace.as_deref();

		if let Some(name) = &selector.pod_name {
			let pod = self
				.discovery
				.wait_for_pod(name, namespace, selector.max_wait)
				.await?;
			return Ok(vec![pod]);
		}

		if selector.image_selector.is_empty() {
			return Err(TargetError::configuration(
				"resolving all pods requires an image selector or a pod name",
			));
		}

		self.discovery
			.running_pods_with_image(&selector.image_selector, namespace, selector.max_wait)
			.await
	}

	/// Resolve the newest running pod and the container to bind a session to.
	#[instrument(skip(self, selector), fields(namespace = ?selector.namespace))]
	pub async fn resolve_newest(
		&self,
		selector: &TargetSelector,
	) -> Result<ResolvedTarget, TargetError> {
		let namespace = selector.namespace.as_deref();

		let pod = match &selector.pod_name {
			Some(name) => {
				self.discovery
					.wait_for_pod(name, namespace, selector.max_wait)
					.await?
			}
			None => {
				self.discovery
					.newest_running_pod(
						&selector.label_selector,
						&selector.image_selector,
						namespace,
						selector.max_wait,
					)
					.await?
			}
		};

		let container = select_container(&pod, selector)?;
		let target = ResolvedTarget { pod, container };
		info!(
			pod = %target.pod_name(),
			container = %target.container_name(),
			"Resolved target"
		);
		Ok(target)
	}
}

/// Named container if requested, else the first one running a selected image,
/// else the first declared one.
fn select_container(pod: &Pod, selector: &TargetSelector) -> Result<Container, TargetError> {
	let pod_name = pod.metadata.name.clone().unwrap_or_default();
	let containers = pod
		.spec
		.as_ref()
		.map(|spec| spec.containers.as_slice())
		.unwrap_or_default();

	if let Some(wanted) = &selector.container_name {
		return containers
			.iter()
			.find(|c| &c.name == wanted)
			.cloned()
			.ok_or_else(|| TargetError::ContainerNotFound {
				pod: pod_name,
				container: wanted.clone(),
			});
	}

	containers
		.iter()
		.find(|c| !selector.image_selector.is_empty() && selector.accepts_image(c.image.as_deref()))
		.or_else(|| containers.first())
		.cloned()
		.ok_or_else(|| TargetError::configuration(format!("Pod '{pod_name}' declares no containers")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::{running, waiting, PodBuilder};
	use skiff_k8s::MockK8sClient;
	use std::time::Duration;

	fn two_container_pod(name: &str) -> Pod {
		PodBuilder::new(name)
			.phase("Running")
			.label("app", "web")
			.created_at(100)
			.container("proxy", "proxy:v1")
			.container("web", "web:v1")
			.status("proxy", true, running())
			.status("web", true, running())
			.build()
	}

	fn resolver(client: &Arc<MockK8sClient>) -> TargetResolver {
		TargetResolver::new(client.clone(), DiscoveryConfig::default())
	}

	#[tokio::test(start_paused = true)]
	async fn resolve_newest_defaults_to_first_container() {
		let client = Arc::new(MockK8sClient::new());
		client.set_pods(vec![two_container_pod("web-1")]);

		let target = resolver(&client)
			.resolve_newest(&TargetSelector::with_labels("app=web"))
			.await
			.unwrap();

		assert_eq!(target.pod_name(), "web-1");
		assert_eq!(target.container_name(), "proxy");
		assert_eq!(target.namespace(), "default");
	}

	#[tokio::test(start_paused = true)]
	async fn resolve_newest_prefers_container_with_selected_image() {
		let client = Arc::new(MockK8sClient::new());
		client.set_pods(vec![two_container_pod("web-1")]);

		let selector = TargetSelector::with_labels("app=web").images(["web:v1"]);
		let target = resolver(&client).resolve_newest(&selector).await.unwrap();

		assert_eq!(target.container_name(), "web");
	}

	#[tokio::test(start_paused = true)]
	async fn resolve_newest_with_named_container() {
		let client = Arc::new(MockK8sClient::new());
		client.set_pods(vec![two_container_pod("web-1")]);

		let selector = TargetSelector::with_labels("app=web").container("web");
		let target = resolver(&client).resolve_newest(&selector).await.unwrap();
		assert_eq!(target.container_name(), "web");

		let selector = TargetSelector::with_labels("app=web").container("missing");
		let err = resolver(&client).resolve_newest(&selector).await.unwrap_err();
		assert!(matches!(
			err,
			TargetError::ContainerNotFound { ref pod, ref container } if pod == "web-1" && container == "missing"
		));
	}

	#[tokio::test(start_paused = true)]
	async fn resolve_newest_by_pod_name() {
		let client = Arc::new(MockK8sClient::new());
		client.set_pods(vec![two_container_pod("web-1"), two_container_pod("web-2")]);

		let selector = TargetSelector::default().pod("web-2");
		let target = resolver(&client).resolve_newest(&selector).await.unwrap();
		assert_eq!(target.pod_name(), "web-2");
	}

	#[tokio::test(start_paused = true)]
	async fn resolve_newest_image_only_crash_loop_is_critical() {
		let client = Arc::new(MockK8sClient::new());
		client.set_pods(vec![PodBuilder::new("app-1")
			.phase("Running")
			.container("app", "app:v1")
			.status("app", false, waiting("CrashLoopBackOff"))
			.build()]);

		let selector = TargetSelector::default().images(["app:v1"]);
		let err = resolver(&client).resolve_newest(&selector).await.unwrap_err();

		match err {
			TargetError::CriticalPodStatus { pod, status } => {
				assert_eq!(pod, "app-1");
				assert_eq!(status, "CrashLoopBackOff");
			}
			other => panic!("unexpected error: {other:?}"),
		}
		assert_eq!(client.list_calls(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn resolve_newest_with_no_pods_is_no_match() {
		let client = Arc::new(MockK8sClient::new());
		client.set_pods(vec![]);

		let selector = TargetSelector::with_labels("app=web").max_wait(Duration::from_secs(600));
		let err = resolver(&client).resolve_newest(&selector).await.unwrap_err();
		assert!(matches!(err, TargetError::NoMatch { .. }));
	}

	#[tokio::test(start_paused = true)]
	async fn resolve_pods_requires_images_or_name() {
		let client = Arc::new(MockK8sClient::new());
		let err = resolver(&client)
			.resolve_pods(&TargetSelector::with_labels("app=web"))
			.await
			.unwrap_err();
		assert!(matches!(err, TargetError::Configuration(_)));
		assert_eq!(client.list_calls(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn resolve_pods_by_image() {
		let client = Arc::new(MockK8sClient::new());
		client.set_pods(vec![two_container_pod("web-1"), two_container_pod("web-2")]);

		let pods = resolver(&client)
			.resolve_pods(&TargetSelector::default().images(["web:v1"]))
			.await
			.unwrap();
		assert_eq!(pods.len(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn resolve_pods_by_name() {
		let client = Arc::new(MockK8sClient::new());
		client.set_pods(vec![two_container_pod("web-1"), two_container_pod("web-2")]);

		let pods = resolver(&client)
			.resolve_pods(&TargetSelector::default().pod("web-1"))
			.await
			.unwrap();
		assert_eq!(pods.len(), 1);
		assert_eq!(pods[0].metadata.name.as_deref(), Some("web-1"));
	}
}
