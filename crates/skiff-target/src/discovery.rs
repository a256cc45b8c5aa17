// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Polling loops that wait for pods to come up.
//!
//! Every iteration sleeps one poll interval, reads the cluster, evaluates the
//! snapshot and sleeps again. The wait budget is charged two poll intervals per
//! iteration regardless of how long the API calls took, so the number of reads
//! a budget buys is fixed by configuration alone.

use std::sync::Arc;
use std::time::Duration;

use skiff_k8s::{K8sClient, Pod};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::DiscoveryConfig;
use crate::error::TargetError;
use crate::policy::is_critical;
use crate::status::classify;

/// Waits for pods matching a selector to reach a usable state.
pub struct PodDiscovery {
	client: Arc<dyn K8sClient>,
	config: DiscoveryConfig,
}

/// Outcome of evaluating one snapshot for image-set discovery.
enum ImageSetFrame {
	/// Every matching pod has settled; these are the running ones.
	Settled(Vec<Pod>),
	/// At least one matching pod is still on its way up.
	Pending,
}

impl PodDiscovery {
	pub fn new(client: Arc<dyn K8sClient>, config: DiscoveryConfig) -> Self {
		Self { client, config }
	}

	pub fn config(&self) -> &DiscoveryConfig {
		&self.config
	}

	pub fn client(&self) -> &Arc<dyn K8sClient> {
		&self.client
	}

	fn namespace_or_default<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
		namespace.unwrap_or_else(|| self.client.default_namespace())
	}

	/// Wait until every pod running one of `images` has settled and return the
	/// running ones.
	///
	/// A snapshot with a pod still starting is never accepted. A settled
	/// snapshot with no running pods is only accepted once the configured
	/// minimum wait has been spent, since the pods may not have been created
	/// yet.
	pub async fn running_pods_with_image(
		&self,
		images: &[String],
		namespace: Option<&str>,
		max_wait: Duration,
	) -> Result<Vec<Pod>, TargetError> {
		let namespace = self.namespace_or_default(namespace);
		let interval = self.config.poll_interval;
		let cost = self.config.iteration_cost();

		// `None` once the budget has gone below zero.
		let mut remaining = Some(max_wait);
		let mut min_wait = self.config.min_wait;

		while remaining.is_some() {
			sleep(interval).await;

			let pods = self.client.list_pods(namespace, "").await?;
			if !pods.is_empty() {
				match evaluate_image_set(&pods, images)? {
					ImageSetFrame::Settled(found) if !found.is_empty() || min_wait.is_zero() => {
						info!(
							namespace = %namespace,
							count = found.len(),
							"Found running pods for images"
						);
						return Ok(found);
					}
					ImageSetFrame::Settled(_) => {
						debug!(namespace = %namespace, "No running pods with images yet");
					}
					ImageSetFrame::Pending => {
						debug!(namespace = %namespace, "Pods with images are still starting");
					}
				}
			}

			sleep(interval).await;
			remaining = remaining.and_then(|r| r.checked_sub(cost));
			min_wait = min_wait.saturating_sub(cost);
		}

		Err(TargetError::Timeout {
			selector: format!("image names '{}'", images.join(",")),
			namespace: namespace.to_string(),
		})
	}

	/// Wait for the newest pod matching `label_selector` (and `images`, when
	/// non-empty) to be running.
	pub async fn newest_running_pod(
		&self,
		label_selector: &str,
		images: &[String],
		namespace: Option<&str>,
		max_wait: Duration,
	) -> Result<Pod, TargetError> {
		let namespace = self.namespace_or_default(namespace);
		let interval = self.config.poll_interval;
		let cost = self.config.iteration_cost();
		let started = Instant::now();
		let mut remaining = max_wait;

		loop {
			sleep(interval).await;

			let pods = self.client.list_pods(namespace, label_selector).await?;
			match select_newest(&pods, images) {
				Some(pod) => {
					let status = classify(pod);
					if status == "Running" {
						return Ok(pod.clone());
					}
					if is_critical(status.as_str()) {
						return Err(TargetError::CriticalPodStatus {
							pod: pod_name(pod).to_string(),
							status: status.into_string(),
						});
					}
					debug!(
						pod = %pod_name(pod),
						status = %status,
						"Waiting for pod to start"
					);
				}
				None if started.elapsed() > self.config.no_match_grace => {
					return Err(TargetError::NoMatch {
						selector: describe_selector(label_selector),
						namespace: namespace.to_string(),
					});
				}
				None => {
					debug!(
						selector = %label_selector,
						namespace = %namespace,
						"No pod matches selector yet"
					);
				}
			}

			sleep(interval).await;
			remaining = remaining.saturating_sub(cost);
			if remaining.is_zero() {
				break;
			}
		}

		Err(TargetError::Timeout {
			selector: describe_selector(label_selector),
			namespace: namespace.to_string(),
		})
	}

	/// Wait for the named pod to be running.
	pub async fn wait_for_pod(
		&self,
		name: &str,
		namespace: Option<&str>,
		max_wait: Duration,
	) -> Result<Pod, TargetError> {
		let namespace = self.namespace_or_default(namespace);
		let interval = self.config.poll_interval;
		let cost = self.config.iteration_cost();
		let mut remaining = max_wait;

		loop {
			sleep(interval).await;

			let pod = self.client.get_pod(name, namespace).await?;
			let status = classify(&pod);
			if status == "Running" {
				return Ok(pod);
			}
			if is_critical(status.as_str()) {
				return Err(TargetError::CriticalPodStatus {
					pod: name.to_string(),
					status: status.into_string(),
				});
			}
			debug!(pod = %name, status = %status, "Waiting for pod to start");

			sleep(interval).await;
			remaining = remaining.saturating_sub(cost);
			if remaining.is_zero() {
				break;
			}
		}

		Err(TargetError::Timeout {
			selector: format!("name {name}"),
			namespace: namespace.to_string(),
		})
	}
}

fn pod_name(pod: &Pod) -> &str {
	pod.metadata.name.as_deref().unwrap_or_default()
}

fn describe_selector(label_selector: &str) -> String {
	if label_selector.is_empty() {
		"<all pods>".to_string()
	} else {
		label_selector.to_string()
	}
}

fn runs_image(pod: &Pod, images: &[String]) -> bool {
	pod.spec.as_ref().is_some_and(|spec| {
		spec.containers.iter().any(|c| {
			c.image
				.as_deref()
				.is_some_and(|image| images.iter().any(|i| i == image))
		})
	})
}

fn evaluate_image_set(pods: &[Pod], images: &[String]) -> Result<ImageSetFrame, TargetError> {
	let mut found = Vec::new();

	for pod in pods.iter().filter(|pod| runs_image(pod, images)) {
		let status = classify(pod);
		if is_critical(status.as_str()) {
			return Err(TargetError::CriticalPodStatus {
				pod: pod_name(pod).to_string(),
				status: status.into_string(),
			});
		}
		if status == "Completed" {
			continue;
		}
		if status != "Running" {
			return Ok(ImageSetFrame::Pending);
		}
		found.push(pod.clone());
	}

	Ok(ImageSetFrame::Settled(found))
}

/// The newest pod passing the image filter. Ties keep the earlier pod.
fn select_newest<'a>(pods: &'a [Pod], images: &[String]) -> Option<&'a Pod> {
	let created = |pod: &Pod| pod.metadata.creation_timestamp.as_ref().map(|t| t.0);

	let mut selected: Option<&Pod> = None;
	for pod in pods
		.iter()
		.filter(|pod| images.is_empty() || runs_image(pod, images))
	{
		let newer = match selected {
			None => true,
			Some(current) => created(pod) > created(current),
		};
		if newer {
			selected = Some(pod);
		}
	}
	selected
}
