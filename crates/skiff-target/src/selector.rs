// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

use skiff_k8s::{Container, Pod};

/// Default budget for a single resolution attempt.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(120);

/// Describes which container a session should be bound to.
///
/// Empty `label_selector` matches every pod, empty `image_selector` accepts any
/// image and a `None` namespace means the client's default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSelector {
	pub namespace: Option<String>,
	pub label_selector: String,
	pub image_selector: Vec<String>,
	pub pod_name: Option<String>,
	pub container_name: Option<String>,
	pub max_wait: Duration,
}

impl Default for TargetSelector {
	fn default() -> Self {
		Self {
			namespace: None,
			label_selector: String::new(),
			image_selector: Vec::new(),
			pod_name: None,
			container_name: None,
			max_wait: DEFAULT_MAX_WAIT,
		}
	}
}

impl TargetSelector {
	pub fn with_labels(label_selector: impl Into<String>) -> Self {
		Self {
			label_selector: label_selector.into(),
			..Default::default()
		}
	}

	pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	pub fn images<I, S>(mut self, images: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.image_selector = images.into_iter().map(Into::into).collect();
		self
	}

	pub fn pod(mut self, name: impl Into<String>) -> Self {
		self.pod_name = Some(name.into());
		self
	}

	pub fn container(mut self, name: impl Into<String>) -> Self {
		self.container_name = Some(name.into());
		self
	}

	pub fn max_wait(mut self, max_wait: Duration) -> Self {
		self.max_wait = max_wait;
		self
	}

	/// Whether `image` passes the image filter.
	pub fn accepts_image(&self, image: Option<&str>) -> bool {
		self.image_selector.is_empty()
			|| image.is_some_and(|image| self.image_selector.iter().any(|i| i == image))
	}
}

/// A ready pod and the container within it a session attaches to.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
	pub pod: Pod,
	pub container: Container,
}

impl ResolvedTarget {
	pub fn pod_name(&self) -> &str {
		self.pod.metadata.name.as_deref().unwrap_or_default()
	}

	pub fn namespace(&self) -> &str {
		self.pod.metadata.namespace.as_deref().unwrap_or_default()
	}

	pub fn container_name(&self) -> &str {
		&self.container.name
	}
}
