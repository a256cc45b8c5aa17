// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pod builders shared by the unit tests.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use skiff_k8s::{
	Container, ContainerState, ContainerStateRunning, ContainerStateTerminated,
	ContainerStateWaiting, ContainerStatus, Pod, PodSpec, PodStatus,
};

pub(crate) fn running() -> ContainerState {
	ContainerState {
		running: Some(ContainerStateRunning::default()),
		..Default::default()
	}
}

pub(crate) fn waiting(reason: &str) -> ContainerState {
	ContainerState {
		waiting: Some(ContainerStateWaiting {
			reason: Some(reason.to_string()),
			..Default::default()
		}),
		..Default::default()
	}
}

pub(crate) fn terminated(exit_code: i32, reason: Option<&str>, signal: Option<i32>) -> ContainerState {
	ContainerState {
		terminated: Some(ContainerStateTerminated {
			exit_code,
			reason: reason.map(str::to_string),
			signal,
			..Default::default()
		}),
		..Default::default()
	}
}

fn container_status(name: &str, ready: bool, state: ContainerState) -> ContainerStatus {
	ContainerStatus {
		name: name.to_string(),
		ready,
		state: Some(state),
		..Default::default()
	}
}

pub(crate) struct PodBuilder {
	pod: Pod,
}

impl PodBuilder {
	pub(crate) fn new(name: &str) -> Self {
		Self {
			pod: Pod {
				metadata: ObjectMeta {
					name: Some(name.to_string()),
					namespace: Some("default".to_string()),
					..Default::default()
				},
				spec: Some(PodSpec::default()),
				status: Some(PodStatus::default()),
			},
		}
	}

	fn status_mut(&mut self) -> &mut PodStatus {
		self.pod.status.get_or_insert_with(Default::default)
	}

	fn spec_mut(&mut self) -> &mut PodSpec {
		self.pod.spec.get_or_insert_with(Default::default)
	}

	pub(crate) fn namespace(mut self, namespace: &str) -> Self {
		self.pod.metadata.namespace = Some(namespace.to_string());
		self
	}

	pub(crate) fn phase(mut self, phase: &str) -> Self {
		self.status_mut().phase = Some(phase.to_string());
		self
	}

	pub(crate) fn reason(mut self, reason: &str) -> Self {
		self.status_mut().reason = Some(reason.to_string());
		self
	}

	pub(crate) fn created_at(mut self, secs: i64) -> Self {
		let at = chrono::DateTime::from_timestamp(secs, 0).unwrap();
		self.pod.metadata.creation_timestamp = Some(Time(at));
		self
	}

	pub(crate) fn deleting(mut self) -> Self {
		let at = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
		self.pod.metadata.deletion_timestamp = Some(Time(at));
		self
	}

	pub(crate) fn label(mut self, key: &str, value: &str) -> Self {
		self.pod
			.metadata
			.labels
			.get_or_insert_with(BTreeMap::new)
			.insert(key.to_string(), value.to_string());
		self
	}

	pub(crate) fn container(mut self, name: &str, image: &str) -> Self {
		self.spec_mut().containers.push(Container {
			name: name.to_string(),
			image: Some(image.to_string()),
			..Default::default()
		});
		self
	}

	pub(crate) fn init_container(mut self, name: &str, image: &str) -> Self {
		self.spec_mut()
			.init_containers
			.get_or_insert_with(Vec::new)
			.push(Container {
				name: name.to_string(),
				image: Some(image.to_string()),
				..Default::default()
			});
		self
	}

	pub(crate) fn status(mut self, name: &str, ready: bool, state: ContainerState) -> Self {
		self.status_mut()
			.container_statuses
			.get_or_insert_with(Vec::new)
			.push(container_status(name, ready, state));
		self
	}

	pub(crate) fn init_status(mut self, name: &str, state: ContainerState) -> Self {
		self.status_mut()
			.init_container_statuses
			.get_or_insert_with(Vec::new)
			.push(container_status(name, false, state));
		self
	}

	pub(crate) fn build(self) -> Pod {
		self.pod
	}
}

/// A single-container pod that is `Running` and ready.
pub(crate) fn running_pod(name: &str, image: &str) -> Pod {
	PodBuilder::new(name)
		.phase("Running")
		.container("app", image)
		.status("app", true, running())
		.build()
}

/// A single-container pod stuck with the given waiting reason.
pub(crate) fn waiting_pod(name: &str, image: &str, reason: &str) -> Pod {
	PodBuilder::new(name)
		.phase("Pending")
		.container("app", image)
		.status("app", false, waiting(reason))
		.build()
}
