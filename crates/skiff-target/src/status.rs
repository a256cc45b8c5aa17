// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Human-readable pod status derivation.
//!
//! Produces the same status column `kubectl get pods` prints: a pod is
//! described by its most significant problem, looking at init containers
//! first and then at the main containers from last to first.

use std::fmt;

use skiff_k8s::{ContainerStateTerminated, Pod};

/// Pod-level reason the node controller sets when a node stops reporting.
pub const NODE_UNREACHABLE_REASON: &str = "NodeLost";

/// Waiting reason every init container reports before it gets its turn.
const POD_INITIALIZING: &str = "PodInitializing";

/// Status string derived from a single pod snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PodStatusString(String);

impl PodStatusString {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}
}

impl fmt::Display for PodStatusString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl PartialEq<str> for PodStatusString {
	fn eq(&self, other: &str) -> bool {
		self.0 == other
	}
}

impl PartialEq<&str> for PodStatusString {
	fn eq(&self, other: &&str) -> bool {
		self.0 == *other
	}
}

fn terminated_reason(prefix: &str, terminated: &ContainerStateTerminated) -> String {
	match terminated.reason.as_deref() {
		Some(reason) if !reason.is_empty() => format!("{prefix}{reason}"),
		_ => match terminated.signal {
			Some(signal) if signal != 0 => format!("{prefix}Signal:{signal}"),
			_ => format!("{prefix}ExitCode:{}", terminated.exit_code),
		},
	}
}

/// Derive the status string for a pod.
pub fn classify(pod: &Pod) -> PodStatusString {
	let status = pod.status.as_ref();

	let mut reason = status
		.and_then(|s| s.phase.clone())
		.unwrap_or_default();
	if let Some(pod_reason) = status
		.and_then(|s| s.reason.as_deref())
		.filter(|r| !r.is_empty())
	{
		reason = pod_reason.to_string();
	}

	let declared_init = pod
		.spec
		.as_ref()
		.and_then(|spec| spec.init_containers.as_ref())
		.map_or(0, Vec::len);
	let init_statuses = status
		.and_then(|s| s.init_container_statuses.as_deref())
		.unwrap_or_default();

	let mut initializing = false;
	for (index, container) in init_statuses.iter().enumerate() {
		let state = container.state.as_ref();
		let terminated = state.and_then(|s| s.terminated.as_ref());
		let waiting_reason = state
			.and_then(|s| s.waiting.as_ref())
			.and_then(|w| w.reason.as_deref())
			.filter(|r| !r.is_empty() && *r != POD_INITIALIZING);

		if let Some(terminated) = terminated {
			if terminated.exit_code == 0 {
				continue;
			}
			reason = terminated_reason("Init:", terminated);
		} else if let Some(waiting) = waiting_reason {
			reason = format!("Init:{waiting}");
		} else {
			reason = format!("Init:{index}/{declared_init}");
		}
		initializing = true;
		break;
	}

	if !initializing {
		let mut has_running = false;
		let statuses = status
			.and_then(|s| s.container_statuses.as_deref())
			.unwrap_or_default();

		// The last-declared container with a problem names the pod; the rest
		// of the scan only looks for a container that is still serving.
		let mut reported = false;
		for container in statuses.iter().rev() {
			let state = container.state.as_ref();
			let waiting_reason = state
				.and_then(|s| s.waiting.as_ref())
				.and_then(|w| w.reason.as_deref())
				.filter(|r| !r.is_empty());

			let problem = match (waiting_reason, state.and_then(|s| s.terminated.as_ref())) {
				(Some(waiting), _) => Some(waiting.to_string()),
				(None, Some(terminated)) => Some(terminated_reason("", terminated)),
				(None, None) => None,
			};

			match problem {
				Some(problem) => {
					if !reported {
						reason = problem;
						reported = true;
					}
				}
				None => {
					if container.ready && state.is_some_and(|s| s.running.is_some()) {
						has_running = true;
					}
				}
			}
		}

		// A finished container must not mask one that is still serving.
		if reason == "Completed" && has_running {
			reason = "Running".to_string();
		}
	}

	if pod.metadata.deletion_timestamp.is_some() {
		let node_lost = status.and_then(|s| s.reason.as_deref()) == Some(NODE_UNREACHABLE_REASON);
		reason = if node_lost { "Unknown" } else { "Terminating" }.to_string();
	}

	PodStatusString(reason)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::{running, terminated, waiting, PodBuilder};

	#[test]
	fn test_phase_is_default() {
		let pod = PodBuilder::new("p").phase("Pending").build();
		assert_eq!(classify(&pod), "Pending");
	}

	#[test]
	fn test_pod_reason_overrides_phase() {
		let pod = PodBuilder::new("p")
			.phase("Failed")
			.reason("Evicted")
			.build();
		assert_eq!(classify(&pod), "Evicted");
	}

	#[test]
	fn test_empty_pod_has_empty_status() {
		let pod = PodBuilder::new("p").build();
		assert_eq!(classify(&pod), "");
	}

	#[test]
	fn test_running_container() {
		let pod = PodBuilder::new("p")
			.phase("Running")
			.container("app", "app:v1")
			.status("app", true, running())
			.build();
		assert_eq!(classify(&pod), "Running");
	}

	#[test]
	fn test_init_failure_with_reason() {
		let pod = PodBuilder::new("p")
			.phase("Pending")
			.init_container("setup", "busybox")
			.init_status("setup", terminated(1, Some("Error"), None))
			.build();
		assert_eq!(classify(&pod), "Init:Error");
	}

	#[test]
	fn test_init_failure_by_signal() {
		let pod = PodBuilder::new("p")
			.phase("Pending")
			.init_container("setup", "busybox")
			.init_status("setup", terminated(137, None, Some(9)))
			.build();
		assert_eq!(classify(&pod), "Init:Signal:9");
	}

	#[test]
	fn test_init_waiting_reason() {
		let pod = PodBuilder::new("p")
			.phase("Pending")
			.init_container("setup", "busybox")
			.init_status("setup", waiting("ErrImagePull"))
			.build();
		assert_eq!(classify(&pod), "Init:ErrImagePull");
	}

	#[test]
	fn test_init_progress_counter() {
		let pod = PodBuilder::new("p")
			.phase("Pending")
			.init_container("first", "busybox")
			.init_container("second", "busybox")
			.init_container("third", "busybox")
			.init_status("first", terminated(0, Some("Completed"), None))
			.init_status("second", waiting("PodInitializing"))
			.init_status("third", waiting("PodInitializing"))
			.build();
		assert_eq!(classify(&pod), "Init:1/3");
	}

	#[test]
	fn test_init_running_counts_as_progress() {
		let pod = PodBuilder::new("p")
			.phase("Pending")
			.init_container("setup", "busybox")
			.init_status("setup", running())
			.build();
		assert_eq!(classify(&pod), "Init:0/1");
	}

	#[test]
	fn test_completed_init_falls_through_to_main_containers() {
		let pod = PodBuilder::new("p")
			.phase("Running")
			.init_container("setup", "busybox")
			.init_status("setup", terminated(0, Some("Completed"), None))
			.container("app", "app:v1")
			.status("app", false, waiting("CrashLoopBackOff"))
			.build();
		assert_eq!(classify(&pod), "CrashLoopBackOff");
	}

	#[test]
	fn test_main_container_exit_code_without_reason() {
		let pod = PodBuilder::new("p")
			.phase("Running")
			.container("app", "app:v1")
			.status("app", false, terminated(3, None, None))
			.build();
		assert_eq!(classify(&pod), "ExitCode:3");
	}

	#[test]
	fn test_main_container_signal_without_reason() {
		let pod = PodBuilder::new("p")
			.phase("Running")
			.container("app", "app:v1")
			.status("app", false, terminated(0, None, Some(15)))
			.build();
		assert_eq!(classify(&pod), "Signal:15");
	}

	#[test]
	fn test_last_declared_problem_wins() {
		let pod = PodBuilder::new("p")
			.phase("Running")
			.container("a", "a:v1")
			.container("b", "b:v1")
			.status("a", false, waiting("ErrImagePull"))
			.status("b", false, waiting("ContainerCreating"))
			.build();
		assert_eq!(classify(&pod), "ContainerCreating");
	}

	#[test]
	fn test_completed_sidecar_does_not_mask_running_container() {
		let pod = PodBuilder::new("p")
			.phase("Running")
			.container("app", "app:v1")
			.container("job", "job:v1")
			.status("app", true, running())
			.status("job", false, terminated(0, Some("Completed"), None))
			.build();
		assert_eq!(classify(&pod), "Running");
	}

	#[test]
	fn test_completed_without_running_container_stays_completed() {
		let pod = PodBuilder::new("p")
			.phase("Succeeded")
			.container("job", "job:v1")
			.status("job", false, terminated(0, Some("Completed"), None))
			.build();
		assert_eq!(classify(&pod), "Completed");
	}

	#[test]
	fn test_unready_running_container_does_not_count() {
		let pod = PodBuilder::new("p")
			.phase("Running")
			.container("app", "app:v1")
			.container("job", "job:v1")
			.status("app", false, running())
			.status("job", false, terminated(0, Some("Completed"), None))
			.build();
		assert_eq!(classify(&pod), "Completed");
	}

	#[test]
	fn test_deletion_reports_terminating() {
		let pod = PodBuilder::new("p")
			.phase("Running")
			.container("app", "app:v1")
			.status("app", true, running())
			.deleting()
			.build();
		assert_eq!(classify(&pod), "Terminating");
	}

	#[test]
	fn test_deletion_on_lost_node_reports_unknown() {
		let pod = PodBuilder::new("p")
			.phase("Running")
			.reason(NODE_UNREACHABLE_REASON)
			.deleting()
			.build();
		assert_eq!(classify(&pod), "Unknown");
	}

	#[test]
	fn test_display_matches_as_str() {
		let pod = PodBuilder::new("p").phase("Running").build();
		let status = classify(&pod);
		assert_eq!(status.to_string(), status.as_str());
	}
}

#[cfg(test)]
mod proptests {
	use super::*;
	use crate::fixtures::{running, terminated, waiting, PodBuilder};
	use proptest::prelude::*;
	use skiff_k8s::ContainerState;

	fn arb_state() -> impl Strategy<Value = ContainerState> {
		prop_oneof![
			Just(running()),
			"[A-Za-z]{1,20}".prop_map(|r| waiting(&r)),
			(0i32..256, proptest::option::of("[A-Za-z]{1,12}"))
				.prop_map(|(code, reason)| terminated(code, reason.as_deref(), None)),
		]
	}

	proptest! {
		#[test]
		fn single_ready_running_container_is_running(name in "[a-z][a-z0-9-]{0,20}") {
			let pod = PodBuilder::new("p")
				.phase("Running")
				.container(&name, "img")
				.status(&name, true, running())
				.build();
			let status = classify(&pod);
			prop_assert_eq!(status.as_str(), "Running");
		}

		#[test]
		fn failed_init_without_reason_reports_exit_code(
			code in 1i32..=255,
			main_states in proptest::collection::vec(arb_state(), 0..4)
		) {
			let mut builder = PodBuilder::new("p")
				.phase("Pending")
				.init_container("setup", "busybox")
				.init_status("setup", terminated(code, None, None));
			for (i, state) in main_states.into_iter().enumerate() {
				let name = format!("c{i}");
				builder = builder.container(&name, "img").status(&name, false, state);
			}
			let expected = format!("Init:ExitCode:{code}");
			let status = classify(&builder.build());
			prop_assert_eq!(status.as_str(), expected.as_str());
		}

		#[test]
		fn last_declared_image_pull_backoff_wins(
			earlier in proptest::collection::vec((arb_state(), any::<bool>()), 0..5)
		) {
			let mut builder = PodBuilder::new("p").phase("Pending");
			let count = earlier.len();
			for (i, (state, ready)) in earlier.into_iter().enumerate() {
				let name = format!("c{i}");
				builder = builder.container(&name, "img").status(&name, ready, state);
			}
			let last = format!("c{count}");
			let pod = builder
				.container(&last, "img")
				.status(&last, false, waiting("ImagePullBackOff"))
				.build();
			let status = classify(&pod);
			prop_assert_eq!(status.as_str(), "ImagePullBackOff");
		}

		#[test]
		fn classification_is_deterministic(states in proptest::collection::vec(arb_state(), 0..5)) {
			let mut builder = PodBuilder::new("p").phase("Running");
			for (i, state) in states.into_iter().enumerate() {
				let name = format!("c{i}");
				builder = builder.container(&name, "img").status(&name, i % 2 == 0, state);
			}
			let pod = builder.build();
			prop_assert_eq!(classify(&pod), classify(&pod));
		}
	}
}
