// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Grouping of status strings into what discovery should do about them.

/// Statuses a pod will not leave without intervention.
pub const CRITICAL_STATUSES: &[&str] = &[
	"Error",
	"Unknown",
	"ImagePullBackOff",
	"CrashLoopBackOff",
	"RunContainerError",
	"ErrImagePull",
	"CreateContainerConfigError",
	"InvalidImageName",
];

/// Statuses a pod is expected to pass through on its way to running.
pub const TRANSIENT_STATUSES: &[&str] = &[
	"ContainerCreating",
	"PodInitializing",
	"Pending",
	"Terminating",
];

/// Statuses of a pod that is done starting.
pub const OKAY_STATUSES: &[&str] = &["Running", "Completed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
	/// Abort and report to the caller.
	Critical,
	/// Keep waiting.
	Transient,
	/// Eligible for selection; callers decide by the exact string.
	Candidate,
}

pub fn classify_status(status: &str) -> StatusClass {
	if is_critical(status) {
		StatusClass::Critical
	} else if is_transient(status) {
		StatusClass::Transient
	} else {
		StatusClass::Candidate
	}
}

pub fn is_critical(status: &str) -> bool {
	CRITICAL_STATUSES.contains(&status)
}

pub fn is_transient(status: &str) -> bool {
	TRANSIENT_STATUSES.contains(&status)
}

pub fn is_okay(status: &str) -> bool {
	OKAY_STATUSES.contains(&status)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_critical_statuses() {
		for status in CRITICAL_STATUSES {
			assert_eq!(classify_status(status), StatusClass::Critical, "{status}");
		}
	}

	#[test]
	fn test_transient_statuses() {
		for status in TRANSIENT_STATUSES {
			assert_eq!(classify_status(status), StatusClass::Transient, "{status}");
		}
	}

	#[test]
	fn test_okay_statuses_are_candidates() {
		assert!(is_okay("Running"));
		assert!(is_okay("Completed"));
		assert_eq!(classify_status("Running"), StatusClass::Candidate);
		assert_eq!(classify_status("Completed"), StatusClass::Candidate);
	}

	#[test]
	fn test_unlisted_statuses_are_candidates() {
		for status in ["Init:0/1", "Init:Error", "ExitCode:1", "Signal:9", "Evicted", ""] {
			assert_eq!(classify_status(status), StatusClass::Candidate, "{status}");
		}
	}

	#[test]
	fn test_tables_are_disjoint() {
		for status in CRITICAL_STATUSES {
			assert!(!is_transient(status));
			assert!(!is_okay(status));
		}
		for status in TRANSIENT_STATUSES {
			assert!(!is_okay(status));
		}
	}
}
