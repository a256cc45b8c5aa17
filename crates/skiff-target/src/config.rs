// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

/// Default pause between two cluster reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default time image-set discovery keeps looking for more pods.
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_secs(60);

/// Default time label discovery tolerates an empty match before giving up.
pub const DEFAULT_NO_MATCH_GRACE: Duration = Duration::from_secs(60);

/// Timing knobs for the discovery loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryConfig {
	/// Each iteration sleeps this long before and after reading the cluster.
	pub poll_interval: Duration,
	/// Image-set discovery only settles on zero accepted pods after this.
	pub min_wait: Duration,
	/// Label discovery fails with no match once this has elapsed.
	pub no_match_grace: Duration,
}

impl Default for DiscoveryConfig {
	fn default() -> Self {
		Self {
			poll_interval: DEFAULT_POLL_INTERVAL,
			min_wait: DEFAULT_MIN_WAIT,
			no_match_grace: DEFAULT_NO_MATCH_GRACE,
		}
	}
}

impl DiscoveryConfig {
	/// Budget consumed by one loop iteration: the sleep before and after the read.
	pub fn iteration_cost(&self) -> Duration {
		self.poll_interval * 2
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = DiscoveryConfig::default();
		assert_eq!(config.poll_interval, Duration::from_secs(1));
		assert_eq!(config.min_wait, Duration::from_secs(60));
		assert_eq!(config.no_match_grace, Duration::from_secs(60));
	}

	#[test]
	fn test_iteration_cost_is_two_intervals() {
		let config = DiscoveryConfig {
			poll_interval: Duration::from_millis(250),
			..Default::default()
		};
		assert_eq!(config.iteration_cost(), Duration::from_millis(500));
	}
}
