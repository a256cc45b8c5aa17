// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration validation rules.

use tracing::warn;

use crate::runtime::SkiffConfig;
use crate::ConfigError;

/// Longest accepted pause between two cluster reads.
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Validate the configuration.
///
/// Returns Ok(()) if valid, or a ConfigError naming the offending field.
pub fn validate_config(config: &SkiffConfig) -> Result<(), ConfigError> {
	validate_discovery(config)?;
	validate_forward(config)?;
	validate_kube(config)?;

	Ok(())
}

fn validate_discovery(config: &SkiffConfig) -> Result<(), ConfigError> {
	let discovery = &config.discovery;

	if discovery.poll_interval_ms == 0 {
		return Err(ConfigError::invalid_value(
			"discovery.poll_interval_ms",
			"must be greater than 0",
		));
	}

	if discovery.poll_interval_ms > MAX_POLL_INTERVAL_MS {
		return Err(ConfigError::invalid_value(
			"discovery.poll_interval_ms",
			format!("must be at most {MAX_POLL_INTERVAL_MS}"),
		));
	}

	if discovery.min_wait_secs > discovery.max_wait_secs {
		warn!(
			min_wait_secs = discovery.min_wait_secs,
			max_wait_secs = discovery.max_wait_secs,
			"discovery.min_wait_secs exceeds max_wait_secs, image discovery will time out before settling"
		);
	}

	Ok(())
}

fn validate_forward(config: &SkiffConfig) -> Result<(), ConfigError> {
	if config.forward.addresses.is_empty() {
		return Err(ConfigError::invalid_value(
			"forward.addresses",
			"at least one address is required",
		));
	}

	Ok(())
}

fn validate_kube(config: &SkiffConfig) -> Result<(), ConfigError> {
	if config.kube.pull_secrets.iter().any(|s| s.trim().is_empty()) {
		return Err(ConfigError::validation(
			"kube.pull_secrets cannot contain empty names",
		));
	}

	Ok(())
}
