// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Default configuration file generation.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ConfigError;

/// Default configuration file template.
///
/// Written to ~/.config/skiff/config.toml when no user config exists.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"#
# skiff configuration file
# Location: ~/.config/skiff/config.toml
#
# This file was auto-generated with the built-in defaults.
#

# =============================================================================
# Kubernetes
# =============================================================================

[kube]
# Namespace to work in. Defaults to the namespace of the kubeconfig context.
# namespace = "dev"

# Kubeconfig context. Defaults to the current context.
# context = "minikube"

# Pull secrets added to the namespace's default service account by `skiff status`.
pull_secrets = []

# =============================================================================
# Pod discovery
# =============================================================================

[discovery]
# Pause before and after each cluster read (milliseconds)
poll_interval_ms = 1000

# Image discovery keeps looking this long before accepting an empty result
min_wait_secs = 60

# Label discovery gives up once nothing has matched for this long
no_match_grace_secs = 60

# Overall wait budget for a target to become ready
max_wait_secs = 120

# =============================================================================
# Port forwarding
# =============================================================================

[forward]
# Local addresses to listen on
addresses = ["127.0.0.1"]

# =============================================================================
# Logging
# =============================================================================

[logging]
# Log level: error, warn, info, debug, trace
level = "info"

# Log format: pretty, json, compact
format = "pretty"

# Session events are written here. Defaults to ~/.local/state/skiff/session.log
# session_log = "/tmp/skiff-session.log"
"#;

/// Ensure the config directory exists and create a default config file if none exists.
///
/// Returns `true` if a new config file was created, `false` if one already existed.
pub fn ensure_default_config(config_file_path: &Path) -> Result<bool, ConfigError> {
	if config_file_path.exists() {
		debug!(path = %config_file_path.display(), "config file already exists");
		return Ok(false);
	}

	if let Some(parent) = config_file_path.parent() {
		if !parent.exists() {
			debug!(path = %parent.display(), "creating config directory");
			fs::create_dir_all(parent)?;
		}
	}

	info!(path = %config_file_path.display(), "creating default config file");
	fs::write(config_file_path, DEFAULT_CONFIG_TEMPLATE)?;

	Ok(true)
}
