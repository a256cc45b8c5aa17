// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::PathBuf;

use crate::ConfigError;

/// Workspace config file, relative to the current directory.
pub const WORKSPACE_CONFIG_FILE: &str = ".skiff/config.toml";

/// Resolved XDG paths for skiff.
#[derive(Debug, Clone)]
pub struct PathsConfig {
	/// User config file: ~/.config/skiff/config.toml
	pub user_config_file: PathBuf,
	/// System config file: /etc/skiff/config.toml
	pub system_config_file: PathBuf,
	/// Cache directory: ~/.cache/skiff/
	pub cache_dir: PathBuf,
	/// State directory: ~/.local/state/skiff/
	pub state_dir: PathBuf,
}

impl PathsConfig {
	/// Get the config directory (parent of user_config_file)
	pub fn config_dir(&self) -> PathBuf {
		self
			.user_config_file
			.parent()
			.map(|p| p.to_path_buf())
			.unwrap_or_else(|| self.user_config_file.clone())
	}

	/// Where session output is recorded unless configured otherwise.
	pub fn session_log_file(&self) -> PathBuf {
		self.state_dir.join("session.log")
	}
}

impl Default for PathsConfig {
	fn default() -> Self {
		Self {
			user_config_file: PathBuf::from("~/.config/skiff/config.toml"),
			system_config_file: PathBuf::from("/etc/skiff/config.toml"),
			cache_dir: PathBuf::from("~/.cache/skiff"),
			state_dir: PathBuf::from("~/.local/state/skiff"),
		}
	}
}

/// Resolve XDG paths according to the Base Directory Specification.
///
/// Uses environment variables if set, otherwise falls back to defaults:
/// - XDG_CONFIG_HOME or ~/.config
/// - XDG_CACHE_HOME or ~/.cache
/// - XDG_STATE_HOME or ~/.local/state
pub fn resolve_xdg_paths() -> Result<PathsConfig, ConfigError> {
	let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;

	let config_home = std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".config"));

	let cache_home = std::env::var_os("XDG_CACHE_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".cache"));

	let state_home = std::env::var_os("XDG_STATE_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".local/state"));

	tracing::debug!(
		config_home = %config_home.display(),
		cache_home = %cache_home.display(),
		state_home = %state_home.display(),
		"resolved XDG paths"
	);

	Ok(PathsConfig {
		user_config_file: config_home.join("skiff/config.toml"),
		system_config_file: PathBuf::from("/etc/skiff/config.toml"),
		cache_dir: cache_home.join("skiff"),
		state_dir: state_home.join("skiff"),
	})
}

/// Get the workspace config file path from current directory.
pub fn workspace_config_path() -> Result<PathBuf, ConfigError> {
	let cwd = std::env::current_dir()?;
	Ok(cwd.join(WORKSPACE_CONFIG_FILE))
}
