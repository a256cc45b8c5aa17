// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration sources: files, environment, CLI, defaults.

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::layer::*;
use crate::paths::{workspace_config_path, PathsConfig};
use crate::ConfigError;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	SystemFile = 20,
	UserFile = 30,
	WorkspaceFile = 40,
	Environment = 50,
	Cli = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	/// Precedence level
	fn precedence(&self) -> Precedence;

	/// Load configuration layer from this source
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		// Defaults are applied when the merged layer is finalized.
		Ok(ConfigLayer::default())
	}
}

/// File-based configuration source (TOML).
pub struct FileSource {
	path: PathBuf,
	precedence: Precedence,
	name: &'static str,
}

impl FileSource {
	/// System config: /etc/skiff/config.toml
	pub fn system(paths: &PathsConfig) -> Self {
		Self {
			path: paths.system_config_file.clone(),
			precedence: Precedence::SystemFile,
			name: "system-config",
		}
	}

	/// User config: ~/.config/skiff/config.toml
	pub fn user(paths: &PathsConfig) -> Self {
		Self {
			path: paths.user_config_file.clone(),
			precedence: Precedence::UserFile,
			name: "user-config",
		}
	}

	/// Workspace config: .skiff/config.toml
	pub fn workspace() -> Result<Self, ConfigError> {
		Ok(Self {
			path: workspace_config_path()?,
			precedence: Precedence::WorkspaceFile,
			name: "workspace-config",
		})
	}

	/// Custom file path with specified precedence
	pub fn custom(path: PathBuf, precedence: Precedence, name: &'static str) -> Self {
		Self {
			path,
			precedence,
			name,
		}
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		self.name
	}
	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), source = self.name, "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), source = self.name, "loading config file");

		let content = std::fs::read_to_string(&self.path)?;
		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!(source = self.name, "parsed config layer");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Recognised variables:
/// `SKIFF_NAMESPACE`, `SKIFF_CONTEXT`, `SKIFF_PULL_SECRETS`,
/// `SKIFF_POLL_INTERVAL_MS`, `SKIFF_MIN_WAIT_SECS`, `SKIFF_NO_MATCH_GRACE_SECS`,
/// `SKIFF_MAX_WAIT_SECS`, `SKIFF_FORWARD_ADDRESSES`, `SKIFF_LOG_LEVEL`,
/// `SKIFF_LOG_FORMAT` and `SKIFF_SESSION_LOG`. List values are comma separated.
pub struct EnvSource {
	vars: Vec<(String, String)>,
}

impl EnvSource {
	/// Snapshot of the process environment.
	pub fn new() -> Self {
		Self::from_vars(std::env::vars())
	}

	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: vars
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.filter(|(k, _)| k.starts_with("SKIFF_"))
				.collect(),
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

fn split_list(value: &str) -> Vec<String> {
	value
		.split(',')
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}

fn parse_number(key: &str, value: &str) -> Option<u64> {
	match value.parse() {
		Ok(v) => Some(v),
		Err(_) => {
			warn!(key = %key, value = %value, "ignoring non-numeric environment value");
			None
		}
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let mut layer = ConfigLayer::default();

		for (key, value) in &self.vars {
			let value = value.trim();
			if value.is_empty() {
				continue;
			}

			trace!(key = %key, "processing env var");

			match key.as_str() {
				// Kubernetes
				"SKIFF_NAMESPACE" => {
					layer.kube.get_or_insert_with(KubeLayer::default).namespace =
						Some(value.to_string());
				}
				"SKIFF_CONTEXT" => {
					layer.kube.get_or_insert_with(KubeLayer::default).context =
						Some(value.to_string());
				}
				"SKIFF_PULL_SECRETS" => {
					layer.kube.get_or_insert_with(KubeLayer::default).pull_secrets =
						Some(split_list(value));
				}

				// Discovery
				"SKIFF_POLL_INTERVAL_MS" => {
					if let Some(v) = parse_number(key, value) {
						layer
							.discovery
							.get_or_insert_with(DiscoveryLayer::default)
							.poll_interval_ms = Some(v);
					}
				}
				"SKIFF_MIN_WAIT_SECS" => {
					if let Some(v) = parse_number(key, value) {
						layer
							.discovery
							.get_or_insert_with(DiscoveryLayer::default)
							.min_wait_secs = Some(v);
					}
				}
				"SKIFF_NO_MATCH_GRACE_SECS" => {
					if let Some(v) = parse_number(key, value) {
						layer
							.discovery
							.get_or_insert_with(DiscoveryLayer::default)
							.no_match_grace_secs = Some(v);
					}
				}
				"SKIFF_MAX_WAIT_SECS" => {
					if let Some(v) = parse_number(key, value) {
						layer
							.discovery
							.get_or_insert_with(DiscoveryLayer::default)
							.max_wait_secs = Some(v);
					}
				}

				// Port forwarding
				"SKIFF_FORWARD_ADDRESSES" => {
					layer
						.forward
						.get_or_insert_with(ForwardLayer::default)
						.addresses = Some(split_list(value));
				}

				// Logging
				"SKIFF_LOG_LEVEL" => {
					layer
						.logging
						.get_or_insert_with(LoggingLayer::default)
						.level = Some(value.to_string());
				}
				"SKIFF_LOG_FORMAT" => {
					layer
						.logging
						.get_or_insert_with(LoggingLayer::default)
						.format = Some(value.to_string());
				}
				"SKIFF_SESSION_LOG" => {
					layer
						.logging
						.get_or_insert_with(LoggingLayer::default)
						.session_log = Some(PathBuf::from(value));
				}

				_ => {
					// Unknown SKIFF_ variable, ignore
				}
			}
		}

		Ok(layer)
	}
}

/// CLI override source.
pub struct CliSource {
	overrides: CliOverrides,
}

/// CLI argument overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub namespace: Option<String>,
	pub context: Option<String>,
	pub max_wait_secs: Option<u64>,
	pub log_level: Option<String>,
	pub log_format: Option<String>,
	pub session_log: Option<PathBuf>,
	/// Read this file in place of the user config file.
	pub config_file: Option<PathBuf>,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading CLI overrides");
		let mut layer = ConfigLayer::default();

		if let Some(ref namespace) = self.overrides.namespace {
			layer.kube.get_or_insert_with(KubeLayer::default).namespace = Some(namespace.clone());
		}

		if let Some(ref context) = self.overrides.context {
			layer.kube.get_or_insert_with(KubeLayer::default).context = Some(context.clone());
		}

		if let Some(max_wait) = self.overrides.max_wait_secs {
			layer
				.discovery
				.get_or_insert_with(DiscoveryLayer::default)
				.max_wait_secs = Some(max_wait);
		}

		if let Some(ref level) = self.overrides.log_level {
			layer
				.logging
				.get_or_insert_with(LoggingLayer::default)
				.level = Some(level.clone());
		}

		if let Some(ref format) = self.overrides.log_format {
			layer
				.logging
				.get_or_insert_with(LoggingLayer::default)
				.format = Some(format.clone());
		}

		if let Some(ref session_log) = self.overrides.session_log {
			layer
				.logging
				.get_or_insert_with(LoggingLayer::default)
				.session_log = Some(session_log.clone());
		}

		Ok(layer)
	}
}
