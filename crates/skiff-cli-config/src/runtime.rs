// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Runtime configuration types with resolved defaults.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::layer::*;
use crate::paths::PathsConfig;
use crate::ConfigError;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MIN_WAIT_SECS: u64 = 60;
pub const DEFAULT_NO_MATCH_GRACE_SECS: u64 = 60;
pub const DEFAULT_MAX_WAIT_SECS: u64 = 120;

/// The final, validated configuration for skiff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkiffConfig {
	pub kube: KubeConfig,
	pub discovery: DiscoverySettings,
	pub forward: ForwardConfig,
	pub logging: LoggingConfig,

	/// Resolved XDG paths (not serialized)
	#[serde(skip)]
	pub paths: PathsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KubeConfig {
	/// `None` uses the namespace of the kubeconfig context.
	pub namespace: Option<String>,
	/// `None` uses the current kubeconfig context.
	pub context: Option<String>,
	/// Pull secrets to attach to the namespace's default service account.
	pub pull_secrets: Vec<String>,
}

/// Timing of the pod discovery loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySettings {
	pub poll_interval_ms: u64,
	pub min_wait_secs: u64,
	pub no_match_grace_secs: u64,
	pub max_wait_secs: u64,
}

impl Default for DiscoverySettings {
	fn default() -> Self {
		Self {
			poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
			min_wait_secs: DEFAULT_MIN_WAIT_SECS,
			no_match_grace_secs: DEFAULT_NO_MATCH_GRACE_SECS,
			max_wait_secs: DEFAULT_MAX_WAIT_SECS,
		}
	}
}

impl DiscoverySettings {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn min_wait(&self) -> Duration {
		Duration::from_secs(self.min_wait_secs)
	}

	pub fn no_match_grace(&self) -> Duration {
		Duration::from_secs(self.no_match_grace_secs)
	}

	pub fn max_wait(&self) -> Duration {
		Duration::from_secs(self.max_wait_secs)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardConfig {
	/// Local addresses port-forward listeners bind to.
	pub addresses: Vec<IpAddr>,
}

impl Default for ForwardConfig {
	fn default() -> Self {
		Self {
			addresses: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
	/// File receiving session events.
	pub session_log: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Error => "error",
			LogLevel::Warn => "warn",
			LogLevel::Info => "info",
			LogLevel::Debug => "debug",
			LogLevel::Trace => "trace",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
	Compact,
}

impl SkiffConfig {
	/// Build runtime config from a merged layer and paths.
	pub fn from_layer(layer: ConfigLayer, paths: PathsConfig) -> Result<Self, ConfigError> {
		let kube = build_kube_config(layer.kube);
		let discovery = build_discovery_settings(layer.discovery);
		let forward = build_forward_config(layer.forward)?;
		let logging = build_logging_config(layer.logging, &paths);

		Ok(Self {
			kube,
			discovery,
			forward,
			logging,
			paths,
		})
	}
}

fn build_kube_config(layer: Option<KubeLayer>) -> KubeConfig {
	let layer = layer.unwrap_or_default();
	KubeConfig {
		namespace: layer.namespace.filter(|ns| !ns.is_empty()),
		context: layer.context.filter(|ctx| !ctx.is_empty()),
		pull_secrets: layer.pull_secrets.unwrap_or_default(),
	}
}

fn build_discovery_settings(layer: Option<DiscoveryLayer>) -> DiscoverySettings {
	let layer = layer.unwrap_or_default();
	DiscoverySettings {
		poll_interval_ms: layer.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
		min_wait_secs: layer.min_wait_secs.unwrap_or(DEFAULT_MIN_WAIT_SECS),
		no_match_grace_secs: layer
			.no_match_grace_secs
			.unwrap_or(DEFAULT_NO_MATCH_GRACE_SECS),
		max_wait_secs: layer.max_wait_secs.unwrap_or(DEFAULT_MAX_WAIT_SECS),
	}
}

fn build_forward_config(layer: Option<ForwardLayer>) -> Result<ForwardConfig, ConfigError> {
	let Some(addresses) = layer.and_then(|l| l.addresses) else {
		return Ok(ForwardConfig::default());
	};

	let addresses = addresses
		.iter()
		.map(|raw| {
			raw.trim().parse::<IpAddr>().map_err(|_| {
				ConfigError::invalid_value("forward.addresses", format!("not an IP address: {raw}"))
			})
		})
		.collect::<Result<Vec<_>, _>>()?;

	Ok(ForwardConfig { addresses })
}

fn build_logging_config(layer: Option<LoggingLayer>, paths: &PathsConfig) -> LoggingConfig {
	let layer = layer.unwrap_or_default();
	LoggingConfig {
		level: parse_log_level(layer.level.as_deref()),
		format: parse_log_format(layer.format.as_deref()),
		session_log: layer
			.session_log
			.unwrap_or_else(|| paths.session_log_file()),
	}
}

fn parse_log_level(s: Option<&str>) -> LogLevel {
	match s {
		Some("error") => LogLevel::Error,
		Some("warn") => LogLevel::Warn,
		Some("info") => LogLevel::Info,
		Some("debug") => LogLevel::Debug,
		Some("trace") => LogLevel::Trace,
		_ => LogLevel::Info,
	}
}

fn parse_log_format(s: Option<&str>) -> LogFormat {
	match s {
		Some("json") => LogFormat::Json,
		Some("compact") => LogFormat::Compact,
		Some("pretty") => LogFormat::Pretty,
		_ => LogFormat::Pretty,
	}
}
