// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Partial configuration layer for merging from multiple sources.

use serde::Deserialize;
use std::path::PathBuf;

/// Partial configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub kube: Option<KubeLayer>,
	#[serde(default)]
	pub discovery: Option<DiscoveryLayer>,
	#[serde(default)]
	pub forward: Option<ForwardLayer>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KubeLayer {
	#[serde(default)]
	pub namespace: Option<String>,
	#[serde(default)]
	pub context: Option<String>,
	#[serde(default)]
	pub pull_secrets: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoveryLayer {
	#[serde(default)]
	pub poll_interval_ms: Option<u64>,
	#[serde(default)]
	pub min_wait_secs: Option<u64>,
	#[serde(default)]
	pub no_match_grace_secs: Option<u64>,
	#[serde(default)]
	pub max_wait_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForwardLayer {
	#[serde(default)]
	pub addresses: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
	#[serde(default)]
	pub session_log: Option<PathBuf>,
}

impl ConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.kube, other.kube, KubeLayer::merge);
		merge_option(&mut self.discovery, other.discovery, DiscoveryLayer::merge);
		merge_option(&mut self.forward, other.forward, ForwardLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

impl KubeLayer {
	fn merge(&mut self, other: KubeLayer) {
		if other.namespace.is_some() {
			self.namespace = other.namespace;
		}
		if other.context.is_some() {
			self.context = other.context;
		}
		if other.pull_secrets.is_some() {
			self.pull_secrets = other.pull_secrets;
		}
	}
}

impl DiscoveryLayer {
	fn merge(&mut self, other: DiscoveryLayer) {
		if other.poll_interval_ms.is_some() {
			self.poll_interval_ms = other.poll_interval_ms;
		}
		if other.min_wait_secs.is_some() {
			self.min_wait_secs = other.min_wait_secs;
		}
		if other.no_match_grace_secs.is_some() {
			self.no_match_grace_secs = other.no_match_grace_secs;
		}
		if other.max_wait_secs.is_some() {
			self.max_wait_secs = other.max_wait_secs;
		}
	}
}

impl ForwardLayer {
	fn merge(&mut self, other: ForwardLayer) {
		// Address lists replace each other, they are not concatenated.
		if other.addresses.is_some() {
			self.addresses = other.addresses;
		}
	}
}

impl LoggingLayer {
	fn merge(&mut self, other: LoggingLayer) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.format.is_some() {
			self.format = other.format;
		}
		if other.session_log.is_some() {
			self.session_log = other.session_log;
		}
	}
}
