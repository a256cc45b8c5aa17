// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use anyhow::{Context, Result};
use skiff_cli_config::SkiffConfig;
use skiff_k8s::{K8sClient, KubeClient, KubeOptions};
use skiff_target::{DiscoveryConfig, TargetResolver};

/// What every command needs: the loaded configuration and a cluster client.
pub struct CliContext {
	pub config: SkiffConfig,
	pub client: Arc<dyn K8sClient>,
}

impl CliContext {
	pub fn new(config: SkiffConfig, client: Arc<dyn K8sClient>) -> Self {
		Self { config, client }
	}

	/// Connect to the cluster named by the configured kubeconfig context.
	pub async fn connect(config: SkiffConfig) -> Result<Self> {
		let client = KubeClient::with_options(KubeOptions {
			context: config.kube.context.clone(),
			namespace: config.kube.namespace.clone(),
		})
		.await
		.context("failed to connect to the Kubernetes cluster")?;
		Ok(Self::new(config, Arc::new(client)))
	}

	pub fn namespace(&self) -> &str {
		self.client.default_namespace()
	}

	pub fn discovery_config(&self) -> DiscoveryConfig {
		let settings = &self.config.discovery;
		DiscoveryConfig {
			poll_interval: settings.poll_interval(),
			min_wait: settings.min_wait(),
			no_match_grace: settings.no_match_grace(),
		}
	}

	pub fn resolver(&self) -> TargetResolver {
		TargetResolver::new(Arc::clone(&self.client), self.discovery_config())
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use skiff_k8s::MockK8sClient;
	use std::time::Duration;

	#[test]
	fn test_discovery_config_follows_settings() {
		let mut ctx = testing::context_with(Arc::new(MockK8sClient::new()));
		ctx.config.discovery.poll_interval_ms = 250;
		ctx.config.discovery.no_match_grace_secs = 5;

		let discovery = ctx.discovery_config();
		assert_eq!(discovery.poll_interval, Duration::from_millis(250));
		assert_eq!(discovery.min_wait, Duration::from_secs(60));
		assert_eq!(discovery.no_match_grace, Duration::from_secs(5));
	}

	#[test]
	fn test_namespace_comes_from_client() {
		let ctx = testing::context_with(Arc::new(MockK8sClient::new()));
		assert_eq!(ctx.namespace(), "default");
	}
}
