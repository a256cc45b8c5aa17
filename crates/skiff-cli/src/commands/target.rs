// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use anyhow::{Context, Result};
use clap::Args;
use skiff_target::{pod_selector_for_deployment, TargetSelector};

use crate::context::CliContext;

/// Flags that pick the pod and container a session binds to.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
	/// Label selector, e.g. `app=web,tier=frontend`
	#[arg(short = 'l', long = "selector", default_value = "")]
	pub label_selector: String,

	/// Use the match labels of this deployment as the label selector
	#[arg(short, long, conflicts_with = "label_selector")]
	pub deployment: Option<String>,

	/// Only consider pods running one of these images (repeatable)
	#[arg(long = "image")]
	pub images: Vec<String>,

	/// Bind to this pod instead of discovering one
	#[arg(long)]
	pub pod: Option<String>,

	/// Container inside the pod
	#[arg(short, long)]
	pub container: Option<String>,
}

impl TargetArgs {
	pub async fn selector(&self, ctx: &CliContext) -> Result<TargetSelector> {
		let namespace = ctx.namespace().to_string();

		let label_selector = match &self.deployment {
			Some(deployment) => pod_selector_for_deployment(ctx.client.as_ref(), &namespace, deployment)
				.await
				.with_context(|| format!("failed to read selector of deployment {deployment}"))?,
			None => self.label_selector.clone(),
		};

		let mut selector = TargetSelector::with_labels(label_selector)
			.namespace(namespace)
			.images(self.images.iter().cloned())
			.max_wait(ctx.config.discovery.max_wait());
		if let Some(pod) = &self.pod {
			selector = selector.pod(pod);
		}
		if let Some(container) = &self.container {
			selector = selector.container(container);
		}
		Ok(selector)
	}
}
