// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use anyhow::{Context, Result};
use clap::Args;
use console::{style, StyledObject};
use skiff_k8s::Pod;
use skiff_target::{classify, classify_status, StatusClass, TargetSelector};
use tracing::instrument;

use crate::context::CliContext;

#[derive(Debug, Clone, Args)]
pub struct PodsArgs {
	/// Label selector, e.g. `app=web`
	#[arg(short = 'l', long = "selector", default_value = "")]
	pub label_selector: String,

	/// List the pods of this deployment
	#[arg(short, long, conflicts_with = "label_selector")]
	pub deployment: Option<String>,

	/// Only list pods running one of these images (repeatable)
	#[arg(long = "image")]
	pub images: Vec<String>,
}

/// One printed line of `skiff pods`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PodRow {
	name: String,
	status: String,
	images: String,
}

fn pod_row(pod: &Pod) -> PodRow {
	let images = pod
		.spec
		.as_ref()
		.map(|spec| {
			spec
				.containers
				.iter()
				.filter_map(|c| c.image.as_deref())
				.collect::<Vec<_>>()
				.join(",")
		})
		.unwrap_or_default();

	PodRow {
		name: pod.metadata.name.clone().unwrap_or_default(),
		status: classify(pod).into_string(),
		images,
	}
}

fn runs_selected_image(pod: &Pod, filter: &TargetSelector) -> bool {
	filter.image_selector.is_empty()
		|| pod.spec.as_ref().is_some_and(|spec| {
			spec
				.containers
				.iter()
				.any(|c| filter.accepts_image(c.image.as_deref()))
		})
}

fn styled_status(status: &str) -> StyledObject<&str> {
	match classify_status(status) {
		StatusClass::Critical => style(status).red().bold(),
		StatusClass::Transient => style(status).yellow(),
		StatusClass::Candidate if status == "Running" => style(status).green(),
		StatusClass::Candidate => style(status).dim(),
	}
}

#[instrument(skip(ctx))]
pub async fn handle_pods(args: PodsArgs, ctx: &CliContext) -> Result<()> {
	let namespace = ctx.namespace().to_string();

	let pods = match &args.deployment {
		Some(deployment) => {
			skiff_target::pods_for_deployment(ctx.client.as_ref(), &namespace, deployment)
				.await
				.with_context(|| format!("failed to list pods of deployment {deployment}"))?
		}
		None => ctx
			.client
			.list_pods(&namespace, &args.label_selector)
			.await
			.with_context(|| format!("failed to list pods in namespace {namespace}"))?,
	};

	let filter = TargetSelector::default().images(args.images.iter().cloned());
	let mut rows: Vec<PodRow> = pods
		.iter()
		.filter(|pod| runs_selected_image(pod, &filter))
		.map(pod_row)
		.collect();
	rows.sort_by(|a, b| a.name.cmp(&b.name));

	if rows.is_empty() {
		println!(
			"{} No pods found in namespace {}",
			style("!").yellow().bold(),
			style(&namespace).cyan()
		);
		return Ok(());
	}

	let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(4);
	println!("{:<width$}  {:<28}  IMAGES", "NAME", "STATUS");
	for row in &rows {
		println!(
			"{:<width$}  {:<28}  {}",
			row.name,
			styled_status(&row.status),
			style(&row.images).dim()
		);
	}
	Ok(())
}
