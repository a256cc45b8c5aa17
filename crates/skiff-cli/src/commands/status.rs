// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use skiff_target::{
	ensure_cluster_role_binding, ensure_namespace, ensure_pull_secrets_on_service_account,
	AccountResolver, BindingOutcome, GcloudAccountResolver, NamespaceOutcome,
};
use tracing::instrument;

use crate::context::CliContext;

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
	/// Pull secret to reference from the default service account (repeatable,
	/// added to the configured ones)
	#[arg(long = "pull-secret")]
	pub pull_secrets: Vec<String>,
}

/// Configured pull secrets followed by the ones given on the command line.
fn pull_secrets(args: &StatusArgs, ctx: &CliContext) -> Vec<String> {
	let mut secrets = ctx.config.kube.pull_secrets.clone();
	for secret in &args.pull_secrets {
		if !secrets.contains(secret) {
			secrets.push(secret.clone());
		}
	}
	secrets
}

fn describe_binding(outcome: BindingOutcome) -> &'static str {
	match outcome {
		BindingOutcome::SkippedLocalCluster => "not needed on a local cluster",
		BindingOutcome::AlreadyPresent => "present",
		BindingOutcome::NotApplicable => "not needed for this auth provider",
		BindingOutcome::Created => "created",
	}
}

#[instrument(skip(ctx))]
pub async fn handle_status(args: StatusArgs, ctx: &CliContext) -> Result<()> {
	run_status(&args, ctx, &GcloudAccountResolver::default()).await
}

async fn run_status(
	args: &StatusArgs,
	ctx: &CliContext,
	accounts: &dyn AccountResolver,
) -> Result<()> {
	let client = ctx.client.as_ref();
	let cluster = client.cluster_info();
	let namespace = ctx.namespace();

	println!(
		"{} Context:   {}",
		style("●").green().bold(),
		style(cluster.context.as_deref().unwrap_or("<in-cluster>")).cyan()
	);

	let outcome = ensure_namespace(client, namespace)
		.await
		.with_context(|| format!("failed to ensure namespace {namespace}"))?;
	let state = match outcome {
		NamespaceOutcome::Existing => "exists",
		NamespaceOutcome::Created => "created",
	};
	println!(
		"{} Namespace: {} ({state})",
		style("✓").green().bold(),
		style(namespace).cyan()
	);

	let binding = ensure_cluster_role_binding(client, cluster, accounts)
		.await
		.context("failed to ensure cluster role binding")?;
	println!(
		"{} Cluster role binding: {}",
		style("✓").green().bold(),
		describe_binding(binding)
	);

	let secrets = pull_secrets(args, ctx);
	if !secrets.is_empty() {
		let changed = ensure_pull_secrets_on_service_account(client, namespace, &secrets)
			.await
			.context("failed to update pull secrets")?;
		println!(
			"{} Pull secrets: {} ({})",
			style("✓").green().bold(),
			secrets.join(", "),
			if changed { "added" } else { "unchanged" }
		);
	}

	Ok(())
}
