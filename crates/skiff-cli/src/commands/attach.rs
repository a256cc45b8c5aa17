// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use skiff_session::{attach, SessionIo};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::target::TargetArgs;
use crate::context::CliContext;

#[derive(Debug, Clone, Args)]
pub struct AttachArgs {
	#[command(flatten)]
	pub target: TargetArgs,

	/// Do not pass local stdin to the container
	#[arg(long)]
	pub no_stdin: bool,
}

#[instrument(skip(ctx))]
pub async fn handle_attach(args: AttachArgs, ctx: &CliContext) -> Result<()> {
	let selector = args.target.selector(ctx).await?;
	let target = ctx
		.resolver()
		.resolve_newest(&selector)
		.await
		.context("failed to find a container to attach to")?;

	let mut io = SessionIo::stdio();
	if args.no_stdin {
		io.stdin = None;
	}

	let cancel = CancellationToken::new();
	let on_interrupt = cancel.clone();
	let interrupt = tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			on_interrupt.cancel();
		}
	});

	let result = attach(ctx.client.as_ref(), &target, io, cancel).await;
	interrupt.abort();
	result.context("attach session failed")?;

	eprintln!(
		"{} Detached from {}/{}",
		style("✓").green().bold(),
		target.pod_name(),
		target.container_name()
	);
	Ok(())
}
