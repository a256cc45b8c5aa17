// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use skiff_session::{port_forward, PortMapping};
use skiff_target::net::is_private_ip;
use tokio::sync::oneshot;
use tracing::{instrument, warn};

use super::target::TargetArgs;
use crate::context::CliContext;

#[derive(Debug, Clone, Args)]
pub struct ForwardArgs {
	#[command(flatten)]
	pub target: TargetArgs,

	/// Ports to forward: `LOCAL:REMOTE`, `PORT` or `:REMOTE`
	#[arg(required = true, value_name = "PORT")]
	pub ports: Vec<PortMapping>,

	/// Local address to listen on (repeatable, overrides config)
	#[arg(long = "address")]
	pub addresses: Vec<IpAddr>,
}

/// Addresses from the command line win over configured ones.
fn listen_addresses(args: &ForwardArgs, ctx: &CliContext) -> Vec<IpAddr> {
	if args.addresses.is_empty() {
		ctx.config.forward.addresses.clone()
	} else {
		args.addresses.clone()
	}
}

#[instrument(skip(ctx))]
pub async fn handle_forward(args: ForwardArgs, ctx: &CliContext) -> Result<()> {
	let addresses = listen_addresses(&args, ctx);
	for address in addresses.iter().filter(|a| !is_private_ip(**a)) {
		warn!(%address, "Listening on a non-private address exposes the forwarded ports");
	}

	let selector = args.target.selector(ctx).await?;
	let target = ctx
		.resolver()
		.resolve_newest(&selector)
		.await
		.context("failed to find a pod to forward to")?;

	let (stop_tx, stop_rx) = oneshot::channel();
	let (ready_tx, ready_rx) = oneshot::channel();
	let pod_name = target.pod_name().to_string();
	let announcer = tokio::spawn(async move {
		if let Ok(bound) = ready_rx.await {
			for local in bound {
				println!(
					"{} Forwarding {} -> {}",
					style("→").cyan(),
					style(local).cyan(),
					pod_name
				);
			}
			println!("\nPress Ctrl+C to stop forwarding...");
		}
		let _ = tokio::signal::ctrl_c().await;
		let _ = stop_tx.send(());
	});

	let result = port_forward(
		Arc::clone(&ctx.client),
		&target.pod,
		&args.ports,
		&addresses,
		stop_rx,
		ready_tx,
	)
	.await;
	announcer.abort();
	result.context("port forwarding failed")?;

	println!("{} Port forwarding stopped", style("✓").green().bold());
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::testing::context_with;
	use skiff_k8s::MockK8sClient;
	use std::net::Ipv4Addr;

	fn args(addresses: Vec<IpAddr>) -> ForwardArgs {
		ForwardArgs {
			target: TargetArgs::default(),
			ports: vec![PortMapping::new(8080, 80)],
			addresses,
		}
	}

	#[test]
	fn test_configured_addresses_by_default() {
		let ctx = context_with(Arc::new(MockK8sClient::new()));
		assert_eq!(
			listen_addresses(&args(vec![]), &ctx),
			vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]
		);
	}

	#[test]
	fn test_flag_addresses_override_config() {
		let ctx = context_with(Arc::new(MockK8sClient::new()));
		let any = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
		assert_eq!(listen_addresses(&args(vec![any]), &ctx), vec![any]);
	}
}
