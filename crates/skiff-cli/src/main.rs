// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! skiff - attach to and forward ports of pods while a cluster settles.
//!
//! Every command resolves its target through `skiff-target`, which waits for
//! pods to leave transient states and fails fast on critical ones, and then
//! opens a session through `skiff-session`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skiff_cli_config::{load_config_with_cli, CliOverrides};
use tracing::info;

mod commands;
mod context;
mod logging;
mod version;

use commands::{AttachArgs, ForwardArgs, PodsArgs, StatusArgs};
use context::CliContext;

/// skiff - sessions into pods of a changing cluster
#[derive(Parser, Debug)]
#[command(name = "skiff", version, about, long_about = None)]
struct Args {
	/// Path to custom configuration file
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Namespace to work in (overrides config)
	#[arg(short, long, global = true)]
	namespace: Option<String>,

	/// Kubeconfig context to use (overrides config)
	#[arg(long, global = true)]
	context: Option<String>,

	/// Seconds to wait for a target to become ready (overrides config)
	#[arg(long, global = true, value_name = "SECS")]
	max_wait: Option<u64>,

	/// Log level (overrides config)
	#[arg(long, global = true)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long, global = true)]
	json_logs: bool,

	/// File receiving session diagnostics (overrides config)
	#[arg(long, global = true)]
	session_log: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Attach to the newest running container matching the selector
	Attach(AttachArgs),
	/// Forward local ports to the newest running pod matching the selector
	Forward(ForwardArgs),
	/// List pods with their derived status
	Pods(PodsArgs),
	/// Prepare the namespace, RBAC and pull secrets, and report on them
	Status(StatusArgs),
	/// Print version information
	Version,
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		Self {
			namespace: args.namespace.clone(),
			context: args.context.clone(),
			max_wait_secs: args.max_wait,
			log_level: args.log_level.clone(),
			log_format: if args.json_logs {
				Some("json".to_string())
			} else {
				None
			},
			session_log: args.session_log.clone(),
			config_file: args.config.clone(),
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	let config =
		load_config_with_cli(CliOverrides::from(&args)).context("failed to load configuration")?;

	logging::init_tracing(&config.logging).context("failed to initialise logging")?;

	info!(
		namespace = ?config.kube.namespace,
		context = ?config.kube.context,
		"starting skiff"
	);

	let ctx = CliContext::connect(config).await?;

	match args.command {
		Command::Attach(attach) => commands::handle_attach(attach, &ctx).await,
		Command::Forward(forward) => commands::handle_forward(forward, &ctx).await,
		Command::Pods(pods) => commands::handle_pods(pods, &ctx).await,
		Command::Status(status) => commands::handle_status(status, &ctx).await,
		Command::Version => Ok(()),
	}
}
