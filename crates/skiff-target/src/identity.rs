// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Lookup of the account the local cloud CLI is logged in as.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Source of the active cloud account name.
#[async_trait]
pub trait AccountResolver: Send + Sync {
	/// The active account, or `None` when it cannot be determined.
	async fn active_account(&self) -> Option<String>;
}

/// Asks `gcloud` for the account of the active configuration.
#[derive(Debug, Clone)]
pub struct GcloudAccountResolver {
	program: String,
}

impl Default for GcloudAccountResolver {
	fn default() -> Self {
		Self {
			program: "gcloud".to_string(),
		}
	}
}

impl GcloudAccountResolver {
	/// Use a different executable in place of `gcloud`.
	pub fn with_program(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
		}
	}
}

#[async_trait]
impl AccountResolver for GcloudAccountResolver {
	async fn active_account(&self) -> Option<String> {
		let output = Command::new(&self.program)
			.args(["config", "list", "account", "--format", "value(core.account)"])
			.output()
			.await;

		match output {
			Ok(output) if output.status.success() => parse_account_output(&output.stdout),
			Ok(output) => {
				debug!(status = %output.status, "gcloud exited unsuccessfully");
				None
			}
			Err(e) => {
				debug!(error = %e, program = %self.program, "Failed to run gcloud");
				None
			}
		}
	}
}

/// Extract the account from `gcloud config list` output.
pub fn parse_account_output(stdout: &[u8]) -> Option<String> {
	let text = String::from_utf8_lossy(stdout);
	let account = text.trim_end_matches(['\r', '\n']);
	if account.is_empty() {
		None
	} else {
		Some(account.to_string())
	}
}

/// Resolver that always answers with a fixed value.
#[derive(Debug, Clone, Default)]
pub struct StaticAccountResolver(pub Option<String>);

#[async_trait]
impl AccountResolver for StaticAccountResolver {
	async fn active_account(&self) -> Option<String> {
		self.0.clone()
	}
}
