// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Tracing setup.
//!
//! Terminal output carries everything except session diagnostics, which go to
//! the session log file so they never interleave with an attached terminal.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use skiff_cli_config::{LogFormat, LogLevel, LoggingConfig};
use skiff_session::SESSION_LOG_TARGET;
use tracing_subscriber::filter::{filter_fn, LevelFilter, Targets};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn default_directive(level: LogLevel) -> String {
	format!("skiff={}", level.as_str())
}

fn open_session_log(path: &Path) -> Result<File> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)
			.with_context(|| format!("failed to create {}", parent.display()))?;
	}
	OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.with_context(|| format!("failed to open session log {}", path.display()))
}

fn is_session_event(target: &str) -> bool {
	target.starts_with(SESSION_LOG_TARGET)
}

pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_directive(logging.level)));

	let session_log = open_session_log(&logging.session_log)?;
	let session_layer = fmt::layer()
		.with_ansi(false)
		.with_writer(Mutex::new(session_log))
		.with_filter(Targets::new().with_target(SESSION_LOG_TARGET, LevelFilter::TRACE));
	let terminal_only = filter_fn(|meta| !is_session_event(meta.target()));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(session_layer)
				.with(
					fmt::layer()
						.json()
						.with_writer(std::io::stderr)
						.with_filter(terminal_only),
				)
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(session_layer)
				.with(
					fmt::layer()
						.compact()
						.with_writer(std::io::stderr)
						.with_filter(terminal_only),
				)
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(session_layer)
				.with(
					fmt::layer()
						.with_writer(std::io::stderr)
						.with_filter(terminal_only),
				)
				.init();
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_directive_covers_all_crates() {
		assert_eq!(default_directive(LogLevel::Debug), "skiff=debug");
		assert_eq!(default_directive(LogLevel::Info), "skiff=info");
	}

	#[test]
	fn test_session_events_are_split_off() {
		assert!(is_session_event("skiff::session"));
		assert!(!is_session_event("skiff_session::attach"));
		assert!(!is_session_event("skiff_target::discovery"));
	}

	#[test]
	fn test_session_log_parent_is_created() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("state/skiff/session.log");

		open_session_log(&path).unwrap();
		assert!(path.exists());

		// Reopening appends instead of failing.
		open_session_log(&path).unwrap();
	}
}
