// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::net::SocketAddr;

use skiff_k8s::K8sError;

/// Errors that end or prevent a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
	/// The stream to the container broke after it was established
	#[error("Transport error: {message}")]
	Transport { message: String },

	#[error("Invalid port spec '{spec}': {reason}")]
	InvalidPortSpec { spec: String, reason: String },

	#[error("Failed to listen on {address}: {source}")]
	Bind {
		address: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// The session could not be opened
	#[error(transparent)]
	K8s(#[from] K8sError),
}

impl SessionError {
	pub(crate) fn transport(message: impl Into<String>) -> Self {
		Self::Transport {
			message: message.into(),
		}
	}
}
