// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Local listeners tunnelled to ports of a pod.
//!
//! Every accepted connection gets its own tunnel to the remote port. A further
//! tunnel is held open for the lifetime of the session so that losing the pod
//! is noticed while no local connection is active. The session runs until the
//! caller signals `stop` (by sending or by dropping the sender), until that
//! held tunnel closes, or until a tunnel can no longer be opened.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use skiff_k8s::{ForwardTunnel, K8sClient, K8sError, Pod};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::ports::PortMapping;
use crate::SESSION_LOG_TARGET;

/// Address listeners bind to when the caller names none.
pub const DEFAULT_FORWARD_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Pause after a failed `accept` before the listener is polled again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Clone)]
struct Remote {
	client: Arc<dyn K8sClient>,
	pod: String,
	namespace: String,
}

impl Remote {
	fn open_error(&self, port: u16, err: K8sError) -> SessionError {
		if err.is_not_found() {
			return SessionError::K8s(err);
		}
		SessionError::transport(format!(
			"failed to open tunnel to {}:{port}: {err}",
			self.pod
		))
	}
}

/// Forward `ports` of `pod` on every address in `addresses`.
///
/// `ready` receives the bound local addresses once every listener is up. A
/// pod that cannot be reached at all fails the call before any listener is
/// bound; `ready` is then dropped.
pub async fn port_forward(
	client: Arc<dyn K8sClient>,
	pod: &Pod,
	ports: &[PortMapping],
	addresses: &[IpAddr],
	stop: oneshot::Receiver<()>,
	ready: oneshot::Sender<Vec<SocketAddr>>,
) -> Result<(), SessionError> {
	let remote = Remote {
		pod: pod.metadata.name.clone().unwrap_or_default(),
		namespace: pod
			.metadata
			.namespace
			.clone()
			.unwrap_or_else(|| client.default_namespace().to_string()),
		client,
	};
	let addresses = if addresses.is_empty() {
		&[DEFAULT_FORWARD_ADDRESS][..]
	} else {
		addresses
	};

	let Some(first) = ports.first() else {
		return Err(SessionError::InvalidPortSpec {
			spec: String::new(),
			reason: "no ports to forward".to_string(),
		});
	};
	let ForwardTunnel {
		stream: held_stream,
		completion: remote_closed,
	} = remote
		.client
		.open_port_forward(&remote.pod, &remote.namespace, first.remote)
		.await
		.map_err(|e| remote.open_error(first.remote, e))?;

	let mut listeners = Vec::with_capacity(addresses.len() * ports.len());
	let mut bound = Vec::with_capacity(listeners.capacity());
	for address in addresses {
		for mapping in ports {
			let address = SocketAddr::new(*address, mapping.local);
			let listener = TcpListener::bind(address)
				.await
				.map_err(|source| SessionError::Bind { address, source })?;
			let local = listener.local_addr()?;
			info!(
				target: SESSION_LOG_TARGET,
				pod = %remote.pod,
				"Forwarding from {local} -> {}",
				mapping.remote
			);
			bound.push(local);
			listeners.push((listener, mapping.remote));
		}
	}

	let (fatal_tx, mut fatal_rx) = mpsc::channel::<SessionError>(1);
	let mut accept_loops = JoinSet::new();
	for (listener, remote_port) in listeners {
		accept_loops.spawn(accept_loop(
			listener,
			remote_port,
			remote.clone(),
			fatal_tx.clone(),
		));
	}
	drop(fatal_tx);

	let _ = ready.send(bound);

	let outcome = tokio::select! {
		_ = stop => {
			debug!(target: SESSION_LOG_TARGET, pod = %remote.pod, "Port forwarding stopped");
			Ok(())
		}
		closed = remote_closed => {
			let err = match closed {
				Ok(()) => SessionError::transport(format!("connection to {} closed", remote.pod)),
				Err(e) => SessionError::transport(e.to_string()),
			};
			warn!(target: SESSION_LOG_TARGET, pod = %remote.pod, error = %err, "Port forwarding lost");
			Err(err)
		}
		Some(err) = fatal_rx.recv() => {
			warn!(target: SESSION_LOG_TARGET, pod = %remote.pod, error = %err, "Port forwarding lost");
			Err(err)
		}
	};

	// Dropping an accept loop aborts the connections it spawned.
	accept_loops.shutdown().await;
	drop(held_stream);
	outcome
}

async fn accept_loop(
	listener: TcpListener,
	remote_port: u16,
	remote: Remote,
	fatal: mpsc::Sender<SessionError>,
) {
	let mut connections = JoinSet::new();

	loop {
		let (socket, peer) = match listener.accept().await {
			Ok(accepted) => accepted,
			Err(e) => {
				warn!(target: SESSION_LOG_TARGET, error = %e, "Failed to accept connection");
				tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
				continue;
			}
		};
		while connections.try_join_next().is_some() {}

		let tunnel = match remote
			.client
			.open_port_forward(&remote.pod, &remote.namespace, remote_port)
			.await
		{
			Ok(tunnel) => tunnel,
			Err(e) => {
				let _ = fatal.send(remote.open_error(remote_port, e)).await;
				return;
			}
		};

		debug!(target: SESSION_LOG_TARGET, %peer, remote_port, "Handling connection");
		connections.spawn(forward_connection(socket, peer, tunnel, fatal.clone()));
	}
}

async fn forward_connection(
	mut socket: TcpStream,
	peer: SocketAddr,
	tunnel: ForwardTunnel,
	fatal: mpsc::Sender<SessionError>,
) {
	let ForwardTunnel {
		mut stream,
		completion,
	} = tunnel;

	match tokio::io::copy_bidirectional(&mut socket, &mut stream).await {
		Ok((sent, received)) => {
			debug!(target: SESSION_LOG_TARGET, %peer, sent, received, "Connection closed");
		}
		Err(e) => {
			debug!(target: SESSION_LOG_TARGET, %peer, error = %e, "Connection ended with error");
		}
	}
	drop(stream);

	if let Err(e) = completion.await {
		let _ = fatal.send(SessionError::transport(e.to_string())).await;
	}
}
