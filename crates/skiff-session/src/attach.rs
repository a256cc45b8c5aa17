// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use skiff_k8s::{AttachOptions, AttachedProcess, K8sClient};
use skiff_target::ResolvedTarget;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::SESSION_LOG_TARGET;

/// Local ends of an attach session.
pub struct SessionIo {
	/// `None` attaches without a stdin stream.
	pub stdin: Option<Box<dyn AsyncRead + Send + Unpin>>,
	pub stdout: Box<dyn AsyncWrite + Send + Unpin>,
	pub stderr: Box<dyn AsyncWrite + Send + Unpin>,
}

impl SessionIo {
	/// The process's own standard streams.
	pub fn stdio() -> Self {
		Self {
			stdin: Some(Box::new(tokio::io::stdin())),
			stdout: Box::new(tokio::io::stdout()),
			stderr: Box::new(tokio::io::stderr()),
		}
	}
}

/// Attach the local streams to the target container and block until the
/// session ends or `cancel` fires.
///
/// The transport is closed on every exit path. A stream that breaks is
/// reported as [`SessionError::Transport`] and never retried.
pub async fn attach(
	client: &dyn K8sClient,
	target: &ResolvedTarget,
	io: SessionIo,
	cancel: CancellationToken,
) -> Result<(), SessionError> {
	let container = &target.container;
	let tty = container.tty.unwrap_or(false);
	let stdin = container.stdin.unwrap_or(false);

	if !(tty && stdin) {
		warn!(
			"To be able to interact with the container options tty (currently `{tty}`) and stdin (currently `{stdin}`) must both be `true`"
		);
	}

	info!(
		"Attaching to pod:container {}:{}",
		target.pod_name(),
		target.container_name()
	);
	info!("If you don't see a command prompt, try pressing enter.");

	let opts = AttachOptions {
		stdin: io.stdin.is_some(),
		tty,
	};
	let process = client
		.exec_attach(
			target.pod_name(),
			target.namespace(),
			target.container_name(),
			opts,
		)
		.await?;
	let transport = process.transport.clone();

	let (done_tx, done_rx) = oneshot::channel();
	tokio::spawn(async move {
		let _ = done_tx.send(pump(process, io).await);
	});

	let outcome = tokio::select! {
		result = done_rx => result.unwrap_or_else(|_| {
			Err(SessionError::transport("attach task ended without a result"))
		}),
		_ = cancel.cancelled() => {
			debug!(target: SESSION_LOG_TARGET, "Attach session cancelled");
			Ok(())
		}
	};

	transport.close();
	outcome
}

/// Copy streams in both directions until the remote side finishes.
async fn pump(process: AttachedProcess, io: SessionIo) -> Result<(), SessionError> {
	let AttachedProcess {
		stdin: remote_stdin,
		stdout: mut remote_stdout,
		stderr: remote_stderr,
		completion,
		..
	} = process;
	let SessionIo {
		stdin: local_stdin,
		stdout: mut local_stdout,
		stderr: mut local_stderr,
	} = io;

	// Reading stdin blocks until the user types, so it must not hold up the
	// end of the session.
	let stdin_task = match (local_stdin, remote_stdin) {
		(Some(mut local), Some(mut remote)) => Some(tokio::spawn(async move {
			if let Err(e) = tokio::io::copy(&mut local, &mut remote).await {
				debug!(target: SESSION_LOG_TARGET, error = %e, "stdin copy ended");
			}
		})),
		_ => None,
	};

	let stdout = async {
		tokio::io::copy(&mut remote_stdout, &mut local_stdout).await?;
		local_stdout.flush().await
	};
	let stderr = async {
		match remote_stderr {
			Some(mut remote) => {
				tokio::io::copy(&mut remote, &mut local_stderr).await?;
				local_stderr.flush().await
			}
			None => Ok(()),
		}
	};

	let (stdout, stderr, completion) = tokio::join!(stdout, stderr, completion);

	if let Some(task) = stdin_task {
		task.abort();
	}

	if let Err(e) = completion {
		warn!(target: SESSION_LOG_TARGET, error = %e, "Attach stream failed");
		return Err(SessionError::transport(e.to_string()));
	}
	stdout?;
	stderr?;
	debug!(target: SESSION_LOG_TARGET, "Attach stream finished");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use skiff_k8s::{AttachBehavior, Container, MockK8sClient, Pod, PodSpec};
	use tokio::io::{duplex, AsyncReadExt, DuplexStream};

	fn target(tty: bool, stdin: bool) -> ResolvedTarget {
		let container = Container {
			name: "app".to_string(),
			image: Some("app:v1".to_string()),
			tty: Some(tty),
			stdin: Some(stdin),
			..Default::default()
		};
		let mut pod = Pod::default();
		pod.metadata.name = Some("web-1".to_string());
		pod.metadata.namespace = Some("dev".to_string());
		pod.spec = Some(PodSpec {
			containers: vec![container.clone()],
			..Default::default()
		});
		ResolvedTarget { pod, container }
	}

	fn client_with(behavior: AttachBehavior) -> MockK8sClient {
		let client = MockK8sClient::new();
		client.set_pods(vec![target(true, true).pod]);
		client.set_attach_behavior(behavior);
		client
	}

	/// Session I/O whose stdout can be read back after the session.
	fn captured_io(with_stdin: bool) -> (SessionIo, DuplexStream) {
		let (stdout, captured) = duplex(4096);
		let io = SessionIo {
			stdin: with_stdin.then(|| Box::new(tokio::io::empty()) as Box<dyn AsyncRead + Send + Unpin>),
			stdout: Box::new(stdout),
			stderr: Box::new(tokio::io::sink()),
		};
		(io, captured)
	}

	#[tokio::test]
	async fn attach_copies_output_and_closes_transport() {
		let client = client_with(AttachBehavior::Exit(b"hello\n".to_vec()));
		let (io, mut captured) = captured_io(true);

		attach(&client, &target(true, true), io, CancellationToken::new())
			.await
			.unwrap();

		let mut output = String::new();
		captured.read_to_string(&mut output).await.unwrap();
		assert_eq!(output, "hello\n");

		let calls = client.attach_calls();
		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0].pod, "web-1");
		assert_eq!(calls[0].namespace, "dev");
		assert_eq!(calls[0].container, "app");
		assert!(calls[0].opts.tty);
		assert!(calls[0].opts.stdin);
		assert!(calls[0].transport.is_closed());
	}

	#[tokio::test]
	async fn attach_without_tty_still_proceeds() {
		let client = client_with(AttachBehavior::Exit(Vec::new()));
		let (io, _captured) = captured_io(false);

		attach(&client, &target(false, false), io, CancellationToken::new())
			.await
			.unwrap();

		let calls = client.attach_calls();
		assert!(!calls[0].opts.tty);
		assert!(!calls[0].opts.stdin);
	}

	#[tokio::test]
	async fn broken_stream_is_transport_error() {
		let client = client_with(AttachBehavior::Fail {
			output: b"partial".to_vec(),
			message: "connection reset".to_string(),
		});
		let (io, mut captured) = captured_io(true);

		let err = attach(&client, &target(true, true), io, CancellationToken::new())
			.await
			.unwrap_err();

		assert!(matches!(err, SessionError::Transport { ref message } if message.contains("connection reset")));
		assert!(client.attach_calls()[0].transport.is_closed());

		let mut output = String::new();
		captured.read_to_string(&mut output).await.unwrap();
		assert_eq!(output, "partial");
	}

	#[tokio::test]
	async fn cancel_ends_session_and_closes_transport() {
		let client = client_with(AttachBehavior::Hang);
		let (io, _captured) = captured_io(true);
		let cancel = CancellationToken::new();

		let trigger = cancel.clone();
		tokio::spawn(async move {
			tokio::task::yield_now().await;
			trigger.cancel();
		});

		attach(&client, &target(true, true), io, cancel).await.unwrap();
		assert!(client.attach_calls()[0].transport.is_closed());
	}

	#[tokio::test]
	async fn missing_pod_fails_before_streaming() {
		let client = MockK8sClient::new();
		let (io, _captured) = captured_io(true);

		let err = attach(&client, &target(true, true), io, CancellationToken::new())
			.await
			.unwrap_err();

		assert!(matches!(err, SessionError::K8s(ref e) if e.is_not_found()));
		assert!(client.attach_calls().is_empty());
	}
}
