// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory [`K8sClient`] for tests.
//!
//! Pod lists are served from a queue of frames so tests can script how the
//! cluster evolves between polls: each `list_pods` call consumes the front
//! frame until only one is left, which then sticks.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{duplex, sink};
use tokio_util::sync::CancellationToken;

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::types::{
	AttachOptions, AttachedProcess, ClusterInfo, ClusterRoleBinding, Deployment, ForwardTunnel,
	Namespace, Pod, ServiceAccount, TransportHandle,
};

/// How a mocked attach session behaves once opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachBehavior {
	/// Write the given bytes to stdout and finish.
	Exit(Vec<u8>),
	/// Write the given bytes to stdout, then report a broken stream.
	Fail { output: Vec<u8>, message: String },
	/// Stay open until the transport is closed.
	Hang,
}

/// Record of one `exec_attach` call.
#[derive(Debug, Clone)]
pub struct AttachCall {
	pub pod: String,
	pub namespace: String,
	pub container: String,
	pub opts: AttachOptions,
	pub transport: TransportHandle,
}

#[derive(Default)]
struct MockState {
	pod_frames: VecDeque<Vec<Pod>>,
	list_calls: usize,
	namespaces: BTreeMap<String, Namespace>,
	namespace_creates: usize,
	deployments: HashMap<(String, String), Deployment>,
	bindings: BTreeMap<String, ClusterRoleBinding>,
	service_accounts: HashMap<(String, String), ServiceAccount>,
	service_account_replaces: usize,
	attach_behavior: Option<AttachBehavior>,
	attach_calls: Vec<AttachCall>,
	forward_failure: Option<String>,
	forwarded_ports: Vec<u16>,
	/// Cancelled when the pods behind the open tunnels go away.
	tunnels: CancellationToken,
	bindings_forbidden: bool,
	binding_reads: usize,
}

/// A mock K8s client backed by in-memory state.
pub struct MockK8sClient {
	state: Mutex<MockState>,
	default_namespace: String,
	cluster: ClusterInfo,
}

impl Default for MockK8sClient {
	fn default() -> Self {
		Self::new()
	}
}

impl MockK8sClient {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(MockState::default()),
			default_namespace: "default".to_string(),
			cluster: ClusterInfo::default(),
		}
	}

	pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.default_namespace = namespace.into();
		self
	}

	pub fn with_cluster_info(mut self, cluster: ClusterInfo) -> Self {
		self.cluster = cluster;
		self
	}

	/// Replace all scripted frames with a single sticky pod list.
	pub fn set_pods(&self, pods: Vec<Pod>) {
		let mut state = self.state.lock().unwrap();
		state.pod_frames.clear();
		state.pod_frames.push_back(pods);
	}

	/// Append a frame to the scripted sequence of pod lists.
	pub fn push_pod_frame(&self, pods: Vec<Pod>) {
		self.state.lock().unwrap().pod_frames.push_back(pods);
	}

	/// Remove `name` from every scripted frame and break its open tunnels.
	pub fn delete_pod(&self, name: &str) {
		let mut state = self.state.lock().unwrap();
		for frame in state.pod_frames.iter_mut() {
			frame.retain(|pod| pod.metadata.name.as_deref() != Some(name));
		}
		state.tunnels.cancel();
		state.tunnels = CancellationToken::new();
	}

	pub fn list_calls(&self) -> usize {
		self.state.lock().unwrap().list_calls
	}

	pub fn add_namespace(&self, name: &str) {
		self
			.state
			.lock()
			.unwrap()
			.namespaces
			.insert(name.to_string(), named_namespace(name));
	}

	pub fn namespace_names(&self) -> Vec<String> {
		self.state.lock().unwrap().namespaces.keys().cloned().collect()
	}

	pub fn namespace_creates(&self) -> usize {
		self.state.lock().unwrap().namespace_creates
	}

	pub fn add_deployment(&self, namespace: &str, deployment: Deployment) {
		let name = deployment.metadata.name.clone().unwrap_or_default();
		self
			.state
			.lock()
			.unwrap()
			.deployments
			.insert((namespace.to_string(), name), deployment);
	}

	pub fn add_cluster_role_binding(&self, binding: ClusterRoleBinding) {
		let name = binding.metadata.name.clone().unwrap_or_default();
		self.state.lock().unwrap().bindings.insert(name, binding);
	}

	/// Reject cluster role binding reads as an RBAC-restricted user would see.
	pub fn forbid_cluster_role_bindings(&self) {
		self.state.lock().unwrap().bindings_forbidden = true;
	}

	pub fn cluster_role_binding_reads(&self) -> usize {
		self.state.lock().unwrap().binding_reads
	}

	pub fn cluster_role_binding(&self, name: &str) -> Option<ClusterRoleBinding> {
		self.state.lock().unwrap().bindings.get(name).cloned()
	}

	pub fn add_service_account(&self, namespace: &str, account: ServiceAccount) {
		let name = account.metadata.name.clone().unwrap_or_default();
		self
			.state
			.lock()
			.unwrap()
			.service_accounts
			.insert((namespace.to_string(), name), account);
	}

	pub fn service_account(&self, name: &str, namespace: &str) -> Option<ServiceAccount> {
		self
			.state
			.lock()
			.unwrap()
			.service_accounts
			.get(&(namespace.to_string(), name.to_string()))
			.cloned()
	}

	pub fn service_account_replaces(&self) -> usize {
		self.state.lock().unwrap().service_account_replaces
	}

	pub fn set_attach_behavior(&self, behavior: AttachBehavior) {
		self.state.lock().unwrap().attach_behavior = Some(behavior);
	}

	pub fn attach_calls(&self) -> Vec<AttachCall> {
		self.state.lock().unwrap().attach_calls.clone()
	}

	/// Make every subsequent port-forward attempt fail with `message`.
	pub fn fail_port_forward(&self, message: impl Into<String>) {
		self.state.lock().unwrap().forward_failure = Some(message.into());
	}

	pub fn forwarded_ports(&self) -> Vec<u16> {
		self.state.lock().unwrap().forwarded_ports.clone()
	}
}

fn named_namespace(name: &str) -> Namespace {
	let mut ns = Namespace::default();
	ns.metadata.name = Some(name.to_string());
	ns
}

/// Equality-based label selector matching (`a=b`, `a==b`, `a!=b`, `a`).
fn matches_selector(pod: &Pod, selector: &str) -> bool {
	let empty = BTreeMap::new();
	let labels = pod.metadata.labels.as_ref().unwrap_or(&empty);

	selector
		.split(',')
		.map(str::trim)
		.filter(|term| !term.is_empty())
		.all(|term| {
			if let Some((key, value)) = term.split_once("!=") {
				labels.get(key.trim()).map(String::as_str) != Some(value.trim())
			} else if let Some((key, value)) = term.split_once("==") {
				labels.get(key.trim()).map(String::as_str) == Some(value.trim())
			} else if let Some((key, value)) = term.split_once('=') {
				labels.get(key.trim()).map(String::as_str) == Some(value.trim())
			} else {
				labels.contains_key(term)
			}
		})
}

fn in_namespace(pod: &Pod, namespace: &str) -> bool {
	pod
		.metadata
		.namespace
		.as_deref()
		.map_or(true, |ns| ns == namespace)
}

#[async_trait]
impl K8sClient for MockK8sClient {
	fn default_namespace(&self) -> &str {
		&self.default_namespace
	}

	fn cluster_info(&self) -> &ClusterInfo {
		&self.cluster
	}

	async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError> {
		let mut state = self.state.lock().unwrap();
		state.list_calls += 1;
		let frame = if state.pod_frames.len() > 1 {
			state.pod_frames.pop_front().unwrap_or_default()
		} else {
			state.pod_frames.front().cloned().unwrap_or_default()
		};
		Ok(frame
			.into_iter()
			.filter(|pod| in_namespace(pod, namespace) && matches_selector(pod, label_selector))
			.collect())
	}

	async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod, K8sError> {
		let pods = self.list_pods(namespace, "").await?;
		pods
			.into_iter()
			.find(|pod| pod.metadata.name.as_deref() == Some(name))
			.ok_or_else(|| K8sError::PodNotFound {
				name: name.to_string(),
			})
	}

	async fn get_deployment(&self, name: &str, namespace: &str) -> Result<Deployment, K8sError> {
		self
			.state
			.lock()
			.unwrap()
			.deployments
			.get(&(namespace.to_string(), name.to_string()))
			.cloned()
			.ok_or_else(|| K8sError::DeploymentNotFound {
				name: name.to_string(),
			})
	}

	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError> {
		self
			.state
			.lock()
			.unwrap()
			.namespaces
			.get(name)
			.cloned()
			.ok_or_else(|| K8sError::NamespaceNotFound {
				name: name.to_string(),
			})
	}

	async fn create_namespace(&self, name: &str) -> Result<Namespace, K8sError> {
		let mut state = self.state.lock().unwrap();
		if state.namespaces.contains_key(name) {
			return Err(K8sError::AlreadyExists {
				kind: "Namespace",
				name: name.to_string(),
			});
		}
		state.namespace_creates += 1;
		let ns = named_namespace(name);
		state.namespaces.insert(name.to_string(), ns.clone());
		Ok(ns)
	}

	async fn get_cluster_role_binding(&self, name: &str) -> Result<ClusterRoleBinding, K8sError> {
		let mut state = self.state.lock().unwrap();
		state.binding_reads += 1;
		if state.bindings_forbidden {
			return Err(K8sError::ApiError {
				message: format!(
					"clusterrolebindings.rbac.authorization.k8s.io \"{name}\" is forbidden (403)"
				),
			});
		}
		state
			.bindings
			.get(name)
			.cloned()
			.ok_or_else(|| K8sError::ClusterRoleBindingNotFound {
				name: name.to_string(),
			})
	}

	async fn create_cluster_role_binding(
		&self,
		binding: ClusterRoleBinding,
	) -> Result<ClusterRoleBinding, K8sError> {
		let name = binding.metadata.name.clone().unwrap_or_default();
		let mut state = self.state.lock().unwrap();
		if state.bindings.contains_key(&name) {
			return Err(K8sError::AlreadyExists {
				kind: "ClusterRoleBinding",
				name,
			});
		}
		state.bindings.insert(name, binding.clone());
		Ok(binding)
	}

	async fn get_service_account(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<ServiceAccount, K8sError> {
		self
			.service_account(name, namespace)
			.ok_or_else(|| K8sError::ServiceAccountNotFound {
				name: name.to_string(),
			})
	}

	async fn replace_service_account(
		&self,
		namespace: &str,
		account: ServiceAccount,
	) -> Result<ServiceAccount, K8sError> {
		let name = account.metadata.name.clone().unwrap_or_default();
		let mut state = self.state.lock().unwrap();
		let key = (namespace.to_string(), name.clone());
		if !state.service_accounts.contains_key(&key) {
			return Err(K8sError::ServiceAccountNotFound { name });
		}
		state.service_account_replaces += 1;
		state.service_accounts.insert(key, account.clone());
		Ok(account)
	}

	async fn exec_attach(
		&self,
		name: &str,
		namespace: &str,
		container: &str,
		opts: AttachOptions,
	) -> Result<AttachedProcess, K8sError> {
		self.get_pod(name, namespace).await?;

		let transport = TransportHandle::new();
		let behavior = {
			let mut state = self.state.lock().unwrap();
			state.attach_calls.push(AttachCall {
				pod: name.to_string(),
				namespace: namespace.to_string(),
				container: container.to_string(),
				opts,
				transport: transport.clone(),
			});
			state
				.attach_behavior
				.clone()
				.unwrap_or(AttachBehavior::Exit(Vec::new()))
		};

		let closed = transport.clone();
		let (stdout, completion): (
			std::pin::Pin<Box<dyn tokio::io::AsyncRead + Send>>,
			crate::types::CompletionFuture,
		) = match behavior {
			AttachBehavior::Exit(output) => (Box::pin(Cursor::new(output)), Box::pin(async { Ok(()) })),
			AttachBehavior::Fail { output, message } => (
				Box::pin(Cursor::new(output)),
				Box::pin(async move { Err(K8sError::AttachError { message }) }),
			),
			AttachBehavior::Hang => {
				// Keep the writer half inside the completion future so stdout
				// only reaches EOF once the transport is closed.
				let (writer, reader) = duplex(64);
				(
					Box::pin(reader),
					Box::pin(async move {
						closed.closed().await;
						drop(writer);
						Ok(())
					}),
				)
			}
		};

		Ok(AttachedProcess {
			stdin: opts
				.stdin
				.then(|| Box::pin(sink()) as std::pin::Pin<Box<dyn tokio::io::AsyncWrite + Send>>),
			stdout,
			stderr: None,
			completion,
			transport,
		})
	}

	async fn open_port_forward(
		&self,
		name: &str,
		namespace: &str,
		port: u16,
	) -> Result<ForwardTunnel, K8sError> {
		self.get_pod(name, namespace).await?;

		let lost = {
			let mut state = self.state.lock().unwrap();
			if let Some(message) = state.forward_failure.clone() {
				return Err(K8sError::PortForwardError { message });
			}
			state.forwarded_ports.push(port);
			state.tunnels.clone()
		};

		// The remote end echoes whatever it receives.
		let (local, remote) = duplex(1024);
		let echo = tokio::spawn(async move {
			let (mut reader, mut writer) = tokio::io::split(remote);
			let _ = tokio::io::copy(&mut reader, &mut writer).await;
		});
		let echo_abort = echo.abort_handle();

		Ok(ForwardTunnel {
			stream: Box::new(local),
			completion: Box::pin(async move {
				tokio::select! {
					_ = echo => Ok(()),
					_ = lost.cancelled() => {
						echo_abort.abort();
						Err(K8sError::PortForwardError {
							message: "lost connection to pod".to_string(),
						})
					}
				}
			}),
		})
	}
}
