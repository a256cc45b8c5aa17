// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, ServiceAccount};
use k8s_openapi::api::rbac::v1::ClusterRoleBinding;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{
	api::{Api, AttachParams, ListParams, PostParams},
	config::{KubeConfigOptions, Kubeconfig},
	Client, Config,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, instrument};

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::types::{
	AttachOptions, AttachedProcess, ClusterInfo, ForwardTunnel, TransportHandle,
};

/// Overrides for how [`KubeClient`] picks its kubeconfig context and namespace.
#[derive(Debug, Clone, Default)]
pub struct KubeOptions {
	pub context: Option<String>,
	pub namespace: Option<String>,
}

/// Production K8s client implementation using the kube crate.
pub struct KubeClient {
	client: Client,
	default_namespace: String,
	cluster: ClusterInfo,
}

impl KubeClient {
	/// Create a new KubeClient that auto-discovers cluster configuration.
	///
	/// This will attempt to load config from:
	/// 1. KUBECONFIG environment variable
	/// 2. ~/.kube/config
	/// 3. In-cluster service account (when running in K8s)
	pub async fn new() -> Result<Self, K8sError> {
		Self::with_options(KubeOptions::default()).await
	}

	/// Create a client for an explicit context and/or namespace.
	pub async fn with_options(opts: KubeOptions) -> Result<Self, K8sError> {
		let config = match &opts.context {
			Some(context) => {
				let kube_opts = KubeConfigOptions {
					context: Some(context.clone()),
					..Default::default()
				};
				Config::from_kubeconfig(&kube_opts)
					.await
					.map_err(|e| K8sError::Config {
						message: e.to_string(),
					})?
			}
			None => Config::infer().await.map_err(|e| K8sError::Config {
				message: e.to_string(),
			})?,
		};

		let context = opts
			.context
			.clone()
			.or_else(|| Kubeconfig::read().ok().and_then(|k| k.current_context));
		let cluster = ClusterInfo {
			context,
			auth_provider: config
				.auth_info
				.auth_provider
				.as_ref()
				.map(|provider| provider.name.clone()),
		};
		let default_namespace = opts
			.namespace
			.unwrap_or_else(|| config.default_namespace.clone());

		let client = Client::try_from(config)?;
		debug!(
			context = ?cluster.context,
			namespace = %default_namespace,
			"K8s client initialized"
		);

		Ok(Self {
			client,
			default_namespace,
			cluster,
		})
	}

	fn pods(&self, namespace: &str) -> Api<Pod> {
		Api::namespaced(self.client.clone(), namespace)
	}
}

fn is_status(err: &kube::Error, code: u16) -> bool {
	matches!(err, kube::Error::Api(resp) if resp.code == code)
}

#[async_trait]
impl K8sClient for KubeClient {
	fn default_namespace(&self) -> &str {
		&self.default_namespace
	}

	fn cluster_info(&self) -> &ClusterInfo {
		&self.cluster
	}

	#[instrument(skip(self))]
	async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError> {
		let mut lp = ListParams::default();
		if !label_selector.is_empty() {
			lp = lp.labels(label_selector);
		}
		let pod_list = self.pods(namespace).list(&lp).await?;
		Ok(pod_list.items)
	}

	async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod, K8sError> {
		match self.pods(namespace).get(name).await {
			Ok(pod) => Ok(pod),
			Err(e) if is_status(&e, 404) => Err(K8sError::PodNotFound { name: name.into() }),
			Err(e) => Err(e.into()),
		}
	}

	async fn get_deployment(&self, name: &str, namespace: &str) -> Result<Deployment, K8sError> {
		let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
		match deployments.get(name).await {
			Ok(deployment) => Ok(deployment),
			Err(e) if is_status(&e, 404) => Err(K8sError::DeploymentNotFound { name: name.into() }),
			Err(e) => Err(e.into()),
		}
	}

	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError> {
		let namespaces: Api<Namespace> = Api::all(self.client.clone());
		match namespaces.get(name).await {
			Ok(ns) => Ok(ns),
			Err(e) if is_status(&e, 404) => Err(K8sError::NamespaceNotFound { name: name.into() }),
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	async fn create_namespace(&self, name: &str) -> Result<Namespace, K8sError> {
		let namespaces: Api<Namespace> = Api::all(self.client.clone());
		let ns = Namespace {
			metadata: ObjectMeta {
				name: Some(name.to_string()),
				..Default::default()
			},
			..Default::default()
		};
		match namespaces.create(&PostParams::default(), &ns).await {
			Ok(ns) => Ok(ns),
			Err(e) if is_status(&e, 409) => Err(K8sError::AlreadyExists {
				kind: "Namespace",
				name: name.into(),
			}),
			Err(e) => Err(e.into()),
		}
	}

	async fn get_cluster_role_binding(&self, name: &str) -> Result<ClusterRoleBinding, K8sError> {
		let bindings: Api<ClusterRoleBinding> = Api::all(self.client.clone());
		match bindings.get(name).await {
			Ok(binding) => Ok(binding),
			Err(e) if is_status(&e, 404) => {
				Err(K8sError::ClusterRoleBindingNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self, binding), fields(name = ?binding.metadata.name))]
	async fn create_cluster_role_binding(
		&self,
		binding: ClusterRoleBinding,
	) -> Result<ClusterRoleBinding, K8sError> {
		let bindings: Api<ClusterRoleBinding> = Api::all(self.client.clone());
		match bindings.create(&PostParams::default(), &binding).await {
			Ok(created) => Ok(created),
			Err(e) if is_status(&e, 409) => Err(K8sError::AlreadyExists {
				kind: "ClusterRoleBinding",
				name: binding.metadata.name.unwrap_or_default(),
			}),
			Err(e) => Err(e.into()),
		}
	}

	async fn get_service_account(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<ServiceAccount, K8sError> {
		let accounts: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
		match accounts.get(name).await {
			Ok(account) => Ok(account),
			Err(e) if is_status(&e, 404) => {
				Err(K8sError::ServiceAccountNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self, account), fields(name = ?account.metadata.name))]
	async fn replace_service_account(
		&self,
		namespace: &str,
		account: ServiceAccount,
	) -> Result<ServiceAccount, K8sError> {
		let accounts: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
		let name = account.metadata.name.clone().unwrap_or_default();
		let replaced = accounts
			.replace(&name, &PostParams::default(), &account)
			.await?;
		Ok(replaced)
	}

	#[instrument(skip(self))]
	async fn exec_attach(
		&self,
		name: &str,
		namespace: &str,
		container: &str,
		opts: AttachOptions,
	) -> Result<AttachedProcess, K8sError> {
		// The API server rejects stderr on a TTY; it is merged into stdout there.
		let ap = AttachParams {
			container: Some(container.to_string()),
			stdin: opts.stdin,
			stdout: true,
			stderr: !opts.tty,
			tty: opts.tty,
			..Default::default()
		};

		let mut attached = self.pods(namespace).attach(name, &ap).await.map_err(|e| match e {
			kube::Error::Api(ref err) if err.code == 404 => K8sError::PodNotFound { name: name.into() },
			_ => K8sError::AttachError {
				message: e.to_string(),
			},
		})?;

		let stdin = attached
			.stdin()
			.map(|w| Box::pin(w) as std::pin::Pin<Box<dyn AsyncWrite + Send>>);
		let stdout = attached.stdout().ok_or_else(|| K8sError::AttachError {
			message: "stdout not available".into(),
		})?;
		let stderr = attached
			.stderr()
			.map(|r| Box::pin(r) as std::pin::Pin<Box<dyn AsyncRead + Send>>);
		let status = attached.take_status();

		let transport = TransportHandle::new();
		let closed = transport.clone();
		let completion = Box::pin(async move {
			let outcome = match status {
				Some(status) => tokio::select! {
					_ = closed.closed() => None,
					status = status => status,
				},
				None => None,
			};

			if closed.is_closed() {
				attached.abort();
				return Ok(());
			}

			attached.join().await.map_err(|e| K8sError::AttachError {
				message: e.to_string(),
			})?;

			match outcome {
				Some(status) if status.status.as_deref() == Some("Failure") => {
					Err(K8sError::AttachError {
						message: status
							.message
							.unwrap_or_else(|| "attach ended with failure status".to_string()),
					})
				}
				_ => Ok(()),
			}
		});

		Ok(AttachedProcess {
			stdin,
			stdout: Box::pin(stdout),
			stderr,
			completion,
			transport,
		})
	}

	#[instrument(skip(self))]
	async fn open_port_forward(
		&self,
		name: &str,
		namespace: &str,
		port: u16,
	) -> Result<ForwardTunnel, K8sError> {
		let mut forwarder = self
			.pods(namespace)
			.portforward(name, &[port])
			.await
			.map_err(|e| match e {
				kube::Error::Api(ref err) if err.code == 404 => {
					K8sError::PodNotFound { name: name.into() }
				}
				_ => K8sError::PortForwardError {
					message: e.to_string(),
				},
			})?;

		let stream = forwarder
			.take_stream(port)
			.ok_or_else(|| K8sError::PortForwardError {
				message: format!("no stream for port {port}"),
			})?;

		let completion = Box::pin(async move {
			forwarder
				.join()
				.await
				.map_err(|e| K8sError::PortForwardError {
					message: e.to_string(),
				})
		});

		Ok(ForwardTunnel {
			stream: Box::new(stream),
			completion,
		})
	}
}
