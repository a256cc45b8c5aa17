// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! K8s client abstraction for skiff.
//!
//! This crate provides:
//! - A trait-based K8s client abstraction for testability
//! - Production implementation using the kube crate
//! - An in-memory mock client for tests
//! - Stream types for attach and port-forward sessions

mod client;
mod error;
mod kube_client;
mod mock;
mod types;

pub use client::K8sClient;
pub use error::{K8sError, K8sResult};
pub use kube_client::{KubeClient, KubeOptions};
pub use mock::{AttachBehavior, AttachCall, MockK8sClient};
pub use types::{
	AttachOptions, AttachedProcess, ClusterInfo, ClusterRoleBinding, CompletionFuture, Container,
	ContainerState, ContainerStateRunning, ContainerStateTerminated, ContainerStateWaiting,
	ContainerStatus, Deployment, DeploymentSpec, ForwardTunnel, LocalObjectReference, Namespace,
	Pod, PodSpec, PodStatus, RoleRef, ServiceAccount, Subject, TransportHandle, TunnelIo,
};
