// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use skiff_k8s::{K8sClient, Pod};
use tracing::debug;

use crate::error::TargetError;

/// Derive the label selector that matches the pods of a deployment.
///
/// Match labels are joined as `key=value` pairs in key order.
pub async fn pod_selector_for_deployment(
	client: &dyn K8sClient,
	namespace: &str,
	name: &str,
) -> Result<String, TargetError> {
	let deployment = client.get_deployment(name, namespace).await?;

	let labels = deployment
		.spec
		.as_ref()
		.and_then(|spec| spec.selector.match_labels.as_ref())
		.filter(|labels| !labels.is_empty())
		.ok_or_else(|| {
			TargetError::configuration(format!("No matchLabels defined for deployment {name}"))
		})?;

	let selector = labels
		.iter()
		.map(|(key, value)| format!("{key}={value}"))
		.collect::<Vec<_>>()
		.join(",");

	debug!(deployment = %name, selector = %selector, "Derived pod selector");
	Ok(selector)
}

/// List the pods currently selected by a deployment.
pub async fn pods_for_deployment(
	client: &dyn K8sClient,
	namespace: &str,
	name: &str,
) -> Result<Vec<Pod>, TargetError> {
	let selector = pod_selector_for_deployment(client, namespace, name).await?;
	Ok(client.list_pods(namespace, &selector).await?)
}
