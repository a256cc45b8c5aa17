// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::net::IpAddr;
use std::sync::OnceLock;

use ipnet::IpNet;

const PRIVATE_RANGES: &[&str] = &[
	"127.0.0.0/8",
	"10.0.0.0/8",
	"172.16.0.0/12",
	"192.168.0.0/16",
	"::1/128",
	"fe80::/10",
	"fc00::/7",
];

fn private_networks() -> &'static [IpNet] {
	static NETWORKS: OnceLock<Vec<IpNet>> = OnceLock::new();
	NETWORKS.get_or_init(|| {
		PRIVATE_RANGES
			.iter()
			.filter_map(|cidr| cidr.parse().ok())
			.collect()
	})
}

/// Whether `ip` is loopback, link-local or in a private range.
pub fn is_private_ip(ip: IpAddr) -> bool {
	private_networks().iter().any(|net| net.contains(&ip))
}
