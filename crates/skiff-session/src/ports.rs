// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

/// A local port forwarded to a port in the pod.
///
/// Local port `0` lets the operating system pick a free port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortMapping {
	pub local: u16,
	pub remote: u16,
}

impl PortMapping {
	pub fn new(local: u16, remote: u16) -> Self {
		Self { local, remote }
	}

	/// Parse `LOCAL:REMOTE`, `PORT` (same port on both ends) or `:REMOTE`
	/// (any free local port).
	pub fn parse(spec: &str) -> Result<Self, SessionError> {
		let invalid = |reason: &str| SessionError::InvalidPortSpec {
			spec: spec.to_string(),
			reason: reason.to_string(),
		};
		let port = |value: &str| -> Result<u16, SessionError> {
			value
				.trim()
				.parse::<u16>()
				.map_err(|_| invalid("ports must be numbers between 0 and 65535"))
		};

		let mapping = match spec.split_once(':') {
			Some(("", remote)) => Self::new(0, port(remote)?),
			Some((local, remote)) => Self::new(port(local)?, port(remote)?),
			None => {
				let p = port(spec)?;
				Self::new(p, p)
			}
		};

		if mapping.remote == 0 {
			return Err(invalid("remote port must not be 0"));
		}
		Ok(mapping)
	}
}

impl FromStr for PortMapping {
	type Err = SessionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for PortMapping {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.local, self.remote)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_pair() {
		assert_eq!(PortMapping::parse("8080:80").unwrap(), PortMapping::new(8080, 80));
	}

	#[test]
	fn test_parse_single_port() {
		assert_eq!(PortMapping::parse("5432").unwrap(), PortMapping::new(5432, 5432));
	}

	#[test]
	fn test_parse_any_local_port() {
		assert_eq!(PortMapping::parse(":3000").unwrap(), PortMapping::new(0, 3000));
	}

	#[test]
	fn test_parse_rejects_garbage() {
		for spec in ["", "http", "8080:", "70000:80", "1:2:3", "0", "8080:0"] {
			assert!(
				matches!(PortMapping::parse(spec), Err(SessionError::InvalidPortSpec { .. })),
				"{spec}"
			);
		}
	}

	#[test]
	fn test_from_str() {
		let mapping: PortMapping = "9000:90".parse().unwrap();
		assert_eq!(mapping.to_string(), "9000:90");
	}
}

#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn display_parses_back(local in any::<u16>(), remote in 1u16..) {
			let mapping = PortMapping::new(local, remote);
			prop_assert_eq!(PortMapping::parse(&mapping.to_string()).unwrap(), mapping);
		}

		#[test]
		fn parse_never_panics(spec in "\\PC*") {
			let _ = PortMapping::parse(&spec);
		}
	}
}
