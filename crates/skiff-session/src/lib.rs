// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Interactive sessions against a resolved container.
//!
//! Diagnostics about the session itself (connections, stream errors) are
//! emitted on [`SESSION_LOG_TARGET`] so the binary can route them to the
//! session log instead of the terminal the session is using.

pub mod attach;
pub mod error;
pub mod port_forward;
pub mod ports;

/// Tracing target for session diagnostics.
pub const SESSION_LOG_TARGET: &str = "skiff::session";

pub use attach::{attach, SessionIo};
pub use error::SessionError;
pub use port_forward::{port_forward, DEFAULT_FORWARD_ADDRESS};
pub use ports::PortMapping;
