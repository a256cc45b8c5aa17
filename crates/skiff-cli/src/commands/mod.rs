// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

pub mod attach;
pub mod forward;
pub mod pods;
pub mod status;
pub mod target;

pub use attach::{handle_attach, AttachArgs};
pub use forward::{handle_forward, ForwardArgs};
pub use pods::{handle_pods, PodsArgs};
pub use status::{handle_status, StatusArgs};
pub use target::TargetArgs;
