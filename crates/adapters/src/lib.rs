// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hm-adapters: container runtime client for the Helmsman job daemon.
//!
//! The runtime is driven through the `docker` CLI over `tokio::process`
//! rather than a socket API client; the daemon needs a handful of verbs
//! (exec, run, one-shot service tasks, label inspection) and the CLI keeps
//! the surface small and debuggable.

pub mod command;
pub mod docker;

pub use command::{split_command, SplitError};
pub use docker::{AdapterError, DockerClient, ServiceOutcome};
