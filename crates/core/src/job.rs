// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job contract: the four job kinds and the trait the scheduler executes.

use crate::context::Context;
use crate::middleware::Middleware;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a job body or by a middleware wrapping it.
#[derive(Debug, Error)]
pub enum JobError {
    /// The execution was skipped before the body ran (overlap prevention).
    #[error("execution skipped")]
    Skipped,

    #[error("failed to start process: {0}")]
    Spawn(String),

    #[error("exited with code {0}")]
    NonZeroExit(i32),

    #[error("terminated by signal")]
    Signalled,

    #[error("runtime client error: {0}")]
    Runtime(String),
}

/// The four disjoint job kinds.
///
/// Kinds differ only in how the body of an execution is carried out; the
/// registry and scheduler treat them interchangeably, except that `Local`
/// never needs a runtime client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Run a command inside an existing container.
    Exec,
    /// Launch a new ephemeral container and run a command in it.
    Run,
    /// Launch a one-shot runtime service task.
    Service,
    /// Run a command on the daemon's host.
    Local,
}

impl JobKind {
    /// Fixed processing order for reconciliation and diagnostics.
    pub const ALL: [JobKind; 4] = [JobKind::Exec, JobKind::Run, JobKind::Service, JobKind::Local];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Exec => "exec",
            JobKind::Run => "run",
            JobKind::Service => "service",
            JobKind::Local => "local",
        }
    }

    /// Whether executing this kind requires a runtime client.
    pub fn needs_runtime(&self) -> bool {
        !matches!(self, JobKind::Local)
    }
}

crate::simple_display! {
    JobKind {
        Exec => "exec",
        Run => "run",
        Service => "service",
        Local => "local",
    }
}

/// A schedulable job.
///
/// Implementations carry everything needed to execute one firing: the body
/// itself plus the per-job middleware chain the scheduler wraps around it.
#[async_trait]
pub trait Job: Send + Sync {
    /// Job name, unique within its kind.
    fn name(&self) -> &str;

    fn kind(&self) -> JobKind;

    /// Cron-style timing spec, e.g. `@every 1m` or `0 0 * * * *`.
    fn schedule(&self) -> &str;

    /// The configured command line, for logs and reporting.
    fn command(&self) -> &str;

    /// Per-job middlewares, appended after the scheduler-global chain.
    fn middlewares(&self) -> &[Arc<dyn Middleware>];

    /// Execute one firing, writing captured output into `ctx.execution`.
    async fn run(&self, ctx: &mut Context) -> Result<(), JobError>;
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
