// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles shared across crates.

use crate::context::Context;
use crate::job::{Job, JobError, JobKind};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::scheduler::{SchedulerError, SchedulerHandle};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Configurable job for driving contexts and schedulers in tests.
pub struct StubJob {
    pub name: String,
    pub kind: JobKind,
    pub schedule: String,
    pub command: String,
    pub middlewares: MiddlewareChain,
    /// Written to the execution's stdout when the body runs.
    pub output: String,
    /// Body sleeps this long before finishing.
    pub delay: Duration,
    /// Exit code the body fails with, if any.
    pub fail_code: Option<i32>,
}

impl StubJob {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: JobKind::Local,
            schedule: "@every 1m".to_string(),
            command: "true".to_string(),
            middlewares: Vec::new(),
            output: String::new(),
            delay: Duration::ZERO,
            fail_code: None,
        }
    }

    pub fn with_middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(mw);
        self
    }

    pub fn failing(mut self, code: i32) -> Self {
        self.fail_code = Some(code);
        self
    }

    /// Build a context over this job using its own middleware chain.
    pub fn context(self: &Arc<Self>) -> Context {
        let job: Arc<dyn Job> = Arc::clone(self) as Arc<dyn Job>;
        let chain = self.middlewares.clone();
        Context::new(job, chain)
    }
}

#[async_trait]
impl Job for StubJob {
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> JobKind {
        self.kind
    }
    fn schedule(&self) -> &str {
        &self.schedule
    }
    fn command(&self) -> &str {
        &self.command
    }
    fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }
    async fn run(&self, ctx: &mut Context) -> Result<(), JobError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        ctx.execution.stdout.extend_from_slice(self.output.as_bytes());
        match self.fail_code {
            Some(code) => Err(JobError::NonZeroExit(code)),
            None => Ok(()),
        }
    }
}

/// One recorded scheduler mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerOp {
    InstallGlobal { middlewares: usize },
    Add { kind: JobKind, name: String },
    Remove { kind: JobKind, name: String },
}

struct FakeSchedulerState {
    ops: Vec<SchedulerOp>,
    registered: HashSet<(JobKind, String)>,
    reject_adds: HashSet<(JobKind, String)>,
}

/// Recording scheduler fake.
///
/// Tracks the registered set with the same duplicate/not-found semantics as
/// the real scheduler and records every mutation for assertions. Individual
/// adds can be made to fail with `reject_add`.
#[derive(Clone)]
pub struct FakeScheduler {
    inner: Arc<Mutex<FakeSchedulerState>>,
}

impl Default for FakeScheduler {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSchedulerState {
                ops: Vec::new(),
                registered: HashSet::new(),
                reject_adds: HashSet::new(),
            })),
        }
    }
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded mutations, in order.
    pub fn ops(&self) -> Vec<SchedulerOp> {
        self.inner.lock().ops.clone()
    }

    /// Drain recorded mutations, leaving the registered set intact.
    pub fn take_ops(&self) -> Vec<SchedulerOp> {
        std::mem::take(&mut self.inner.lock().ops)
    }

    /// Snapshot of currently registered `(kind, name)` pairs.
    pub fn registered(&self) -> Vec<(JobKind, String)> {
        let mut v: Vec<_> = self.inner.lock().registered.iter().cloned().collect();
        v.sort();
        v
    }

    pub fn is_registered(&self, kind: JobKind, name: &str) -> bool {
        self.inner.lock().registered.contains(&(kind, name.to_string()))
    }

    /// Make subsequent `add_job` calls for this identity fail.
    pub fn reject_add(&self, kind: JobKind, name: &str) {
        self.inner.lock().reject_adds.insert((kind, name.to_string()));
    }
}

impl SchedulerHandle for FakeScheduler {
    fn install_global(&self, chain: MiddlewareChain) {
        self.inner.lock().ops.push(SchedulerOp::InstallGlobal { middlewares: chain.len() });
    }

    fn add_job(&self, job: Arc<dyn Job>) -> Result<(), SchedulerError> {
        let key = (job.kind(), job.name().to_string());
        let mut state = self.inner.lock();
        if state.reject_adds.contains(&key) {
            return Err(SchedulerError::Duplicate { kind: key.0, name: key.1 });
        }
        if !state.registered.insert(key.clone()) {
            return Err(SchedulerError::Duplicate { kind: key.0, name: key.1 });
        }
        state.ops.push(SchedulerOp::Add { kind: key.0, name: key.1 });
        Ok(())
    }

    fn remove_job(&self, kind: JobKind, name: &str) -> Result<(), SchedulerError> {
        let key = (kind, name.to_string());
        let mut state = self.inner.lock();
        if !state.registered.remove(&key) {
            return Err(SchedulerError::NotFound { kind, name: name.to_string() });
        }
        state.ops.push(SchedulerOp::Remove { kind, name: name.to_string() });
        Ok(())
    }
}
