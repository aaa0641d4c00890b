// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The live scheduler: one ticker task per registered job.
//!
//! Each firing runs as its own task, so removing a job cancels future
//! firings while an in-flight execution completes under the chain it
//! started with.

use crate::context::Context;
use crate::job::{Job, JobKind};
use crate::middleware::MiddlewareChain;
use crate::schedule::{Schedule, ScheduleError};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("job {kind} \"{name}\" is already registered")]
    Duplicate { kind: JobKind, name: String },

    #[error("job {kind} \"{name}\" is not registered")]
    NotFound { kind: JobKind, name: String },

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// The contract the reconciler uses to mutate the running scheduler.
///
/// `remove_job` followed by `add_job` with the same `(kind, name)` is safe:
/// removal cancels future firings synchronously, and each firing is an
/// independent task that runs to completion.
pub trait SchedulerHandle: Send + Sync {
    /// Replace the scheduler-global middleware chain. Idempotent.
    fn install_global(&self, chain: MiddlewareChain);

    /// Register a job and start scheduling it on its timing spec.
    fn add_job(&self, job: Arc<dyn Job>) -> Result<(), SchedulerError>;

    /// Cancel future firings of a registered job.
    fn remove_job(&self, kind: JobKind, name: &str) -> Result<(), SchedulerError>;
}

struct Inner {
    global: Mutex<Arc<MiddlewareChain>>,
    tickers: Mutex<HashMap<(JobKind, String), JoinHandle<()>>>,
    in_flight: Arc<AtomicUsize>,
}

/// Live scheduler backed by tokio tasks.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                global: Mutex::new(Arc::new(Vec::new())),
                tickers: Mutex::new(HashMap::new()),
                in_flight: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Number of registered jobs.
    pub fn job_count(&self) -> usize {
        self.inner.tickers.lock().len()
    }

    /// Cancel all tickers and wait (bounded) for in-flight executions.
    pub async fn shutdown(&self, drain_timeout: Duration) {
        let tickers: Vec<_> = {
            let mut map = self.inner.tickers.lock();
            map.drain().collect()
        };
        for ((kind, name), handle) in tickers {
            debug!(job = %name, %kind, "cancelling ticker");
            handle.abort();
        }

        let deadline = tokio::time::Instant::now() + drain_timeout;
        while self.inner.in_flight.load(Ordering::SeqCst) > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    remaining = self.inner.in_flight.load(Ordering::SeqCst),
                    "shutdown drain timed out with executions still running"
                );
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerHandle for Scheduler {
    fn install_global(&self, chain: MiddlewareChain) {
        debug!(middlewares = chain.len(), "installing scheduler-global middleware chain");
        *self.inner.global.lock() = Arc::new(chain);
    }

    fn add_job(&self, job: Arc<dyn Job>) -> Result<(), SchedulerError> {
        let schedule = Schedule::parse(job.schedule())?;
        let key = (job.kind(), job.name().to_string());

        let mut tickers = self.inner.tickers.lock();
        if tickers.contains_key(&key) {
            return Err(SchedulerError::Duplicate { kind: key.0, name: key.1 });
        }

        info!(job = %job.name(), kind = %job.kind(), schedule = %job.schedule(), "job added");
        let handle = spawn_ticker(Arc::clone(&self.inner), job, schedule);
        tickers.insert(key, handle);
        Ok(())
    }

    fn remove_job(&self, kind: JobKind, name: &str) -> Result<(), SchedulerError> {
        let handle = self
            .inner
            .tickers
            .lock()
            .remove(&(kind, name.to_string()))
            .ok_or_else(|| SchedulerError::NotFound { kind, name: name.to_string() })?;
        handle.abort();
        info!(job = %name, %kind, "job removed");
        Ok(())
    }
}

fn spawn_ticker(inner: Arc<Inner>, job: Arc<dyn Job>, schedule: Schedule) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some(delay) = schedule.next_delay(Utc::now()) else {
                debug!(job = %job.name(), "schedule has no future firings, ticker exiting");
                return;
            };
            tokio::time::sleep(delay).await;

            let chain = Arc::clone(&*inner.global.lock());
            let job = Arc::clone(&job);
            let in_flight = Arc::clone(&inner.in_flight);
            in_flight.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                run_execution(job, &chain).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
        }
    })
}

/// Run one firing through the global + per-job middleware chain.
async fn run_execution(job: Arc<dyn Job>, global: &MiddlewareChain) {
    let mut chain = global.clone();
    chain.extend(job.middlewares().iter().cloned());

    let mut ctx = Context::new(Arc::clone(&job), chain);
    let execution_id = ctx.execution.id.clone();
    debug!(job = %job.name(), kind = %job.kind(), execution = %execution_id, "execution started");

    let result = ctx.next().await;
    ctx.stop(result.as_ref().err());

    let e = &ctx.execution;
    let duration_ms = e.duration.as_millis() as u64;
    if e.skipped {
        info!(job = %job.name(), execution = %execution_id, "execution skipped");
    } else if e.failed {
        warn!(
            job = %job.name(),
            execution = %execution_id,
            duration_ms,
            error = e.error.as_deref().unwrap_or("unknown"),
            "execution failed"
        );
    } else {
        info!(job = %job.name(), execution = %execution_id, duration_ms, "execution finished");
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
