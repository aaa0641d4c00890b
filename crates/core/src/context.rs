// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution context: walks the middleware chain and runs the job body.

use crate::execution::Execution;
use crate::job::{Job, JobError};
use crate::middleware::MiddlewareChain;
use std::sync::Arc;

/// State threaded through one firing of a job.
///
/// The chain is the scheduler-global middlewares followed by the job's own;
/// the job body runs once the chain is exhausted. Stopping the context skips
/// the body and any remaining middleware that does not opt into
/// `continue_on_stop`.
pub struct Context {
    pub job: Arc<dyn Job>,
    pub execution: Execution,
    chain: MiddlewareChain,
    position: usize,
    stopped: bool,
}

impl Context {
    pub fn new(job: Arc<dyn Job>, chain: MiddlewareChain) -> Self {
        Self { job, execution: Execution::new(), chain, position: 0, stopped: false }
    }

    /// Hand control to the next runnable element of the chain.
    ///
    /// Middlewares that do not continue on stop are skipped once the context
    /// is stopped; the job body never runs on a stopped context.
    pub async fn next(&mut self) -> Result<(), JobError> {
        while self.position < self.chain.len() {
            let mw = Arc::clone(&self.chain[self.position]);
            self.position += 1;
            if self.stopped && !mw.continue_on_stop() {
                continue;
            }
            return mw.run(self).await;
        }
        if self.stopped {
            return Ok(());
        }
        let job = Arc::clone(&self.job);
        job.run(self).await
    }

    /// Stop the execution and finalize its record.
    ///
    /// Idempotent for the record: only the first stop decides the outcome.
    pub fn stop(&mut self, err: Option<&JobError>) {
        self.stopped = true;
        self.execution.stop(err);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
