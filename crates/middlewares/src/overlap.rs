// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Overlap prevention: skip a firing while a previous one is still running.

use async_trait::async_trait;
use hm_core::{Context, JobError, Middleware};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapConfig {
    pub no_overlap: bool,
}

impl OverlapConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn build(&self) -> Option<Arc<dyn Middleware>> {
        if self.is_empty() {
            None
        } else {
            Some(Arc::new(Overlap::new()))
        }
    }
}

/// Counts in-flight executions of one scheduler registration.
///
/// The counter belongs to the middleware instance, so replacing a job's
/// registration starts a fresh count; the execution that is mid-flight under
/// the old registration keeps its own chain and counter.
pub struct Overlap {
    active: AtomicUsize,
}

impl Overlap {
    pub fn new() -> Self {
        Self { active: AtomicUsize::new(0) }
    }
}

impl Default for Overlap {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for Overlap {
    async fn run(&self, ctx: &mut Context) -> Result<(), JobError> {
        let prior = self.active.fetch_add(1, Ordering::SeqCst);
        if prior > 0 {
            self.active.fetch_sub(1, Ordering::SeqCst);
            info!(job = %ctx.job.name(), "previous execution still running, skipping");
            ctx.stop(Some(&JobError::Skipped));
            return ctx.next().await;
        }
        let result = ctx.next().await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
#[path = "overlap_tests.rs"]
mod tests;
