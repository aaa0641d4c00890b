// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-execution interceptor contract.

use crate::context::Context;
use crate::job::JobError;
use async_trait::async_trait;
use std::sync::Arc;

/// Ordered list of middlewares wrapping a job run.
pub type MiddlewareChain = Vec<Arc<dyn Middleware>>;

/// A per-execution interceptor.
///
/// Middlewares form a chain around the job body. Each implementation calls
/// `ctx.next().await` to hand control to the rest of the chain and may
/// observe or finalize `ctx.execution` before and after.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn run(&self, ctx: &mut Context) -> Result<(), JobError>;

    /// Whether this middleware still runs once the context has been stopped.
    ///
    /// Reporting middlewares return `true` so skipped and failed executions
    /// are persisted and notified like any other.
    fn continue_on_stop(&self) -> bool {
        false
    }
}
