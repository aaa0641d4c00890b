// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slack webhook sink.

use crate::report;
use async_trait::async_trait;
use hm_core::{Context, JobError, Middleware};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlackConfig {
    pub webhook: String,
    pub only_on_error: bool,
}

impl SlackConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn build(&self) -> Option<Arc<dyn Middleware>> {
        if self.is_empty() {
            None
        } else {
            Some(Arc::new(Slack { config: self.clone(), client: http_client() }))
        }
    }
}

pub struct Slack {
    config: SlackConfig,
    client: reqwest::Client,
}

#[async_trait]
impl Middleware for Slack {
    async fn run(&self, ctx: &mut Context) -> Result<(), JobError> {
        let result = ctx.next().await;
        ctx.stop(result.as_ref().err());

        if report::should_report(self.config.only_on_error, &ctx.execution) {
            let payload = payload(ctx);
            if let Err(e) = self.client.post(&self.config.webhook).json(&payload).send().await {
                error!(job = %ctx.job.name(), error = %e, "slack notification failed");
            }
        }

        result
    }

    fn continue_on_stop(&self) -> bool {
        true
    }
}

/// Webhook payload: a color-coded attachment summarizing the execution.
pub fn payload(ctx: &Context) -> serde_json::Value {
    let e = &ctx.execution;
    let color = if e.failed { "#F35A00" } else { "#7CD197" };
    json!({
        "attachments": [{
            "color": color,
            "title": report::subject(ctx.job.as_ref(), e),
            "text": format!("Command: `{}`", ctx.job.command()),
            "ts": e.date.timestamp(),
        }],
    })
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "slack_tests.rs"]
mod tests;
