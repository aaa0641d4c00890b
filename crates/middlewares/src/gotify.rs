// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gotify sink: POSTs execution reports to a Gotify server.

use crate::report;
use async_trait::async_trait;
use hm_core::{Context, JobError, Middleware};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GotifyConfig {
    /// Base URL of the Gotify server.
    pub url: String,
    /// Application token.
    pub token: String,
    pub only_on_error: bool,
    /// Message priority (Gotify default range 0-10).
    pub priority: u8,
}

impl GotifyConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn build(&self) -> Option<Arc<dyn Middleware>> {
        if self.is_empty() {
            None
        } else {
            Some(Arc::new(Gotify { config: self.clone(), client: http_client() }))
        }
    }
}

pub struct Gotify {
    config: GotifyConfig,
    client: reqwest::Client,
}

#[async_trait]
impl Middleware for Gotify {
    async fn run(&self, ctx: &mut Context) -> Result<(), JobError> {
        let result = ctx.next().await;
        ctx.stop(result.as_ref().err());

        if report::should_report(self.config.only_on_error, &ctx.execution) {
            let url = message_url(&self.config.url);
            let payload = payload(&self.config, ctx);
            let send = self
                .client
                .post(&url)
                .header("X-Gotify-Key", &self.config.token)
                .json(&payload)
                .send()
                .await;
            if let Err(e) = send {
                error!(job = %ctx.job.name(), error = %e, "gotify notification failed");
            }
        }

        result
    }

    fn continue_on_stop(&self) -> bool {
        true
    }
}

pub fn message_url(base: &str) -> String {
    format!("{}/message", base.trim_end_matches('/'))
}

pub fn payload(config: &GotifyConfig, ctx: &Context) -> serde_json::Value {
    json!({
        "title": report::subject(ctx.job.as_ref(), &ctx.execution),
        "message": report::body(ctx.job.as_ref(), &ctx.execution),
        "priority": config.priority,
    })
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "gotify_tests.rs"]
mod tests;
