// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-execution persistence: appends a human-readable record, and
//! optionally a JSON context object, under a configured folder.

use async_trait::async_trait;
use hm_core::{Context, JobError, Middleware};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveConfig {
    /// Directory the artifacts are written to.
    pub folder: String,
    /// Persist the log record only when the execution failed.
    pub only_on_error: bool,
    /// Also append a JSON object with the job definition and the record.
    pub exec_context: bool,
}

impl SaveConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn build(&self) -> Option<Arc<dyn Middleware>> {
        if self.is_empty() {
            None
        } else {
            Some(Arc::new(Save { config: self.clone() }))
        }
    }
}

pub struct Save {
    config: SaveConfig,
}

#[async_trait]
impl Middleware for Save {
    async fn run(&self, ctx: &mut Context) -> Result<(), JobError> {
        let result = ctx.next().await;
        ctx.stop(result.as_ref().err());

        if ctx.execution.failed || !self.config.only_on_error {
            if let Err(e) = append(&self.log_path(ctx), log_record(ctx)).await {
                error!(job = %ctx.job.name(), error = %e, "could not persist execution log");
            }
        }
        if self.config.exec_context {
            if let Err(e) = append(&self.context_path(ctx), context_record(ctx)).await {
                error!(job = %ctx.job.name(), error = %e, "could not persist execution context");
            }
        }

        result
    }

    fn continue_on_stop(&self) -> bool {
        true
    }
}

impl Save {
    fn log_path(&self, ctx: &Context) -> PathBuf {
        artifact_path(&self.config.folder, ctx, "log")
    }

    fn context_path(&self, ctx: &Context) -> PathBuf {
        artifact_path(&self.config.folder, ctx, "json")
    }
}

/// `<folder>/<job>_<yyyymmdd>.<ext>`: one artifact per job per day.
fn artifact_path(folder: &str, ctx: &Context, ext: &str) -> PathBuf {
    let day = ctx.execution.date.format("%Y%m%d");
    Path::new(folder).join(format!("{}_{}.{}", ctx.job.name(), day, ext))
}

fn log_record(ctx: &Context) -> String {
    let e = &ctx.execution;
    let mut text = format!(
        "{} [Job \"{}\" ({})] Started - {}\n",
        e.date.format("%Y-%m-%d %H:%M:%S%.3f"),
        ctx.job.name(),
        e.id,
        ctx.job.command(),
    );
    text.push_str(&format!("Output: {}", e.stdout_str()));
    text.push_str(&format!(
        "\nFinished in {}ms, failed: {}, skipped: {}, error: {}\n\n",
        e.duration.as_millis(),
        e.failed,
        e.skipped,
        e.error.as_deref().unwrap_or("none"),
    ));
    text
}

fn context_record(ctx: &Context) -> String {
    let e = &ctx.execution;
    let record = json!({
        "job": {
            "name": ctx.job.name(),
            "kind": ctx.job.kind().as_str(),
            "schedule": ctx.job.schedule(),
            "command": ctx.job.command(),
        },
        "execution": {
            "id": e.id,
            "date": e.date.to_rfc3339(),
            "duration_ms": e.duration.as_millis() as u64,
            "failed": e.failed,
            "skipped": e.skipped,
            "error": e.error,
            "stdout": e.stdout_str(),
            "stderr": e.stderr_str(),
        },
    });
    format!("{:#}\n\n", record)
}

async fn append(path: &Path, text: String) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
#[path = "save_tests.rs"]
mod tests;
