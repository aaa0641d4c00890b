// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared formatting for notification sinks.

use hm_core::{Execution, Job};

/// One-line summary: `Job "backup" (x1b2c3) finished in 1240ms`.
pub fn subject(job: &dyn Job, execution: &Execution) -> String {
    let outcome = if execution.skipped {
        "skipped".to_string()
    } else if execution.failed {
        format!("failed: {}", execution.error.as_deref().unwrap_or("unknown error"))
    } else {
        format!("finished in {}ms", execution.duration.as_millis())
    };
    format!("Job \"{}\" ({}) {}", job.name(), execution.id, outcome)
}

/// Multi-line body with the command and captured output.
pub fn body(job: &dyn Job, execution: &Execution) -> String {
    let mut text = format!(
        "{}\nKind: {}\nCommand: {}\nStarted: {}\n",
        subject(job, execution),
        job.kind(),
        job.command(),
        execution.date.format("%Y-%m-%d %H:%M:%S%.3f"),
    );
    let stdout = execution.stdout_str();
    if !stdout.is_empty() {
        text.push_str("\nOutput:\n");
        text.push_str(&stdout);
    }
    let stderr = execution.stderr_str();
    if !stderr.is_empty() {
        text.push_str("\nErrors:\n");
        text.push_str(&stderr);
    }
    text
}

/// Whether a sink configured with `only_on_error` should report this
/// execution.
pub fn should_report(only_on_error: bool, execution: &Execution) -> bool {
    !only_on_error || execution.failed
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
