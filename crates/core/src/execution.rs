// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record of a single job firing.

use crate::job::JobError;
use chrono::{DateTime, Utc};
use nanoid::nanoid;
use std::time::{Duration, Instant};

/// One execution of a job: identity, timing, captured output, and outcome.
///
/// Created by the scheduler when a firing starts and threaded through the
/// middleware chain. `stop` is first-writer-wins so the innermost reporter
/// fixes the outcome and later observers see a stable record.
#[derive(Debug)]
pub struct Execution {
    /// Short random identifier, unique per firing.
    pub id: String,
    /// Wall-clock start time.
    pub date: DateTime<Utc>,
    /// Captured standard output of the job body.
    pub stdout: Vec<u8>,
    /// Captured standard error of the job body.
    pub stderr: Vec<u8>,
    /// Total run time, set when the execution stops.
    pub duration: Duration,
    pub failed: bool,
    pub skipped: bool,
    /// Error text when `failed` is set.
    pub error: Option<String>,
    started: Instant,
    finished: bool,
}

impl Execution {
    pub fn new() -> Self {
        Self {
            id: nanoid!(12),
            date: Utc::now(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            duration: Duration::ZERO,
            failed: false,
            skipped: false,
            error: None,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Finalize the record. Only the first call has any effect.
    pub fn stop(&mut self, err: Option<&JobError>) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.duration = self.started.elapsed();
        match err {
            Some(JobError::Skipped) => self.skipped = true,
            Some(e) => {
                self.failed = true;
                self.error = Some(e.to_string());
            }
            None => {}
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl Default for Execution {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
