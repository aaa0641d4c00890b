// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timing spec parsing: `@every` intervals and cron expressions.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("empty schedule")]
    Empty,

    #[error("invalid interval '{spec}': {reason}")]
    Interval { spec: String, reason: String },

    #[error("invalid cron expression '{spec}': {reason}")]
    Cron { spec: String, reason: String },
}

/// A parsed timing spec.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Fixed interval between firings (`@every 90s`).
    Every(Duration),
    /// Cron expression, evaluated in UTC.
    Cron(Box<cron::Schedule>),
}

impl Schedule {
    /// Parse a timing spec.
    ///
    /// Accepts `@every <duration>`, the `@hourly`-style macros, and 5- or
    /// 6-field cron expressions. A 5-field expression gets a `0` seconds
    /// column prepended.
    pub fn parse(spec: &str) -> Result<Self, ScheduleError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ScheduleError::Empty);
        }

        if let Some(rest) = spec.strip_prefix("@every ") {
            let dur = parse_duration(rest)
                .map_err(|reason| ScheduleError::Interval { spec: spec.to_string(), reason })?;
            if dur.is_zero() {
                return Err(ScheduleError::Interval {
                    spec: spec.to_string(),
                    reason: "interval must be positive".to_string(),
                });
            }
            return Ok(Schedule::Every(dur));
        }

        let expr = normalize_cron(spec);
        cron::Schedule::from_str(&expr)
            .map(|s| Schedule::Cron(Box::new(s)))
            .map_err(|e| ScheduleError::Cron { spec: spec.to_string(), reason: e.to_string() })
    }

    /// Delay from `now` until the next firing, or `None` if the schedule has
    /// no future firings.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Schedule::Every(d) => Some(*d),
            Schedule::Cron(s) => {
                let next = s.after(&now).next()?;
                Some((next - now).to_std().unwrap_or(Duration::ZERO))
            }
        }
    }
}

/// Map macro aliases and pad 5-field expressions with a seconds column.
fn normalize_cron(spec: &str) -> String {
    match spec {
        "@midnight" => "@daily".to_string(),
        "@annually" => "@yearly".to_string(),
        _ if spec.starts_with('@') => spec.to_string(),
        _ => {
            if spec.split_whitespace().count() == 5 {
                format!("0 {}", spec)
            } else {
                spec.to_string()
            }
        }
    }
}

/// Parse a duration string like "30s", "5m", "1h" into a Duration.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the numeric prefix
    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str.parse().map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(num));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
