// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented config file parser.
//!
//! Grammar: `[global]` and `[job-<kind> "name"]` section headers,
//! `key = value` pairs, `#`/`;` comments. `environment` and `volume` may
//! repeat. Unknown sections and keys are errors; a malformed file must
//! abort the delivery instead of half-applying.

use crate::config::{Config, GlobalConfig};
use crate::descriptor::{Descriptor, JobParams};
use hm_core::{parse_duration, JobKind};
use hm_middlewares::{GotifyConfig, MailConfig, OverlapConfig, SaveConfig, SlackConfig};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("line {line}: unknown section '{section}'")]
    UnknownSection { line: usize, section: String },

    #[error("line {line}: unknown key '{key}' in section '{section}'")]
    UnknownKey { line: usize, section: String, key: String },

    #[error("line {line}: invalid value for '{key}': {reason}")]
    InvalidValue { line: usize, key: String, reason: String },
}

/// Result of applying one key to a config fragment.
pub(crate) enum KeyError {
    Unknown,
    Invalid(String),
}

enum Section {
    Global(GlobalConfig),
    Job(Descriptor),
}

impl Section {
    fn name(&self) -> String {
        match self {
            Section::Global(_) => "global".to_string(),
            Section::Job(d) => format!("job-{} \"{}\"", section_suffix(d.kind()), d.name),
        }
    }
}

pub fn parse(content: &str) -> Result<Config, ParseError> {
    let mut config = Config::default();
    let mut section: Option<Section> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            commit(&mut config, section.take());
            section = Some(parse_header(line, line_no)?);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ParseError::Syntax {
                line: line_no,
                reason: format!("expected 'key = value', got '{}'", line),
            });
        };
        let key = key.trim();
        let value = value.trim();

        let Some(current) = section.as_mut() else {
            return Err(ParseError::Syntax {
                line: line_no,
                reason: "key outside of any section".to_string(),
            });
        };

        let applied = match current {
            Section::Global(global) => apply_global_key(global, key, value),
            Section::Job(descriptor) => apply_job_key(descriptor, key, value),
        };
        match applied {
            Ok(()) => {}
            Err(KeyError::Unknown) => {
                return Err(ParseError::UnknownKey {
                    line: line_no,
                    section: current.name(),
                    key: key.to_string(),
                })
            }
            Err(KeyError::Invalid(reason)) => {
                return Err(ParseError::InvalidValue { line: line_no, key: key.to_string(), reason })
            }
        }
    }

    commit(&mut config, section.take());
    Ok(config)
}

fn commit(config: &mut Config, section: Option<Section>) {
    match section {
        Some(Section::Global(global)) => config.global = global,
        Some(Section::Job(descriptor)) => {
            if descriptor.name.is_empty() {
                debug!(kind = %descriptor.kind(), "dropping job section with empty name");
                return;
            }
            config.insert(descriptor);
        }
        None => {}
    }
}

/// Parse `[global]` or `[job-<kind> "name"]`.
fn parse_header(line: &str, line_no: usize) -> Result<Section, ParseError> {
    let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) else {
        return Err(ParseError::Syntax {
            line: line_no,
            reason: format!("unterminated section header '{}'", line),
        });
    };
    let inner = inner.trim();

    match inner.split_once(char::is_whitespace) {
        None => {
            if inner == "global" {
                Ok(Section::Global(GlobalConfig::default()))
            } else if job_section_kind(inner).is_some() {
                Err(ParseError::Syntax {
                    line: line_no,
                    reason: format!("section '{}' requires a quoted job name", inner),
                })
            } else {
                Err(ParseError::UnknownSection { line: line_no, section: inner.to_string() })
            }
        }
        Some((section, rest)) => {
            let Some(kind) = job_section_kind(section) else {
                return Err(ParseError::UnknownSection {
                    line: line_no,
                    section: section.to_string(),
                });
            };
            let rest = rest.trim();
            let Some(name) = rest.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
                return Err(ParseError::Syntax {
                    line: line_no,
                    reason: format!("job name must be double-quoted, got '{}'", rest),
                });
            };
            Ok(Section::Job(Descriptor::new(kind, name)))
        }
    }
}

/// Map a job section name (also the label namespace's section token) to its
/// kind.
pub(crate) fn job_section_kind(section: &str) -> Option<JobKind> {
    match section {
        "job-exec" => Some(JobKind::Exec),
        "job-run" => Some(JobKind::Run),
        "job-service-run" => Some(JobKind::Service),
        "job-local" => Some(JobKind::Local),
        _ => None,
    }
}

fn section_suffix(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Exec => "exec",
        JobKind::Run => "run",
        JobKind::Service => "service-run",
        JobKind::Local => "local",
    }
}

/// Strip a trailing comment, respecting nothing fancier than whole-line and
/// ` # ` / ` ; ` suffixes.
fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with(';') {
        return "";
    }
    for marker in [" #", " ;"] {
        if let Some(pos) = line.find(marker) {
            return &line[..pos];
        }
    }
    line
}

pub(crate) fn apply_global_key(
    global: &mut GlobalConfig,
    key: &str,
    value: &str,
) -> Result<(), KeyError> {
    let applied = apply_middleware_key(
        None,
        &mut global.slack,
        &mut global.save,
        &mut global.mail,
        &mut global.gotify,
        key,
        value,
    )?;
    if applied {
        Ok(())
    } else {
        Err(KeyError::Unknown)
    }
}

pub(crate) fn apply_job_key(
    descriptor: &mut Descriptor,
    key: &str,
    value: &str,
) -> Result<(), KeyError> {
    match key {
        "schedule" => {
            descriptor.schedule = value.to_string();
            return Ok(());
        }
        "command" => {
            descriptor.command = value.to_string();
            return Ok(());
        }
        _ => {}
    }

    if apply_middleware_key(
        Some(&mut descriptor.overlap),
        &mut descriptor.slack,
        &mut descriptor.save,
        &mut descriptor.mail,
        &mut descriptor.gotify,
        key,
        value,
    )? {
        return Ok(());
    }

    match &mut descriptor.params {
        JobParams::Exec(p) => match key {
            "container" => p.container = value.to_string(),
            "user" => p.user = value.to_string(),
            "tty" => p.tty = parse_bool(value)?,
            "environment" => p.environment.push(value.to_string()),
            _ => return Err(KeyError::Unknown),
        },
        JobParams::Run(p) => match key {
            "image" => p.image = value.to_string(),
            "network" => p.network = value.to_string(),
            "user" => p.user = value.to_string(),
            "pull" => p.pull = parse_bool(value)?,
            "delete" => p.delete = parse_bool(value)?,
            "volume" => p.volumes.push(value.to_string()),
            "environment" => p.environment.push(value.to_string()),
            _ => return Err(KeyError::Unknown),
        },
        JobParams::Service(p) => match key {
            "image" => p.image = value.to_string(),
            "network" => p.network = value.to_string(),
            "user" => p.user = value.to_string(),
            "environment" => p.environment.push(value.to_string()),
            "max-runtime" => {
                p.max_runtime = parse_duration(value).map_err(KeyError::Invalid)?;
            }
            _ => return Err(KeyError::Unknown),
        },
        JobParams::Local(p) => match key {
            "dir" => p.dir = value.to_string(),
            "environment" => p.environment.push(value.to_string()),
            _ => return Err(KeyError::Unknown),
        },
    }
    Ok(())
}

/// Apply a middleware key shared by `[global]` and job sections.
///
/// Returns `Ok(false)` when the key is not a middleware key at all.
#[allow(clippy::too_many_arguments)]
fn apply_middleware_key(
    overlap: Option<&mut OverlapConfig>,
    slack: &mut SlackConfig,
    save: &mut SaveConfig,
    mail: &mut MailConfig,
    gotify: &mut GotifyConfig,
    key: &str,
    value: &str,
) -> Result<bool, KeyError> {
    match key {
        "no-overlap" => match overlap {
            Some(config) => config.no_overlap = parse_bool(value)?,
            None => return Err(KeyError::Unknown),
        },
        "slack-webhook" => slack.webhook = value.to_string(),
        "slack-only-on-error" => slack.only_on_error = parse_bool(value)?,
        "save-folder" => save.folder = value.to_string(),
        "save-only-on-error" => save.only_on_error = parse_bool(value)?,
        "save-exec-context" => save.exec_context = parse_bool(value)?,
        "smtp-host" => mail.smtp_host = value.to_string(),
        "smtp-port" => {
            mail.smtp_port = value
                .parse()
                .map_err(|_| KeyError::Invalid(format!("'{}' is not a port number", value)))?;
        }
        "smtp-user" => mail.smtp_user = value.to_string(),
        "smtp-password" => mail.smtp_password = value.to_string(),
        "email-to" => mail.email_to = value.to_string(),
        "email-from" => mail.email_from = value.to_string(),
        "mail-only-on-error" => mail.only_on_error = parse_bool(value)?,
        "gotify-url" => gotify.url = value.to_string(),
        "gotify-token" => gotify.token = value.to_string(),
        "gotify-only-on-error" => gotify.only_on_error = parse_bool(value)?,
        "gotify-priority" => {
            gotify.priority = value
                .parse()
                .map_err(|_| KeyError::Invalid(format!("'{}' is not a priority", value)))?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_bool(value: &str) -> Result<bool, KeyError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(KeyError::Invalid(format!("'{}' is not true/false", other))),
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
