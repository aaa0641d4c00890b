// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate configuration: the global middleware block plus one name-keyed
//! map of descriptors per job kind.

use crate::descriptor::Descriptor;
use crate::fingerprint::{hash_gotify, hash_mail, hash_save, hash_slack, FieldHasher};
use crate::parser::{self, ParseError};
use hm_core::{JobKind, MiddlewareChain};
use hm_middlewares::{GotifyConfig, MailConfig, SaveConfig, SlackConfig};
use std::collections::BTreeMap;
use std::path::Path;

/// Scheduler-wide middleware configuration, settable only from the file
/// source's `[global]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalConfig {
    pub slack: SlackConfig,
    pub save: SaveConfig,
    pub mail: MailConfig,
    pub gotify: GotifyConfig,
}

impl GlobalConfig {
    /// Stable digest over every field, for change detection.
    pub fn fingerprint(&self) -> u64 {
        let mut h = FieldHasher::new();
        hash_slack(&mut h, &self.slack);
        hash_save(&mut h, &self.save);
        hash_mail(&mut h, &self.mail);
        hash_gotify(&mut h, &self.gotify);
        h.finish()
    }

    /// The scheduler-global chain, in fixed declared order.
    pub fn middleware_chain(&self) -> MiddlewareChain {
        let mut chain = MiddlewareChain::new();
        chain.extend(self.slack.build());
        chain.extend(self.save.build());
        chain.extend(self.mail.build());
        chain.extend(self.gotify.build());
        chain
    }
}

/// A candidate view of the declared jobs, as produced by one source.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub exec_jobs: BTreeMap<String, Descriptor>,
    pub run_jobs: BTreeMap<String, Descriptor>,
    pub service_jobs: BTreeMap<String, Descriptor>,
    pub local_jobs: BTreeMap<String, Descriptor>,
}

impl Config {
    /// Parse the configuration file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ParseError::Io { path: path.to_path_buf(), reason: e.to_string() })?;
        Self::from_str(&content)
    }

    /// Parse configuration text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ParseError> {
        parser::parse(content)
    }

    pub fn jobs(&self, kind: JobKind) -> &BTreeMap<String, Descriptor> {
        match kind {
            JobKind::Exec => &self.exec_jobs,
            JobKind::Run => &self.run_jobs,
            JobKind::Service => &self.service_jobs,
            JobKind::Local => &self.local_jobs,
        }
    }

    pub fn jobs_mut(&mut self, kind: JobKind) -> &mut BTreeMap<String, Descriptor> {
        match kind {
            JobKind::Exec => &mut self.exec_jobs,
            JobKind::Run => &mut self.run_jobs,
            JobKind::Service => &mut self.service_jobs,
            JobKind::Local => &mut self.local_jobs,
        }
    }

    /// Insert a descriptor under its own kind and name.
    pub fn insert(&mut self, descriptor: Descriptor) -> Option<Descriptor> {
        self.jobs_mut(descriptor.kind()).insert(descriptor.name.clone(), descriptor)
    }

    pub fn job_count(&self) -> usize {
        JobKind::ALL.iter().map(|k| self.jobs(*k).len()).sum()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
