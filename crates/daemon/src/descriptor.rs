// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job descriptor: the immutable-by-identity record the registry holds.
//!
//! A descriptor is a value. After admission it is never mutated; any update
//! arrives as a replacement descriptor with its own fingerprint.

use crate::fingerprint::{
    hash_gotify, hash_mail, hash_overlap, hash_save, hash_slack, FieldHasher,
};
use hm_core::{JobKind, MiddlewareChain};
use hm_middlewares::{GotifyConfig, MailConfig, OverlapConfig, SaveConfig, SlackConfig};
use std::time::Duration;

/// Origin of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    File,
    Label,
}

hm_core::simple_display! {
    Source {
        File => "file",
        Label => "label",
    }
}

/// Runtime parameters for `exec` jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecParams {
    /// Target container name.
    pub container: String,
    pub user: String,
    pub tty: bool,
    pub environment: Vec<String>,
}

/// Runtime parameters for `run` jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub image: String,
    pub network: String,
    pub user: String,
    /// Pull the image before every run.
    pub pull: bool,
    /// Remove the container after the run.
    pub delete: bool,
    pub volumes: Vec<String>,
    pub environment: Vec<String>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            image: String::new(),
            network: String::new(),
            user: String::new(),
            pull: true,
            delete: true,
            volumes: Vec::new(),
            environment: Vec::new(),
        }
    }
}

/// Runtime parameters for `service` jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceParams {
    pub image: String,
    pub network: String,
    pub user: String,
    pub environment: Vec<String>,
    /// Upper bound on how long the one-shot task may run.
    pub max_runtime: Duration,
}

impl ServiceParams {
    pub const DEFAULT_MAX_RUNTIME: Duration = Duration::from_secs(24 * 60 * 60);
}

impl Default for ServiceParams {
    fn default() -> Self {
        Self {
            image: String::new(),
            network: String::new(),
            user: String::new(),
            environment: Vec::new(),
            max_runtime: Self::DEFAULT_MAX_RUNTIME,
        }
    }
}

/// Runtime parameters for `local` jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalParams {
    /// Working directory; empty means the daemon's.
    pub dir: String,
    pub environment: Vec<String>,
}

/// Kind-specific runtime parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobParams {
    Exec(ExecParams),
    Run(RunParams),
    Service(ServiceParams),
    Local(LocalParams),
}

impl JobParams {
    pub fn default_for(kind: JobKind) -> Self {
        match kind {
            JobKind::Exec => JobParams::Exec(ExecParams::default()),
            JobKind::Run => JobParams::Run(RunParams::default()),
            JobKind::Service => JobParams::Service(ServiceParams::default()),
            JobKind::Local => JobParams::Local(LocalParams::default()),
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            JobParams::Exec(_) => JobKind::Exec,
            JobParams::Run(_) => JobKind::Run,
            JobParams::Service(_) => JobKind::Service,
            JobParams::Local(_) => JobKind::Local,
        }
    }
}

/// A declared job: identity, timing, runtime parameters, and the middleware
/// configs that shape its execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub name: String,
    pub schedule: String,
    pub command: String,
    pub params: JobParams,
    pub overlap: OverlapConfig,
    pub slack: SlackConfig,
    pub save: SaveConfig,
    pub mail: MailConfig,
    pub gotify: GotifyConfig,
    /// Which source owns this descriptor. Never mutated in place; a source
    /// change is a removal followed by an insertion.
    pub source: Source,
    /// Fingerprint of the global middleware config in effect at admission.
    /// Attribution only; excluded from [`fingerprint`](Self::fingerprint).
    pub global_snapshot: u64,
}

impl Descriptor {
    pub fn new(kind: JobKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schedule: String::new(),
            command: String::new(),
            params: JobParams::default_for(kind),
            overlap: OverlapConfig::default(),
            slack: SlackConfig::default(),
            save: SaveConfig::default(),
            mail: MailConfig::default(),
            gotify: GotifyConfig::default(),
            source: Source::File,
            global_snapshot: 0,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.params.kind()
    }

    /// Registry identity: two descriptors with the same identity are the
    /// same job, whatever their contents.
    pub fn identity(&self) -> (JobKind, &str) {
        (self.kind(), &self.name)
    }

    /// Stable digest of every semantically significant field.
    ///
    /// Excludes `source` and `global_snapshot`: attribution and transient
    /// handles must not force re-registration on their own.
    pub fn fingerprint(&self) -> u64 {
        let mut h = FieldHasher::new();
        h.str("kind", self.kind().as_str())
            .str("name", &self.name)
            .str("schedule", &self.schedule)
            .str("command", &self.command);

        match &self.params {
            JobParams::Exec(p) => {
                h.str("exec.container", &p.container)
                    .str("exec.user", &p.user)
                    .bool("exec.tty", p.tty)
                    .list("exec.environment", &p.environment);
            }
            JobParams::Run(p) => {
                h.str("run.image", &p.image)
                    .str("run.network", &p.network)
                    .str("run.user", &p.user)
                    .bool("run.pull", p.pull)
                    .bool("run.delete", p.delete)
                    .list("run.volumes", &p.volumes)
                    .list("run.environment", &p.environment);
            }
            JobParams::Service(p) => {
                h.str("service.image", &p.image)
                    .str("service.network", &p.network)
                    .str("service.user", &p.user)
                    .list("service.environment", &p.environment)
                    .duration("service.max-runtime", p.max_runtime);
            }
            JobParams::Local(p) => {
                h.str("local.dir", &p.dir).list("local.environment", &p.environment);
            }
        }

        hash_overlap(&mut h, &self.overlap);
        hash_slack(&mut h, &self.slack);
        hash_save(&mut h, &self.save);
        hash_mail(&mut h, &self.mail);
        hash_gotify(&mut h, &self.gotify);
        h.finish()
    }

    /// Per-job middleware chain, in fixed order: overlap, then one
    /// middleware per configured sink family. Empty configs contribute
    /// nothing. The scheduler prepends the global chain at execution time.
    pub fn middleware_chain(&self) -> MiddlewareChain {
        let mut chain = MiddlewareChain::new();
        chain.extend(self.overlap.build());
        chain.extend(self.slack.build());
        chain.extend(self.save.build());
        chain.extend(self.mail.build());
        chain.extend(self.gotify.build());
        chain
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
