// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Label source: interprets container labels as job declarations.
//!
//! Containers opt in with `helmsman.enabled=true`; job fields then live
//! under `helmsman.job-<kind>.<name>.<field>` using exactly the config-file
//! key names. The synthesized candidate never carries a global block, so
//! label deliveries cannot alter global middleware state.

use crate::config::Config;
use crate::descriptor::{Descriptor, JobParams, Source};
use crate::parser;
use crate::reconciler::Reconciler;
use hm_adapters::DockerClient;
use hm_core::JobKind;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Label prefix reserved for job declarations.
pub const LABEL_PREFIX: &str = "helmsman.";

/// Opt-in label a container must carry to be scanned.
pub const ENABLED_LABEL: &str = "helmsman.enabled=true";

pub struct LabelSource {
    docker: DockerClient,
    reconciler: Arc<Reconciler>,
    interval: Duration,
}

impl LabelSource {
    pub fn new(docker: DockerClient, reconciler: Arc<Reconciler>, interval: Duration) -> Self {
        Self { docker, reconciler, interval }
    }

    /// Start polling. The returned task runs for the daemon's lifetime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.collect_and_apply().await;
            }
        })
    }

    /// One polling cycle. A runtime error skips the cycle; the next one
    /// retries.
    async fn collect_and_apply(&self) {
        match self.docker.container_labels(ENABLED_LABEL).await {
            Ok(containers) => {
                let candidate = config_from_labels(&containers);
                self.reconciler.apply(candidate, Source::Label).await;
            }
            Err(e) => {
                warn!(error = %e, "cannot collect container labels, skipping cycle");
            }
        }
    }
}

/// Synthesize a candidate config from container label maps.
///
/// An exec job that never names a `container` targets the container bearing
/// the label. Unrecognized labels under the reserved prefix are warned
/// about and skipped; the global block is never populated.
pub fn config_from_labels(
    containers: &BTreeMap<String, BTreeMap<String, String>>,
) -> Config {
    let mut config = Config::default();

    for (container, labels) in containers {
        for (label, value) in labels {
            let Some(rest) = label.strip_prefix(LABEL_PREFIX) else { continue };
            if rest == "enabled" {
                continue;
            }

            let mut parts = rest.splitn(3, '.');
            let (Some(section), Some(name), Some(field)) =
                (parts.next(), parts.next(), parts.next())
            else {
                warn!(%container, %label, "malformed job label, ignoring");
                continue;
            };
            let Some(kind) = parser::job_section_kind(section) else {
                warn!(%container, %label, "unknown job kind in label, ignoring");
                continue;
            };
            if name.is_empty() {
                debug!(%container, %label, "dropping job label with empty name");
                continue;
            }

            let descriptor = config
                .jobs_mut(kind)
                .entry(name.to_string())
                .or_insert_with(|| new_label_descriptor(kind, name, container));
            if let Err(_e) = parser::apply_job_key(descriptor, field, value) {
                warn!(%container, %label, "invalid job label, ignoring");
            }
        }
    }

    config
}

/// Fresh descriptor for a label-declared job; exec jobs default to the
/// container carrying the label.
fn new_label_descriptor(kind: JobKind, name: &str, container: &str) -> Descriptor {
    let mut descriptor = Descriptor::new(kind, name);
    if let JobParams::Exec(params) = &mut descriptor.params {
        params.container = container.to_string();
    }
    descriptor.source = Source::Label;
    descriptor
}

#[cfg(test)]
#[path = "label_source_tests.rs"]
mod tests;
