// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconciliation engine.
//!
//! Each delivery from a source is diffed against the registry and applied
//! to the scheduler with the minimal set of mutations. The whole algorithm
//! runs under one async mutex: reconciliations are totally ordered, and the
//! registry is never observed mid-diff.
//!
//! Rules enforced here:
//! - Ownership barrier: a source may only add, update, or remove entries it
//!   owns. A name collision across sources is a warning and a no-op.
//! - Remove-before-add for every replacement, kinds in fixed order, names
//!   in order within a kind, so the scheduler mutation stream is
//!   deterministic.
//! - The global middleware block is honored only from the file source. A
//!   global change re-registers every entry, including entries owned by
//!   the other source, which are refreshed in place.
//! - Scheduler rejections are logged per operation; the registry reflects
//!   only operations the scheduler accepted.

use crate::config::{Config, GlobalConfig};
use crate::descriptor::{Descriptor, Source};
use crate::jobs::ScheduledJob;
use crate::registry::Registry;
use hm_adapters::DockerClient;
use hm_core::{JobKind, SchedulerHandle};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

struct ReconcilerState {
    registry: Registry,
    global: GlobalConfig,
    /// Fingerprint of the installed global config; `None` until the first
    /// file delivery, which therefore always installs.
    global_fingerprint: Option<u64>,
}

/// Owns the registry and drives the scheduler. Sources hold an `Arc` to
/// this and deliver candidate configs tagged with their own source.
pub struct Reconciler {
    scheduler: Arc<dyn SchedulerHandle>,
    docker: Option<DockerClient>,
    state: Mutex<ReconcilerState>,
}

impl Reconciler {
    pub fn new(scheduler: Arc<dyn SchedulerHandle>, docker: Option<DockerClient>) -> Self {
        Self {
            scheduler,
            docker,
            state: Mutex::new(ReconcilerState {
                registry: Registry::new(),
                global: GlobalConfig::default(),
                global_fingerprint: None,
            }),
        }
    }

    /// Apply one candidate delivery. Serialized end-to-end.
    pub async fn apply(&self, candidate: Config, source: Source) {
        let mut state = self.state.lock().await;

        let mut global_changed = false;
        if source == Source::File {
            let fingerprint = candidate.global.fingerprint();
            if state.global_fingerprint != Some(fingerprint) {
                info!(fingerprint, "global middleware configuration changed, reinstalling");
                self.scheduler.install_global(candidate.global.middleware_chain());
                state.global = candidate.global.clone();
                state.global_fingerprint = Some(fingerprint);
                global_changed = true;
            }
        }

        for kind in JobKind::ALL {
            self.reconcile_kind(&mut state, &candidate, kind, source, global_changed);
        }

        debug!(source = %source, jobs = state.registry.len(), "reconciliation finished");
    }

    fn reconcile_kind(
        &self,
        state: &mut ReconcilerState,
        candidate: &Config,
        kind: JobKind,
        source: Source,
        global_changed: bool,
    ) {
        if kind.needs_runtime() && self.docker.is_none() {
            if !candidate.jobs(kind).is_empty() {
                warn!(
                    %kind,
                    jobs = candidate.jobs(kind).len(),
                    "runtime client disabled, ignoring jobs of this kind"
                );
            }
            return;
        }

        let global_fingerprint = state.global_fingerprint.unwrap_or_default();

        // Update/remove pass over the current registry.
        for name in state.registry.names(kind) {
            let Some(existing) = state.registry.get(kind, &name) else { continue };

            if existing.source != source {
                if candidate.jobs(kind).contains_key(&name) {
                    warn!(
                        job = %name,
                        %kind,
                        owner = %existing.source,
                        %source,
                        "job name collides with an entry owned by the other source, ignoring"
                    );
                }
                if global_changed {
                    // Content unchanged, but the effective chain changed out
                    // from under it: refresh the registration in place.
                    let mut refreshed = existing.clone();
                    refreshed.global_snapshot = global_fingerprint;
                    self.replace(state, refreshed);
                }
                continue;
            }

            match candidate.jobs(kind).get(&name) {
                None => self.remove(state, kind, &name),
                Some(candidate_job) => {
                    let stamped = stamp(candidate_job.clone(), source, global_fingerprint);
                    if stamped.fingerprint() == existing.fingerprint() && !global_changed {
                        continue;
                    }
                    self.replace(state, stamped);
                }
            }
        }

        // Add pass over the candidate set.
        for (name, candidate_job) in candidate.jobs(kind) {
            if state.registry.get(kind, name).is_some() {
                continue;
            }
            if name.is_empty() {
                debug!(%kind, "ignoring candidate with empty name");
                continue;
            }
            let stamped = stamp(candidate_job.clone(), source, global_fingerprint);
            self.add(state, stamped);
        }
    }

    /// Add a new registration; the registry is updated only if the
    /// scheduler accepts.
    fn add(&self, state: &mut ReconcilerState, descriptor: Descriptor) {
        let (kind, name) = (descriptor.kind(), descriptor.name.clone());
        let job = ScheduledJob::new(descriptor.clone(), self.docker_for(kind));
        match self.scheduler.add_job(job) {
            Ok(()) => {
                info!(job = %name, %kind, source = %descriptor.source, "job added");
                state.registry.insert(descriptor);
            }
            Err(e) => {
                warn!(job = %name, %kind, error = %e, "scheduler rejected job, skipping");
            }
        }
    }

    /// Remove a registration; the registry keeps the entry if the scheduler
    /// refuses, so the next delivery retries.
    fn remove(&self, state: &mut ReconcilerState, kind: JobKind, name: &str) {
        match self.scheduler.remove_job(kind, name) {
            Ok(()) => {
                info!(job = %name, %kind, "job removed");
                state.registry.remove(kind, name);
            }
            Err(e) => {
                warn!(job = %name, %kind, error = %e, "scheduler rejected removal, keeping entry");
            }
        }
    }

    /// Replace a registration: remove, rebuild the chain, add. Ordered so
    /// the scheduler never holds two registrations with one identity.
    fn replace(&self, state: &mut ReconcilerState, descriptor: Descriptor) {
        let (kind, name) = (descriptor.kind(), descriptor.name.clone());
        if let Err(e) = self.scheduler.remove_job(kind, &name) {
            warn!(
                job = %name,
                %kind,
                error = %e,
                "scheduler rejected removal, keeping existing registration"
            );
            return;
        }
        let job = ScheduledJob::new(descriptor.clone(), self.docker_for(kind));
        match self.scheduler.add_job(job) {
            Ok(()) => {
                info!(job = %name, %kind, source = %descriptor.source, "job updated");
                state.registry.insert(descriptor);
            }
            Err(e) => {
                // The old registration is gone and the new one was refused;
                // drop the entry so the next delivery re-adds it.
                warn!(job = %name, %kind, error = %e, "scheduler rejected re-add, dropping entry");
                state.registry.remove(kind, &name);
            }
        }
    }

    fn docker_for(&self, kind: JobKind) -> Option<DockerClient> {
        if kind.needs_runtime() {
            self.docker.clone()
        } else {
            None
        }
    }

    /// Snapshot of the registry contents, kinds in fixed order.
    pub async fn registry_snapshot(&self) -> Vec<Descriptor> {
        let state = self.state.lock().await;
        state.registry.all().cloned().collect()
    }

    /// Currently installed global middleware config.
    pub async fn global_config(&self) -> GlobalConfig {
        self.state.lock().await.global.clone()
    }

    pub async fn job_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }
}

/// Stamp a candidate with its attribution before admission.
fn stamp(mut descriptor: Descriptor, source: Source, global_fingerprint: u64) -> Descriptor {
    descriptor.source = source;
    descriptor.global_snapshot = global_fingerprint;
    descriptor
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
