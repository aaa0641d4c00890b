// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authoritative in-memory set of admitted descriptors.
//!
//! Four ordered maps, one per kind, keyed by name. Ordering makes
//! enumeration, and therefore the scheduler mutation stream a
//! reconciliation produces, deterministic for a given input pair. The
//! registry has no locking of its own; it is only touched inside the
//! reconciler's critical section.

use crate::descriptor::{Descriptor, Source};
use hm_core::JobKind;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Registry {
    exec: BTreeMap<String, Descriptor>,
    run: BTreeMap<String, Descriptor>,
    service: BTreeMap<String, Descriptor>,
    local: BTreeMap<String, Descriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self, kind: JobKind) -> &BTreeMap<String, Descriptor> {
        match kind {
            JobKind::Exec => &self.exec,
            JobKind::Run => &self.run,
            JobKind::Service => &self.service,
            JobKind::Local => &self.local,
        }
    }

    fn map_mut(&mut self, kind: JobKind) -> &mut BTreeMap<String, Descriptor> {
        match kind {
            JobKind::Exec => &mut self.exec,
            JobKind::Run => &mut self.run,
            JobKind::Service => &mut self.service,
            JobKind::Local => &mut self.local,
        }
    }

    pub fn get(&self, kind: JobKind, name: &str) -> Option<&Descriptor> {
        self.map(kind).get(name)
    }

    /// Insert under the descriptor's own identity, returning any replaced
    /// entry.
    pub fn insert(&mut self, descriptor: Descriptor) -> Option<Descriptor> {
        self.map_mut(descriptor.kind()).insert(descriptor.name.clone(), descriptor)
    }

    pub fn remove(&mut self, kind: JobKind, name: &str) -> Option<Descriptor> {
        self.map_mut(kind).remove(name)
    }

    /// Names of every entry of one kind, in order.
    pub fn names(&self, kind: JobKind) -> Vec<String> {
        self.map(kind).keys().cloned().collect()
    }

    /// Every entry, kinds in fixed order, names in order within a kind.
    pub fn all(&self) -> impl Iterator<Item = &Descriptor> {
        JobKind::ALL.into_iter().flat_map(|kind| self.map(kind).values())
    }

    /// Entries of one kind owned by `source`.
    pub fn by_source(&self, kind: JobKind, source: Source) -> impl Iterator<Item = &Descriptor> {
        self.map(kind).values().filter(move |d| d.source == source)
    }

    pub fn len(&self) -> usize {
        JobKind::ALL.iter().map(|k| self.map(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
