// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File source: watches the config file and drives file-mode reconciliation.
//!
//! The watcher observes the file's parent directory and filters events down
//! to the config file name, so editors that write via rename-into-place are
//! still seen. Bursts are debounced into one delivery. When the platform
//! watcher cannot be constructed at all, a 10-second content-digest poll
//! takes over.

use crate::config::Config;
use crate::descriptor::Source;
use crate::reconciler::Reconciler;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const DEBOUNCE: Duration = Duration::from_millis(250);
const POLL_INTERVAL: Duration = Duration::from_secs(10);

pub struct FileSource {
    path: PathBuf,
    reconciler: Arc<Reconciler>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, reconciler: Arc<Reconciler>) -> Self {
        Self { path: path.into(), reconciler }
    }

    /// Start watching. The returned task runs for the daemon's lifetime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            match self.start_watcher() {
                Ok((watcher, rx)) => self.event_loop(watcher, rx).await,
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "filesystem watcher unavailable, falling back to digest polling"
                    );
                    self.poll_loop().await;
                }
            }
        })
    }

    /// Construct the platform watcher on the parent directory.
    fn start_watcher(
        &self,
    ) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<notify::Event>), notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            }
        })?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!(path = %self.path.display(), "watching configuration file");
        Ok((watcher, rx))
    }

    async fn event_loop(
        &self,
        _watcher: RecommendedWatcher,
        mut rx: mpsc::UnboundedReceiver<notify::Event>,
    ) {
        while let Some(event) = rx.recv().await {
            if !self.touches_config(&event) {
                continue;
            }
            // Collapse the burst an editor save produces into one delivery.
            tokio::time::sleep(DEBOUNCE).await;
            while rx.try_recv().is_ok() {}
            self.deliver().await;
        }
    }

    fn touches_config(&self, event: &notify::Event) -> bool {
        let target = self.path.file_name();
        event.paths.iter().any(|p| p.file_name() == target)
    }

    /// Digest-polling fallback: compare a content hash every interval.
    async fn poll_loop(&self) {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;

        let mut last = digest(&self.path);
        loop {
            interval.tick().await;
            let current = digest(&self.path);
            if current != last {
                debug!(path = %self.path.display(), "config digest changed");
                last = current;
                self.deliver().await;
            }
        }
    }

    /// Parse and hand to the reconciler; a parse failure leaves the
    /// registry untouched.
    async fn deliver(&self) {
        match Config::from_file(&self.path) {
            Ok(config) => {
                info!(path = %self.path.display(), "configuration file changed, reconciling");
                self.reconciler.apply(config, Source::File).await;
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cannot load configuration file, keeping current jobs"
                );
            }
        }
    }
}

/// SHA-256 of the file contents; `None` when unreadable.
fn digest(path: &Path) -> Option<[u8; 32]> {
    let content = std::fs::read(path).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Some(hasher.finalize().into())
}

#[cfg(test)]
#[path = "file_source_tests.rs"]
mod tests;
