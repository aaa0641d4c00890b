// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, the run loop, and shutdown.

use crate::config::Config;
use crate::descriptor::Source;
use crate::file_source::FileSource;
use crate::label_source::LabelSource;
use crate::parser::ParseError;
use crate::reconciler::Reconciler;
use hm_adapters::{AdapterError, DockerClient};
use hm_core::Scheduler;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] ParseError),

    #[error("container runtime unavailable: {0}")]
    Runtime(#[from] AdapterError),
}

/// Startup options, straight from the CLI surface.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub config_path: PathBuf,
    /// Disable the label source and the runtime client requirement; only
    /// local jobs remain useful.
    pub disable_docker: bool,
    pub label_poll_interval: Duration,
}

impl DaemonOptions {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            disable_docker: false,
            label_poll_interval: Duration::from_secs(10),
        }
    }
}

/// A started daemon: the live scheduler, the reconciler, and the source
/// watcher tasks.
pub struct Daemon {
    scheduler: Scheduler,
    reconciler: Arc<Reconciler>,
    watchers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon").finish_non_exhaustive()
    }
}

/// Start the daemon: load the config, connect the runtime, seed the
/// registry with the first file delivery, and spawn both sources.
///
/// Fails (and the process should exit non-zero) on an unreadable config or
/// an unreachable runtime when one is required.
pub async fn startup(options: DaemonOptions) -> Result<Daemon, LifecycleError> {
    let config = Config::from_file(&options.config_path)?;

    let docker = if options.disable_docker {
        info!("container runtime disabled, only local jobs will run");
        None
    } else {
        let client = DockerClient::new();
        client.ping().await?;
        Some(client)
    };

    let scheduler = Scheduler::new();
    let reconciler = Arc::new(Reconciler::new(
        Arc::new(scheduler.clone()),
        docker.clone(),
    ));

    // The startup config is just the first file delivery.
    reconciler.apply(config, Source::File).await;
    info!(
        config = %options.config_path.display(),
        jobs = reconciler.job_count().await,
        "daemon started"
    );

    let mut watchers =
        vec![FileSource::new(&options.config_path, Arc::clone(&reconciler)).spawn()];
    if let Some(docker) = docker {
        watchers.push(
            LabelSource::new(docker, Arc::clone(&reconciler), options.label_poll_interval).spawn(),
        );
    }

    Ok(Daemon { scheduler, reconciler, watchers })
}

impl Daemon {
    /// Block until SIGINT/SIGTERM, then shut down cleanly.
    pub async fn run(self) -> std::io::Result<()> {
        wait_for_shutdown_signal().await?;
        self.shutdown().await;
        Ok(())
    }

    /// Stop the watchers, cancel future firings, and drain in-flight
    /// executions (bounded).
    pub async fn shutdown(self) {
        info!("shutting down");
        for watcher in self.watchers {
            watcher.abort();
        }
        self.scheduler.shutdown(DRAIN_TIMEOUT).await;
        info!("daemon stopped");
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("received interrupt");
            }
            _ = terminate.recv() => {
                info!("received terminate");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("received interrupt");
    }
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
