// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker CLI client: the daemon's runtime handle.
//!
//! Every operation shells out to the `docker` binary and captures its
//! output. Argument vectors are built by pure functions so the command
//! lines stay testable without a running daemon.

use std::collections::BTreeMap;
use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to exec {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} {command} failed: {stderr}")]
    CommandFailed { program: String, command: String, stderr: String },

    #[error("unexpected output from {program} {command}: {reason}")]
    BadOutput { program: String, command: String, reason: String },

    #[error("service task {name} did not finish within {timeout:?}")]
    ServiceTimeout { name: String, timeout: Duration },
}

/// Outcome of a one-shot service task.
#[derive(Debug, Clone)]
pub struct ServiceOutcome {
    /// Final task state as reported by the runtime (e.g. `Complete`, `Failed`).
    pub state: String,
    /// Collected service logs.
    pub logs: String,
}

impl ServiceOutcome {
    pub fn completed(&self) -> bool {
        self.state.starts_with("Complete")
    }
}

/// Handle to the container runtime.
///
/// Cheap to clone; owned by the daemon and passed by handle to every job
/// that needs it.
#[derive(Debug, Clone)]
pub struct DockerClient {
    program: String,
}

impl DockerClient {
    pub fn new() -> Self {
        Self { program: "docker".to_string() }
    }

    /// Use an alternative binary. Test seam.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Verify the runtime is reachable.
    pub async fn ping(&self) -> Result<(), AdapterError> {
        self.output(&["version", "--format", "{{.Server.Version}}"]).await.map(|_| ())
    }

    /// Labels of every container carrying `filter_label`, keyed by
    /// container name.
    pub async fn container_labels(
        &self,
        filter_label: &str,
    ) -> Result<BTreeMap<String, BTreeMap<String, String>>, AdapterError> {
        let filter = format!("label={}", filter_label);
        let names = self.output(&["ps", "--filter", &filter, "--format", "{{.Names}}"]).await?;

        let mut result = BTreeMap::new();
        for name in names.lines().map(str::trim).filter(|n| !n.is_empty()) {
            let raw = self
                .output(&["inspect", "--format", "{{json .Config.Labels}}", name])
                .await?;
            // A container without labels inspects as the literal "null".
            let labels: BTreeMap<String, String> = if raw.is_empty() || raw == "null" {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| AdapterError::BadOutput {
                    program: self.program.clone(),
                    command: "inspect".to_string(),
                    reason: e.to_string(),
                })?
            };
            result.insert(name.to_string(), labels);
        }
        Ok(result)
    }

    /// Run a fully built argument vector, capturing stdout and stderr.
    ///
    /// Unlike [`output`](Self::output), a non-zero exit is returned as a
    /// normal [`Output`] so the caller can fold the status into an
    /// execution record.
    pub async fn execute(&self, args: &[String]) -> Result<Output, AdapterError> {
        debug!(program = %self.program, command = ?args.first(), "running runtime command");
        tokio::process::Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| AdapterError::Spawn { program: self.program.clone(), reason: e.to_string() })
    }

    /// Create a one-shot service task, wait for its terminal state, collect
    /// its logs, and remove it.
    pub async fn run_service(
        &self,
        name: &str,
        create_args: Vec<String>,
        max_runtime: Duration,
    ) -> Result<ServiceOutcome, AdapterError> {
        let create_refs: Vec<&str> = create_args.iter().map(String::as_str).collect();
        self.output(&create_refs).await?;

        let state = self.wait_for_service(name, max_runtime).await;

        let logs = self
            .output(&["service", "logs", "--raw", name])
            .await
            .unwrap_or_else(|e| {
                warn!(service = %name, error = %e, "could not collect service logs");
                String::new()
            });
        if let Err(e) = self.output(&["service", "rm", name]).await {
            warn!(service = %name, error = %e, "could not remove one-shot service");
        }

        let state = state?;
        Ok(ServiceOutcome { state, logs })
    }

    async fn wait_for_service(
        &self,
        name: &str,
        max_runtime: Duration,
    ) -> Result<String, AdapterError> {
        let deadline = tokio::time::Instant::now() + max_runtime;
        loop {
            let raw = self
                .output(&["service", "ps", name, "--format", "{{.CurrentState}}"])
                .await?;
            if let Some(state) = raw.lines().next() {
                let word = state.split_whitespace().next().unwrap_or("");
                if matches!(word, "Complete" | "Failed" | "Rejected" | "Shutdown" | "Orphaned") {
                    return Ok(state.to_string());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AdapterError::ServiceTimeout { name: name.to_string(), timeout: max_runtime });
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    /// Run a docker CLI command, expecting success; returns trimmed stdout.
    async fn output(&self, args: &[&str]) -> Result<String, AdapterError> {
        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| AdapterError::Spawn { program: self.program.clone(), reason: e.to_string() })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(AdapterError::CommandFailed {
                program: self.program.clone(),
                command: args.first().unwrap_or(&"").to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl Default for DockerClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Build `docker exec` arguments.
pub fn exec_args(
    container: &str,
    user: Option<&str>,
    tty: bool,
    environment: &[String],
    argv: &[String],
) -> Vec<String> {
    let mut args = vec!["exec".to_string()];
    if tty {
        args.push("-t".to_string());
    }
    if let Some(user) = user {
        args.push("-u".to_string());
        args.push(user.to_string());
    }
    for env in environment {
        args.push("-e".to_string());
        args.push(env.clone());
    }
    args.push(container.to_string());
    args.extend(argv.iter().cloned());
    args
}

/// Build `docker run` arguments for an ephemeral container.
#[allow(clippy::too_many_arguments)]
pub fn run_args(
    image: &str,
    network: Option<&str>,
    user: Option<&str>,
    pull: bool,
    delete: bool,
    volumes: &[String],
    environment: &[String],
    argv: &[String],
) -> Vec<String> {
    let mut args = vec!["run".to_string()];
    if delete {
        args.push("--rm".to_string());
    }
    args.push("--pull".to_string());
    args.push(if pull { "always" } else { "missing" }.to_string());
    if let Some(network) = network {
        args.push("--network".to_string());
        args.push(network.to_string());
    }
    if let Some(user) = user {
        args.push("-u".to_string());
        args.push(user.to_string());
    }
    for volume in volumes {
        args.push("-v".to_string());
        args.push(volume.clone());
    }
    for env in environment {
        args.push("-e".to_string());
        args.push(env.clone());
    }
    args.push(image.to_string());
    args.extend(argv.iter().cloned());
    args
}

/// Build `docker service create` arguments for a one-shot task.
pub fn service_args(
    name: &str,
    image: &str,
    network: Option<&str>,
    user: Option<&str>,
    environment: &[String],
    argv: &[String],
) -> Vec<String> {
    let mut args = vec![
        "service".to_string(),
        "create".to_string(),
        "--detach".to_string(),
        "--name".to_string(),
        name.to_string(),
        "--restart-condition".to_string(),
        "none".to_string(),
    ];
    if let Some(network) = network {
        args.push("--network".to_string());
        args.push(network.to_string());
    }
    if let Some(user) = user {
        args.push("-u".to_string());
        args.push(user.to_string());
    }
    for env in environment {
        args.push("-e".to_string());
        args.push(env.clone());
    }
    args.push(image.to_string());
    args.extend(argv.iter().cloned());
    args
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
