// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The runnable form of a descriptor: run bodies for the four job kinds.

use crate::descriptor::{Descriptor, ExecParams, JobParams, LocalParams, RunParams, ServiceParams};
use async_trait::async_trait;
use hm_adapters::docker::{exec_args, run_args, service_args};
use hm_adapters::{split_command, DockerClient};
use hm_core::{Context, Job, JobError, JobKind, Middleware};
use std::process::Output;
use std::sync::Arc;

/// A descriptor admitted to the scheduler, with its middleware chain built
/// and its runtime handle attached.
pub struct ScheduledJob {
    descriptor: Descriptor,
    middlewares: Vec<Arc<dyn Middleware>>,
    docker: Option<DockerClient>,
}

impl ScheduledJob {
    pub fn new(descriptor: Descriptor, docker: Option<DockerClient>) -> Arc<Self> {
        let middlewares = descriptor.middleware_chain();
        Arc::new(Self { descriptor, middlewares, docker })
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn docker(&self) -> Result<&DockerClient, JobError> {
        self.docker
            .as_ref()
            .ok_or_else(|| JobError::Runtime("runtime client not available".to_string()))
    }

    fn argv(&self) -> Result<Vec<String>, JobError> {
        let argv = split_command(&self.descriptor.command)
            .map_err(|e| JobError::Spawn(e.to_string()))?;
        if argv.is_empty() {
            return Err(JobError::Spawn("empty command".to_string()));
        }
        Ok(argv)
    }

    async fn run_exec(&self, p: &ExecParams, ctx: &mut Context) -> Result<(), JobError> {
        let argv = self.argv()?;
        let args = exec_args(
            &p.container,
            non_empty(&p.user),
            p.tty,
            &p.environment,
            &argv,
        );
        let output = self
            .docker()?
            .execute(&args)
            .await
            .map_err(|e| JobError::Runtime(e.to_string()))?;
        fold_output(ctx, output)
    }

    async fn run_container(&self, p: &RunParams, ctx: &mut Context) -> Result<(), JobError> {
        let argv = self.argv()?;
        let args = run_args(
            &p.image,
            non_empty(&p.network),
            non_empty(&p.user),
            p.pull,
            p.delete,
            &p.volumes,
            &p.environment,
            &argv,
        );
        let output = self
            .docker()?
            .execute(&args)
            .await
            .map_err(|e| JobError::Runtime(e.to_string()))?;
        fold_output(ctx, output)
    }

    async fn run_service(&self, p: &ServiceParams, ctx: &mut Context) -> Result<(), JobError> {
        let argv = self.argv()?;
        let service_name = format!("helmsman-{}-{}", self.descriptor.name, ctx.execution.id);
        let args = service_args(
            &service_name,
            &p.image,
            non_empty(&p.network),
            non_empty(&p.user),
            &p.environment,
            &argv,
        );
        let outcome = self
            .docker()?
            .run_service(&service_name, args, p.max_runtime)
            .await
            .map_err(|e| JobError::Runtime(e.to_string()))?;

        ctx.execution.stdout.extend_from_slice(outcome.logs.as_bytes());
        if outcome.completed() {
            Ok(())
        } else {
            Err(JobError::Runtime(format!("service task ended in state '{}'", outcome.state)))
        }
    }

    async fn run_local(&self, p: &LocalParams, ctx: &mut Context) -> Result<(), JobError> {
        let argv = self.argv()?;
        let mut cmd = tokio::process::Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        if !p.dir.is_empty() {
            cmd.current_dir(&p.dir);
        }
        for entry in &p.environment {
            if let Some((key, value)) = entry.split_once('=') {
                cmd.env(key, value);
            }
        }
        let output = cmd.output().await.map_err(|e| JobError::Spawn(e.to_string()))?;
        fold_output(ctx, output)
    }
}

#[async_trait]
impl Job for ScheduledJob {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn kind(&self) -> JobKind {
        self.descriptor.kind()
    }

    fn schedule(&self) -> &str {
        &self.descriptor.schedule
    }

    fn command(&self) -> &str {
        &self.descriptor.command
    }

    fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), JobError> {
        match &self.descriptor.params {
            JobParams::Exec(p) => self.run_exec(p, ctx).await,
            JobParams::Run(p) => self.run_container(p, ctx).await,
            JobParams::Service(p) => self.run_service(p, ctx).await,
            JobParams::Local(p) => self.run_local(p, ctx).await,
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Capture process output into the execution and fold the exit status.
fn fold_output(ctx: &mut Context, output: Output) -> Result<(), JobError> {
    ctx.execution.stdout.extend_from_slice(&output.stdout);
    ctx.execution.stderr.extend_from_slice(&output.stderr);
    if output.status.success() {
        Ok(())
    } else {
        match output.status.code() {
            Some(code) => Err(JobError::NonZeroExit(code)),
            None => Err(JobError::Signalled),
        }
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
