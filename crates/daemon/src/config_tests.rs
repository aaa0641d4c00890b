// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::descriptor::JobParams;
use hm_core::JobKind;

const SAMPLE: &str = r#"
[global]
slack-webhook = https://hooks.example/T/B
save-folder = /var/log/helmsman

[job-exec "probe"]
schedule = @every 5m
command = uptime
container = web
tty = true
environment = MODE=probe

[job-run "nightly"]
schedule = @daily
command = backup --all
image = backup:latest
volume = /data:/data
pull = false

[job-service-run "migrate"]
schedule = @weekly
command = migrate-db
image = migrator:1
max-runtime = 30m

[job-local "hello"]
schedule = @every 1m
command = echo hi
no-overlap = true
"#;

/// Render the semantically significant fields back to config text.
fn render(config: &Config) -> String {
    let mut out = String::new();
    out.push_str("[global]\n");
    push_kv(&mut out, "slack-webhook", &config.global.slack.webhook);
    push_kv(&mut out, "save-folder", &config.global.save.folder);

    for kind in JobKind::ALL {
        for d in config.jobs(kind).values() {
            out.push_str(&format!("[job-{} \"{}\"]\n", section_token(kind), d.name));
            push_kv(&mut out, "schedule", &d.schedule);
            push_kv(&mut out, "command", &d.command);
            if d.overlap.no_overlap {
                push_kv(&mut out, "no-overlap", "true");
            }
            match &d.params {
                JobParams::Exec(p) => {
                    push_kv(&mut out, "container", &p.container);
                    if p.tty {
                        push_kv(&mut out, "tty", "true");
                    }
                    for e in &p.environment {
                        push_kv(&mut out, "environment", e);
                    }
                }
                JobParams::Run(p) => {
                    push_kv(&mut out, "image", &p.image);
                    push_kv(&mut out, "pull", if p.pull { "true" } else { "false" });
                    for v in &p.volumes {
                        push_kv(&mut out, "volume", v);
                    }
                }
                JobParams::Service(p) => {
                    push_kv(&mut out, "image", &p.image);
                    push_kv(
                        &mut out,
                        "max-runtime",
                        &format!("{}s", p.max_runtime.as_secs()),
                    );
                }
                JobParams::Local(_) => {}
            }
        }
    }
    out
}

fn section_token(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Exec => "exec",
        JobKind::Run => "run",
        JobKind::Service => "service-run",
        JobKind::Local => "local",
    }
}

fn push_kv(out: &mut String, key: &str, value: &str) {
    if !value.is_empty() {
        out.push_str(&format!("{} = {}\n", key, value));
    }
}

#[test]
fn parse_render_reparse_is_stable() {
    let first = Config::from_str(SAMPLE).unwrap();
    let second = Config::from_str(&render(&first)).unwrap();

    assert_eq!(first.global.fingerprint(), second.global.fingerprint());
    assert_eq!(first.job_count(), second.job_count());
    for kind in JobKind::ALL {
        for (name, d) in first.jobs(kind) {
            let reparsed = second.jobs(kind).get(name).unwrap_or_else(|| {
                panic!("job {kind} \"{name}\" lost in round-trip")
            });
            assert_eq!(d.fingerprint(), reparsed.fingerprint(), "{kind} \"{name}\"");
        }
    }
}

#[test]
fn jobs_maps_are_keyed_by_kind() {
    let config = Config::from_str(SAMPLE).unwrap();
    assert_eq!(config.jobs(JobKind::Exec).len(), 1);
    assert_eq!(config.jobs(JobKind::Run).len(), 1);
    assert_eq!(config.jobs(JobKind::Service).len(), 1);
    assert_eq!(config.jobs(JobKind::Local).len(), 1);
    assert_eq!(config.job_count(), 4);
}

#[test]
fn insert_places_descriptor_under_its_kind() {
    let mut config = Config::default();
    let mut d = Descriptor::new(JobKind::Run, "x");
    d.schedule = "@daily".to_string();
    config.insert(d);
    assert!(config.run_jobs.contains_key("x"));
    assert!(config.exec_jobs.is_empty());
}

#[test]
fn global_fingerprint_tracks_any_family() {
    let base = GlobalConfig::default();
    let mut slack = base.clone();
    slack.slack.webhook = "https://hooks.example/x".to_string();
    let mut gotify = base.clone();
    gotify.gotify.url = "https://gotify.example".to_string();

    assert_ne!(base.fingerprint(), slack.fingerprint());
    assert_ne!(base.fingerprint(), gotify.fingerprint());
    assert_ne!(slack.fingerprint(), gotify.fingerprint());
}

#[test]
fn global_chain_is_sinks_in_declared_order() {
    let mut global = GlobalConfig::default();
    assert!(global.middleware_chain().is_empty());

    global.slack.webhook = "https://hooks.example/x".to_string();
    global.save.folder = "/tmp/saves".to_string();
    assert_eq!(global.middleware_chain().len(), 2);
}

#[test]
fn from_file_missing_path_is_io_error() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/helmsman.conf")).unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }), "{err}");
}
