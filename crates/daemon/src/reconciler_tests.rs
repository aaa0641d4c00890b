// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hm_core::FakeScheduler;
use hm_core::SchedulerOp::{Add, InstallGlobal, Remove};

fn local(name: &str, command: &str) -> Descriptor {
    let mut d = Descriptor::new(JobKind::Local, name);
    d.schedule = "@every 1m".to_string();
    d.command = command.to_string();
    d
}

fn exec(name: &str) -> Descriptor {
    let mut d = Descriptor::new(JobKind::Exec, name);
    d.schedule = "@every 1m".to_string();
    d.command = "uptime".to_string();
    if let crate::descriptor::JobParams::Exec(p) = &mut d.params {
        p.container = "web".to_string();
    }
    d
}

fn config_of(descriptors: Vec<Descriptor>) -> Config {
    let mut config = Config::default();
    for d in descriptors {
        config.insert(d);
    }
    config
}

fn setup() -> (FakeScheduler, Reconciler) {
    let fake = FakeScheduler::new();
    let reconciler = Reconciler::new(Arc::new(fake.clone()), Some(DockerClient::new()));
    (fake, reconciler)
}

#[tokio::test]
async fn first_file_delivery_installs_global_and_adds_jobs() {
    let (fake, reconciler) = setup();
    reconciler.apply(config_of(vec![local("hello", "echo hi")]), Source::File).await;

    assert_eq!(
        fake.take_ops(),
        vec![
            InstallGlobal { middlewares: 0 },
            Add { kind: JobKind::Local, name: "hello".to_string() },
        ]
    );

    let registry = reconciler.registry_snapshot().await;
    assert_eq!(registry.len(), 1);
    assert_eq!(registry[0].name, "hello");
    assert_eq!(registry[0].source, Source::File);
}

#[tokio::test]
async fn equivalent_redelivery_is_idempotent() {
    let (fake, reconciler) = setup();
    let candidate = config_of(vec![local("hello", "echo hi"), exec("probe")]);

    reconciler.apply(candidate.clone(), Source::File).await;
    fake.take_ops();

    reconciler.apply(candidate, Source::File).await;
    assert!(fake.take_ops().is_empty(), "equivalent redelivery must issue zero mutations");
    assert_eq!(reconciler.job_count().await, 2);
}

#[tokio::test]
async fn changed_command_replaces_with_remove_then_add() {
    let (fake, reconciler) = setup();
    reconciler.apply(config_of(vec![local("hello", "echo hi")]), Source::File).await;
    let before = reconciler.registry_snapshot().await[0].fingerprint();
    fake.take_ops();

    reconciler.apply(config_of(vec![local("hello", "echo world")]), Source::File).await;

    assert_eq!(
        fake.take_ops(),
        vec![
            Remove { kind: JobKind::Local, name: "hello".to_string() },
            Add { kind: JobKind::Local, name: "hello".to_string() },
        ]
    );
    let registry = reconciler.registry_snapshot().await;
    assert_eq!(registry.len(), 1);
    assert_eq!(registry[0].command, "echo world");
    assert_ne!(registry[0].fingerprint(), before);
}

#[tokio::test]
async fn absent_candidate_is_removed() {
    let (fake, reconciler) = setup();
    reconciler
        .apply(config_of(vec![local("keep", "true"), local("drop", "true")]), Source::File)
        .await;
    fake.take_ops();

    reconciler.apply(config_of(vec![local("keep", "true")]), Source::File).await;

    assert_eq!(fake.take_ops(), vec![Remove { kind: JobKind::Local, name: "drop".to_string() }]);
    let names: Vec<String> =
        reconciler.registry_snapshot().await.into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["keep"]);
}

#[tokio::test]
async fn label_delivery_cannot_touch_file_entries() {
    let (fake, reconciler) = setup();
    reconciler.apply(config_of(vec![local("hello", "echo hi")]), Source::File).await;
    fake.take_ops();

    // Empty label view: the file-owned entry is invisible to it.
    reconciler.apply(Config::default(), Source::Label).await;

    assert!(fake.take_ops().is_empty());
    assert_eq!(reconciler.job_count().await, 1);
}

#[tokio::test]
async fn file_delivery_cannot_touch_label_entries() {
    let (fake, reconciler) = setup();
    reconciler.apply(config_of(vec![exec("probe")]), Source::Label).await;
    fake.take_ops();

    // File view with no jobs at all: the label-owned probe survives.
    reconciler.apply(Config::default(), Source::File).await;

    let ops = fake.take_ops();
    assert_eq!(ops, vec![InstallGlobal { middlewares: 0 }], "{ops:?}");
    let registry = reconciler.registry_snapshot().await;
    assert_eq!(registry.len(), 1);
    assert_eq!(registry[0].source, Source::Label);
}

#[tokio::test]
async fn cross_source_collision_is_a_noop() {
    let (fake, reconciler) = setup();
    reconciler.apply(config_of(vec![local("twin", "echo file")]), Source::File).await;
    fake.take_ops();

    reconciler.apply(config_of(vec![local("twin", "echo label")]), Source::Label).await;

    assert!(fake.take_ops().is_empty(), "colliding label delivery must not mutate");
    let registry = reconciler.registry_snapshot().await;
    assert_eq!(registry.len(), 1);
    assert_eq!(registry[0].source, Source::File);
    assert_eq!(registry[0].command, "echo file");
}

#[tokio::test]
async fn global_change_reregisters_entries_of_both_sources() {
    let (fake, reconciler) = setup();
    reconciler.apply(config_of(vec![local("hello", "echo hi")]), Source::File).await;
    reconciler.apply(config_of(vec![exec("probe")]), Source::Label).await;
    fake.take_ops();

    let mut changed = config_of(vec![local("hello", "echo hi")]);
    changed.global.slack.webhook = "https://hooks.example/new".to_string();
    reconciler.apply(changed, Source::File).await;

    assert_eq!(
        fake.take_ops(),
        vec![
            InstallGlobal { middlewares: 1 },
            Remove { kind: JobKind::Exec, name: "probe".to_string() },
            Add { kind: JobKind::Exec, name: "probe".to_string() },
            Remove { kind: JobKind::Local, name: "hello".to_string() },
            Add { kind: JobKind::Local, name: "hello".to_string() },
        ]
    );

    // The label entry was refreshed, not re-owned or mutated.
    let registry = reconciler.registry_snapshot().await;
    let probe = registry.iter().find(|d| d.name == "probe").unwrap();
    assert_eq!(probe.source, Source::Label);
    assert_eq!(probe.command, "uptime");
}

#[tokio::test]
async fn label_delivery_ignores_global_block() {
    let (fake, reconciler) = setup();
    reconciler.apply(config_of(vec![local("hello", "echo hi")]), Source::File).await;
    fake.take_ops();

    let mut sneaky = config_of(vec![exec("probe")]);
    sneaky.global.slack.webhook = "https://hooks.example/hijack".to_string();
    reconciler.apply(sneaky, Source::Label).await;

    let ops = fake.take_ops();
    assert!(!ops.contains(&InstallGlobal { middlewares: 1 }), "{ops:?}");
    assert_eq!(reconciler.global_config().await.slack.webhook, "");
    // And since the global did not change, the file entry stayed put.
    assert_eq!(ops, vec![Add { kind: JobKind::Exec, name: "probe".to_string() }]);
}

#[tokio::test]
async fn label_delivery_before_any_file_delivery_works() {
    let (fake, reconciler) = setup();
    reconciler.apply(config_of(vec![exec("probe")]), Source::Label).await;

    assert_eq!(fake.take_ops(), vec![Add { kind: JobKind::Exec, name: "probe".to_string() }]);
    assert_eq!(reconciler.registry_snapshot().await[0].global_snapshot, 0);
}

#[tokio::test]
async fn rejected_add_is_not_recorded_in_registry() {
    let (fake, reconciler) = setup();
    fake.reject_add(JobKind::Local, "bad");

    reconciler
        .apply(config_of(vec![local("bad", "true"), local("good", "true")]), Source::File)
        .await;

    let names: Vec<String> =
        reconciler.registry_snapshot().await.into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["good"]);
    // Registry and scheduler agree entry-for-entry.
    assert_eq!(fake.registered(), vec![(JobKind::Local, "good".to_string())]);
}

#[tokio::test]
async fn kinds_are_processed_in_fixed_order() {
    let (fake, reconciler) = setup();
    let mut run = Descriptor::new(JobKind::Run, "r");
    run.schedule = "@every 1m".to_string();
    run.command = "true".to_string();
    let mut service = Descriptor::new(JobKind::Service, "s");
    service.schedule = "@every 1m".to_string();
    service.command = "true".to_string();

    reconciler
        .apply(config_of(vec![local("l", "true"), exec("e"), run, service]), Source::File)
        .await;

    let kinds: Vec<JobKind> = fake
        .take_ops()
        .into_iter()
        .filter_map(|op| match op {
            Add { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, [JobKind::Exec, JobKind::Run, JobKind::Service, JobKind::Local]);
}

#[tokio::test]
async fn disabled_runtime_skips_runtime_kinds() {
    let fake = FakeScheduler::new();
    let reconciler = Reconciler::new(Arc::new(fake.clone()), None);

    reconciler.apply(config_of(vec![local("hello", "true"), exec("probe")]), Source::File).await;

    let names: Vec<String> =
        reconciler.registry_snapshot().await.into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["hello"]);
    assert!(fake.is_registered(JobKind::Local, "hello"));
    assert!(!fake.is_registered(JobKind::Exec, "probe"));
}

#[tokio::test]
async fn registry_never_holds_duplicate_identities() {
    let (_fake, reconciler) = setup();
    for _ in 0..3 {
        reconciler
            .apply(config_of(vec![local("a", "true"), local("b", "true")]), Source::File)
            .await;
        reconciler.apply(config_of(vec![exec("a")]), Source::Label).await;
    }

    let registry = reconciler.registry_snapshot().await;
    let mut identities: Vec<(JobKind, String)> =
        registry.iter().map(|d| (d.kind(), d.name.clone())).collect();
    identities.sort();
    let before = identities.len();
    identities.dedup();
    assert_eq!(before, identities.len());
    assert_eq!(before, 3);
}

#[tokio::test]
async fn global_snapshot_is_stamped_on_admission() {
    let (_fake, reconciler) = setup();
    let mut candidate = config_of(vec![local("hello", "true")]);
    candidate.global.save.folder = "/var/log/helmsman".to_string();
    let expected = candidate.global.fingerprint();

    reconciler.apply(candidate, Source::File).await;

    assert_eq!(reconciler.registry_snapshot().await[0].global_snapshot, expected);
}
