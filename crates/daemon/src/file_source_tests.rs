// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hm_core::{FakeScheduler, JobKind};
use notify::event::{EventKind, ModifyKind};

fn write_config(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

fn source_with_fake(path: &Path) -> (FakeScheduler, FileSource) {
    let fake = FakeScheduler::new();
    let reconciler = Arc::new(Reconciler::new(Arc::new(fake.clone()), None));
    (fake, FileSource::new(path, reconciler))
}

#[test]
fn digest_is_none_for_missing_file() {
    assert_eq!(digest(Path::new("/nonexistent/helmsman.conf")), None);
}

#[test]
fn digest_tracks_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("helmsman.conf");

    write_config(&path, "[global]\n");
    let first = digest(&path);
    assert!(first.is_some());
    assert_eq!(digest(&path), first, "unchanged content, unchanged digest");

    write_config(&path, "[global]\nsave-folder = /tmp\n");
    assert_ne!(digest(&path), first);
}

#[test]
fn events_are_filtered_to_the_config_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("helmsman.conf");
    let (_fake, source) = source_with_fake(&path);

    let hit = notify::Event::new(EventKind::Modify(ModifyKind::Any))
        .add_path(dir.path().join("helmsman.conf"));
    assert!(source.touches_config(&hit));

    // Editors write via a temp file and rename; the rename target counts,
    // unrelated siblings do not.
    let miss = notify::Event::new(EventKind::Modify(ModifyKind::Any))
        .add_path(dir.path().join("other.conf"));
    assert!(!source.touches_config(&miss));

    let empty = notify::Event::new(EventKind::Modify(ModifyKind::Any));
    assert!(!source.touches_config(&empty));
}

#[tokio::test]
async fn deliver_applies_parsed_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("helmsman.conf");
    write_config(&path, "[job-local \"hello\"]\nschedule = @every 1m\ncommand = echo hi\n");
    let (fake, source) = source_with_fake(&path);

    source.deliver().await;

    assert!(fake.is_registered(JobKind::Local, "hello"));
}

#[tokio::test]
async fn deliver_with_malformed_file_preserves_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("helmsman.conf");
    write_config(&path, "[job-local \"hello\"]\nschedule = @every 1m\ncommand = echo hi\n");
    let (fake, source) = source_with_fake(&path);
    source.deliver().await;
    fake.take_ops();

    write_config(&path, "[[[ this is not a config\n");
    source.deliver().await;

    assert!(fake.take_ops().is_empty(), "malformed delivery must not mutate the scheduler");
    assert!(fake.is_registered(JobKind::Local, "hello"));
}

#[tokio::test]
async fn deliver_with_missing_file_preserves_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("helmsman.conf");
    write_config(&path, "[job-local \"hello\"]\nschedule = @every 1m\ncommand = echo hi\n");
    let (fake, source) = source_with_fake(&path);
    source.deliver().await;
    fake.take_ops();

    std::fs::remove_file(&path).unwrap();
    source.deliver().await;

    assert!(fake.take_ops().is_empty());
    assert!(fake.is_registered(JobKind::Local, "hello"));
}
