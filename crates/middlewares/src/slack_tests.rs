// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hm_core::StubJob;

#[test]
fn empty_config_builds_nothing() {
    assert!(SlackConfig::default().is_empty());
    assert!(SlackConfig::default().build().is_none());
    let cfg = SlackConfig { webhook: "https://hooks.slack.invalid/x".to_string(), only_on_error: false };
    assert!(!cfg.is_empty());
    assert!(cfg.build().is_some());
}

#[tokio::test]
async fn payload_success_attachment() {
    let mut stub = StubJob::new("deploy");
    stub.command = "ship-it".to_string();
    let job = Arc::new(stub);
    let mut ctx = job.context();
    ctx.next().await.unwrap();
    ctx.stop(None);

    let value = payload(&ctx);
    let attachment = &value["attachments"][0];
    assert_eq!(attachment["color"], "#7CD197");
    assert!(attachment["title"].as_str().unwrap().contains("Job \"deploy\""));
    assert_eq!(attachment["text"], "Command: `ship-it`");
}

#[tokio::test]
async fn payload_failure_is_colored() {
    let job = Arc::new(StubJob::new("deploy").failing(1));
    let mut ctx = job.context();
    let res = ctx.next().await;
    ctx.stop(res.as_ref().err());

    let value = payload(&ctx);
    assert_eq!(value["attachments"][0]["color"], "#F35A00");
    assert!(value["attachments"][0]["title"].as_str().unwrap().contains("failed"));
}
