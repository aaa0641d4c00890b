// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hm_core::StubJob;

#[test]
fn empty_config_builds_nothing() {
    assert!(GotifyConfig::default().is_empty());
    assert!(GotifyConfig::default().build().is_none());
    let cfg = GotifyConfig {
        url: "https://gotify.example".to_string(),
        token: "t0k3n".to_string(),
        only_on_error: false,
        priority: 5,
    };
    assert!(cfg.build().is_some());
}

#[test]
fn message_url_normalizes_trailing_slash() {
    assert_eq!(message_url("https://gotify.example"), "https://gotify.example/message");
    assert_eq!(message_url("https://gotify.example/"), "https://gotify.example/message");
}

#[tokio::test]
async fn payload_carries_priority_and_body() {
    let cfg = GotifyConfig {
        url: "https://gotify.example".to_string(),
        token: "t".to_string(),
        only_on_error: false,
        priority: 8,
    };
    let mut stub = StubJob::new("probe");
    stub.output = "all good\n".to_string();
    let job = Arc::new(stub);
    let mut ctx = job.context();
    ctx.next().await.unwrap();
    ctx.stop(None);

    let value = payload(&cfg, &ctx);
    assert_eq!(value["priority"], 8);
    assert!(value["title"].as_str().unwrap().contains("Job \"probe\""));
    assert!(value["message"].as_str().unwrap().contains("all good"));
}
