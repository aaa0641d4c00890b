// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn same_walk_same_digest() {
    let mut a = FieldHasher::new();
    a.str("name", "backup").bool("flag", true);
    let mut b = FieldHasher::new();
    b.str("name", "backup").bool("flag", true);
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn different_value_different_digest() {
    let mut a = FieldHasher::new();
    a.str("name", "backup");
    let mut b = FieldHasher::new();
    b.str("name", "backups");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn framing_prevents_concatenation_collisions() {
    // "ab" + "c" must not hash like "a" + "bc".
    let mut a = FieldHasher::new();
    a.str("x", "ab").str("y", "c");
    let mut b = FieldHasher::new();
    b.str("x", "a").str("y", "bc");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn tag_is_part_of_the_digest() {
    let mut a = FieldHasher::new();
    a.str("image", "alpine");
    let mut b = FieldHasher::new();
    b.str("network", "alpine");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn list_order_is_significant() {
    let mut a = FieldHasher::new();
    a.list("env", &["A=1".to_string(), "B=2".to_string()]);
    let mut b = FieldHasher::new();
    b.list("env", &["B=2".to_string(), "A=1".to_string()]);
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn empty_list_differs_from_missing_list() {
    let mut a = FieldHasher::new();
    a.str("name", "x").list("env", &[]);
    let mut b = FieldHasher::new();
    b.str("name", "x");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn middleware_config_helpers_cover_every_field() {
    use hm_middlewares::SlackConfig;

    let base = SlackConfig::default();
    let mut h = FieldHasher::new();
    hash_slack(&mut h, &base);
    let base_digest = h.finish();

    let mut webhook = base.clone();
    webhook.webhook = "https://hooks.example/x".to_string();
    let mut h = FieldHasher::new();
    hash_slack(&mut h, &webhook);
    assert_ne!(h.finish(), base_digest);

    let mut gate = base.clone();
    gate.only_on_error = true;
    let mut h = FieldHasher::new();
    hash_slack(&mut h, &gate);
    assert_ne!(h.finish(), base_digest);
}

#[test]
fn mail_config_every_field_changes_digest() {
    use hm_middlewares::MailConfig;

    let digest = |c: &MailConfig| {
        let mut h = FieldHasher::new();
        hash_mail(&mut h, c);
        h.finish()
    };

    let base = MailConfig::default();
    let variants = [
        MailConfig { smtp_host: "mail.example".into(), ..base.clone() },
        MailConfig { smtp_port: 587, ..base.clone() },
        MailConfig { smtp_user: "u".into(), ..base.clone() },
        MailConfig { smtp_password: "p".into(), ..base.clone() },
        MailConfig { email_to: "a@b".into(), ..base.clone() },
        MailConfig { email_from: "c@d".into(), ..base.clone() },
        MailConfig { only_on_error: true, ..base.clone() },
    ];
    for variant in &variants {
        assert_ne!(digest(variant), digest(&base), "{variant:?}");
    }
}
