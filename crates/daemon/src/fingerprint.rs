// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content fingerprinting: a stable 64-bit digest over an explicit field
//! walk.
//!
//! Every hashed field is framed as `len(tag) tag len(value) value`, so two
//! different field walks can never collide by concatenation. There is no
//! reflection: each config type enumerates its fields by hand, and the
//! fingerprint tests pin the digests so a field added to a struct but not
//! to its walk shows up as a failure.

use hm_middlewares::{GotifyConfig, MailConfig, OverlapConfig, SaveConfig, SlackConfig};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Incremental field hasher.
pub struct FieldHasher {
    hasher: Sha256,
}

impl FieldHasher {
    pub fn new() -> Self {
        Self { hasher: Sha256::new() }
    }

    fn frame(&mut self, tag: &str, value: &[u8]) {
        self.hasher.update((tag.len() as u64).to_be_bytes());
        self.hasher.update(tag.as_bytes());
        self.hasher.update((value.len() as u64).to_be_bytes());
        self.hasher.update(value);
    }

    pub fn str(&mut self, tag: &str, value: &str) -> &mut Self {
        self.frame(tag, value.as_bytes());
        self
    }

    pub fn bool(&mut self, tag: &str, value: bool) -> &mut Self {
        self.frame(tag, &[value as u8]);
        self
    }

    pub fn u64(&mut self, tag: &str, value: u64) -> &mut Self {
        self.frame(tag, &value.to_be_bytes());
        self
    }

    pub fn duration(&mut self, tag: &str, value: Duration) -> &mut Self {
        self.u64(tag, value.as_millis() as u64)
    }

    /// Hash a list in order; element order is semantically significant.
    pub fn list(&mut self, tag: &str, values: &[String]) -> &mut Self {
        self.u64(tag, values.len() as u64);
        for (i, value) in values.iter().enumerate() {
            self.frame(&format!("{}[{}]", tag, i), value.as_bytes());
        }
        self
    }

    /// First 8 bytes of the SHA-256 digest, big-endian.
    pub fn finish(self) -> u64 {
        let digest = self.hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(bytes)
    }
}

impl Default for FieldHasher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn hash_overlap(h: &mut FieldHasher, c: &OverlapConfig) {
    h.bool("overlap.no-overlap", c.no_overlap);
}

pub fn hash_slack(h: &mut FieldHasher, c: &SlackConfig) {
    h.str("slack.webhook", &c.webhook).bool("slack.only-on-error", c.only_on_error);
}

pub fn hash_save(h: &mut FieldHasher, c: &SaveConfig) {
    h.str("save.folder", &c.folder)
        .bool("save.only-on-error", c.only_on_error)
        .bool("save.exec-context", c.exec_context);
}

pub fn hash_mail(h: &mut FieldHasher, c: &MailConfig) {
    h.str("mail.smtp-host", &c.smtp_host)
        .u64("mail.smtp-port", c.smtp_port as u64)
        .str("mail.smtp-user", &c.smtp_user)
        .str("mail.smtp-password", &c.smtp_password)
        .str("mail.email-to", &c.email_to)
        .str("mail.email-from", &c.email_from)
        .bool("mail.only-on-error", c.only_on_error);
}

pub fn hash_gotify(h: &mut FieldHasher, c: &GotifyConfig) {
    h.str("gotify.url", &c.url)
        .str("gotify.token", &c.token)
        .bool("gotify.only-on-error", c.only_on_error)
        .u64("gotify.priority", c.priority as u64);
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
