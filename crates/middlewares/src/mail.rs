// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mail sink: speaks plain SMTP (with optional AUTH LOGIN) directly over a
//! TCP stream.

use crate::report;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hm_core::{Context, JobError, Middleware};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailConfig {
    pub smtp_host: String,
    /// 0 means the SMTP default (25).
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    /// Comma-separated recipient list.
    pub email_to: String,
    pub email_from: String,
    pub only_on_error: bool,
}

impl MailConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn build(&self) -> Option<Arc<dyn Middleware>> {
        if self.is_empty() {
            None
        } else {
            Some(Arc::new(Mail { config: self.clone() }))
        }
    }

    fn port(&self) -> u16 {
        if self.smtp_port == 0 {
            25
        } else {
            self.smtp_port
        }
    }

    fn recipients(&self) -> Vec<&str> {
        self.email_to.split(',').map(str::trim).filter(|r| !r.is_empty()).collect()
    }
}

#[derive(Debug, Error)]
enum SmtpError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("server said: {0}")]
    Rejected(String),

    #[error("smtp exchange timed out")]
    Timeout,
}

pub struct Mail {
    config: MailConfig,
}

#[async_trait]
impl Middleware for Mail {
    async fn run(&self, ctx: &mut Context) -> Result<(), JobError> {
        let result = ctx.next().await;
        ctx.stop(result.as_ref().err());

        if report::should_report(self.config.only_on_error, &ctx.execution) {
            let subject = report::subject(ctx.job.as_ref(), &ctx.execution);
            let body = report::body(ctx.job.as_ref(), &ctx.execution);
            let msg = message(&self.config, &subject, &body);
            if let Err(e) = send(&self.config, &msg).await {
                error!(job = %ctx.job.name(), error = %e, "mail notification failed");
            }
        }

        result
    }

    fn continue_on_stop(&self) -> bool {
        true
    }
}

/// Build the RFC 5322 message text.
pub fn message(config: &MailConfig, subject: &str, body: &str) -> String {
    format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
        config.email_from,
        config.email_to,
        subject,
        body.replace('\n', "\r\n"),
    )
}

async fn send(config: &MailConfig, msg: &str) -> Result<(), SmtpError> {
    tokio::time::timeout(Duration::from_secs(15), send_inner(config, msg))
        .await
        .map_err(|_| SmtpError::Timeout)?
}

/// Drive the SMTP exchange: greeting, EHLO, optional AUTH LOGIN, envelope,
/// DATA, QUIT.
async fn send_inner(config: &MailConfig, msg: &str) -> Result<(), SmtpError> {
    let addr = format!("{}:{}", config.smtp_host, config.port());
    let stream = TcpStream::connect(&addr).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    expect(&mut reader, "220").await?;

    command(&mut write_half, &mut reader, "EHLO helmsman", "250").await?;

    if !config.smtp_user.is_empty() {
        command(&mut write_half, &mut reader, "AUTH LOGIN", "334").await?;
        let user = BASE64.encode(&config.smtp_user);
        command(&mut write_half, &mut reader, &user, "334").await?;
        let password = BASE64.encode(&config.smtp_password);
        command(&mut write_half, &mut reader, &password, "235").await?;
    }

    let from = format!("MAIL FROM:<{}>", config.email_from);
    command(&mut write_half, &mut reader, &from, "250").await?;
    for recipient in config.recipients() {
        let rcpt = format!("RCPT TO:<{}>", recipient);
        command(&mut write_half, &mut reader, &rcpt, "250").await?;
    }

    command(&mut write_half, &mut reader, "DATA", "354").await?;
    write_half.write_all(msg.as_bytes()).await?;
    command(&mut write_half, &mut reader, ".", "250").await?;
    command(&mut write_half, &mut reader, "QUIT", "221").await?;

    Ok(())
}

async fn command<W, R>(
    writer: &mut W,
    reader: &mut BufReader<R>,
    line: &str,
    expect_code: &str,
) -> Result<(), SmtpError>
where
    W: AsyncWriteExt + Unpin,
    R: tokio::io::AsyncRead + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    expect(reader, expect_code).await
}

/// Read one (possibly multi-line) SMTP reply and check its code.
async fn expect<R>(reader: &mut BufReader<R>, code: &str) -> Result<(), SmtpError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(SmtpError::Rejected("connection closed".to_string()));
        }
        // Continuation lines look like "250-..."; the final line "250 ...".
        if line.len() >= 4 && line.as_bytes()[3] == b'-' {
            continue;
        }
        if line.starts_with(code) {
            return Ok(());
        }
        return Err(SmtpError::Rejected(line.trim().to_string()));
    }
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
