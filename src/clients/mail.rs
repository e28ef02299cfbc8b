//! Outbound mail as an injected capability.
//!
//! The password-reset flow only ever talks to the [`Mailer`] trait, so the
//! mutation logic is testable without a real relay. The production
//! implementation posts to an HTTP mail relay; the in-memory one records
//! messages and can be told to fail.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::config::MailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Delivers through an HTTP mail relay API (JSON POST, bearer key).
pub struct HttpRelayMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpRelayMailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("Notedesk/1.0")
            .build()
            .context("Failed to build mail relay HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpRelayMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = RelayMessage {
            from: &self.config.from_address,
            to,
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&self.config.relay_url)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await
            .context("Mail relay request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Mail relay rejected message: {status}");
        }

        info!("Mail delivered to {to}: {subject}");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records messages instead of delivering them. Used when mail is disabled
/// in config and by tests, which can also force delivery failures.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<SentMail>>,
    fail: AtomicBool,
}

impl MemoryMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("Mail delivery disabled by test");
        }

        debug!("Recording mail to {to}: {subject}");
        self.sent.lock().expect("mailer lock poisoned").push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });

        Ok(())
    }
}
