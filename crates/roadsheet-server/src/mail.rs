use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Email is not configured")]
    NotConfigured,

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// File attached to an outgoing email
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Outgoing mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Pick the transport the configuration allows
pub fn from_config(config: &Config) -> Arc<dyn Mailer> {
    match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(
            &config.mail_api_url,
            key,
            &config.email_from,
        )),
        None => {
            tracing::warn!("RESEND_API_KEY not set, outgoing email is disabled");
            Arc::new(DisabledMailer)
        }
    }
}

/// Rejects every send
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}

#[derive(Serialize)]
struct ApiAttachment {
    filename: String,
    content: String,
}

#[derive(Serialize)]
struct ApiEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    text: &'a str,
    attachments: Vec<ApiAttachment>,
}

/// Client for a Resend-compatible HTTP mail API
pub struct ResendMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_url: &str, api_key: &str, from: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/emails", api_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }
}

fn encode_attachments(attachments: &[Attachment]) -> Vec<ApiAttachment> {
    attachments
        .iter()
        .map(|attachment| ApiAttachment {
            filename: attachment.filename.clone(),
            content: STANDARD.encode(&attachment.content),
        })
        .collect()
}

/// Best-effort message out of a provider error body
fn rejection_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(String::from))
        })
        .unwrap_or_else(|| format!("Mail provider returned status {}", status))
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let payload = ApiEmail {
            from: &self.from,
            to: vec![email.to.as_str()],
            subject: &email.subject,
            text: &email.text,
            attachments: encode_attachments(&email.attachments),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Sent \"{}\" to {}", email.subject, email.to);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            message: rejection_message(status.as_u16(), &body),
        })
    }
}

/// Records sent mail instead of delivering it
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<OutgoingEmail>>,
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}
