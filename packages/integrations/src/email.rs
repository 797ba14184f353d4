// ABOUTME: Transactional email client
// ABOUTME: Sends HTML emails through the email provider's HTTP API

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{IntegrationError, IntegrationResult};
use crate::http::{build_client, check_status, ServiceConfig};

const SERVICE: &str = "Email";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            html: html.into(),
            reply_to: None,
        }
    }

    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    #[serde(flatten)]
    message: &'a EmailMessage,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> IntegrationResult<()>;
}

pub struct HttpEmailSender {
    client: Client,
    config: ServiceConfig,
    from: String,
}

impl HttpEmailSender {
    pub fn new(config: ServiceConfig, from: impl Into<String>) -> IntegrationResult<Self> {
        Ok(Self {
            client: build_client()?,
            config,
            from: from.into(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> IntegrationResult<()> {
        if message.to.is_empty() {
            return Err(IntegrationError::Configuration(
                "email has no recipients".to_string(),
            ));
        }

        let url = self.config.endpoint("emails")?;
        debug!(subject = %message.subject, recipients = message.to.len(), "Sending email");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                message,
            })
            .send()
            .await?;

        check_status(SERVICE, response).await?;
        Ok(())
    }
}

pub struct DisabledEmail;

#[async_trait]
impl EmailSender for DisabledEmail {
    async fn send(&self, _message: &EmailMessage) -> IntegrationResult<()> {
        Err(IntegrationError::NotConfigured(SERVICE))
    }
}
