// ABOUTME: Wiring of the external service clients from configuration
// ABOUTME: Unconfigured services fall back to disabled implementations

use std::sync::Arc;

use tracing::info;

use crate::crm::{CrmClient, DisabledCrm, HttpCrmClient};
use crate::email::{DisabledEmail, EmailSender, HttpEmailSender};
use crate::error::IntegrationResult;
use crate::http::ServiceConfig;
use crate::pdf::{DisabledPdf, HttpPdfRenderer, PdfRenderer};

/// Settings for the three external services; `None` disables a service
#[derive(Debug, Clone, Default)]
pub struct IntegrationsConfig {
    pub crm: Option<ServiceConfig>,
    pub email: Option<EmailConfig>,
    pub pdf: Option<ServiceConfig>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub service: ServiceConfig,
    pub from: String,
    /// Inbox that receives new-lead notifications
    pub admin_recipient: Option<String>,
}

/// Shared handles to the external services
#[derive(Clone)]
pub struct Integrations {
    pub crm: Arc<dyn CrmClient>,
    pub email: Arc<dyn EmailSender>,
    pub pdf: Arc<dyn PdfRenderer>,
    pub admin_recipient: Option<String>,
}

impl Integrations {
    pub fn from_config(config: &IntegrationsConfig) -> IntegrationResult<Self> {
        let crm: Arc<dyn CrmClient> = match &config.crm {
            Some(service) => Arc::new(HttpCrmClient::new(service.clone())?),
            None => {
                info!("CRM not configured; lead sync will be skipped");
                Arc::new(DisabledCrm)
            }
        };

        let (email, admin_recipient): (Arc<dyn EmailSender>, Option<String>) = match &config.email {
            Some(email) => (
                Arc::new(HttpEmailSender::new(email.service.clone(), email.from.clone())?),
                email.admin_recipient.clone(),
            ),
            None => {
                info!("Email provider not configured; notifications will be skipped");
                (Arc::new(DisabledEmail), None)
            }
        };

        let pdf: Arc<dyn PdfRenderer> = match &config.pdf {
            Some(service) => Arc::new(HttpPdfRenderer::new(service.clone())?),
            None => {
                info!("PDF renderer not configured; timeline downloads are unavailable");
                Arc::new(DisabledPdf)
            }
        };

        Ok(Self {
            crm,
            email,
            pdf,
            admin_recipient,
        })
    }

    /// Every service disabled; used by tests and local development
    pub fn disabled() -> Self {
        Self {
            crm: Arc::new(DisabledCrm),
            email: Arc::new(DisabledEmail),
            pdf: Arc::new(DisabledPdf),
            admin_recipient: None,
        }
    }
}
