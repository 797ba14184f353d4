// ABOUTME: Clients for the external CRM, email provider and PDF renderer
// ABOUTME: Each service sits behind a trait with HTTP and disabled implementations

pub mod config;
pub mod crm;
pub mod email;
pub mod error;
pub mod http;
pub mod pdf;
pub mod templates;

pub use config::{EmailConfig, Integrations, IntegrationsConfig};
pub use crm::{CrmClient, CrmContact, DisabledCrm, HttpCrmClient};
pub use email::{DisabledEmail, EmailMessage, EmailSender, HttpEmailSender};
pub use error::{IntegrationError, IntegrationResult};
pub use http::ServiceConfig;
pub use pdf::{DisabledPdf, HttpPdfRenderer, PdfRenderer};
pub use templates::RenderedEmail;
