// ABOUTME: PDF rendering client
// ABOUTME: Posts an HTML document to the PDF renderer and returns the PDF bytes

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{IntegrationError, IntegrationResult};
use crate::http::{build_client, check_status, ServiceConfig};

const SERVICE: &str = "PDF";

/// Every PDF file starts with this marker
const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Serialize)]
struct RenderRequest<'a> {
    html: &'a str,
    format: &'a str,
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_html(&self, html: &str) -> IntegrationResult<Vec<u8>>;
}

pub struct HttpPdfRenderer {
    client: Client,
    config: ServiceConfig,
}

impl HttpPdfRenderer {
    pub fn new(config: ServiceConfig) -> IntegrationResult<Self> {
        Ok(Self {
            client: build_client()?,
            config,
        })
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render_html(&self, html: &str) -> IntegrationResult<Vec<u8>> {
        let url = self.config.endpoint("render")?;
        debug!(html_bytes = html.len(), "Rendering PDF");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&RenderRequest {
                html,
                format: "Letter",
            })
            .send()
            .await?;

        let bytes = check_status(SERVICE, response).await?.bytes().await?;

        if !bytes.starts_with(PDF_MAGIC) {
            return Err(IntegrationError::InvalidResponse {
                service: SERVICE,
                message: "response body is not a PDF document".to_string(),
            });
        }

        Ok(bytes.to_vec())
    }
}

pub struct DisabledPdf;

#[async_trait]
impl PdfRenderer for DisabledPdf {
    async fn render_html(&self, _html: &str) -> IntegrationResult<Vec<u8>> {
        Err(IntegrationError::NotConfigured(SERVICE))
    }
}
