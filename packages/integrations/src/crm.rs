// ABOUTME: CRM contact synchronisation client
// ABOUTME: Upserts leads as CRM contacts over the CRM's HTTP API

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IntegrationError, IntegrationResult};
use crate::http::{build_client, check_status, ServiceConfig};

const SERVICE: &str = "CRM";

/// Contact payload sent to the CRM
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmContact {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub source: String,
    pub tags: Vec<String>,
    pub custom_fields: BTreeMap<String, String>,
}

impl CrmContact {
    /// Split a free-form full name into first and last name
    pub fn with_full_name(mut self, name: Option<&str>) -> Self {
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            match name.split_once(' ') {
                Some((first, last)) => {
                    self.first_name = Some(first.to_string());
                    self.last_name = Some(last.trim().to_string());
                }
                None => self.first_name = Some(name.to_string()),
            }
        }
        self
    }
}

#[derive(Debug, Deserialize)]
struct UpsertContactResponse {
    id: String,
}

#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Create or update the contact, returning the CRM's contact id
    async fn upsert_contact(&self, contact: &CrmContact) -> IntegrationResult<String>;
}

/// CRM client speaking the CRM's REST API
pub struct HttpCrmClient {
    client: Client,
    config: ServiceConfig,
}

impl HttpCrmClient {
    pub fn new(config: ServiceConfig) -> IntegrationResult<Self> {
        Ok(Self {
            client: build_client()?,
            config,
        })
    }
}

#[async_trait]
impl CrmClient for HttpCrmClient {
    async fn upsert_contact(&self, contact: &CrmContact) -> IntegrationResult<String> {
        let url = self.config.endpoint("contacts")?;
        debug!(email = %contact.email, "Upserting CRM contact");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(contact)
            .send()
            .await?;

        let body: UpsertContactResponse = check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| IntegrationError::InvalidResponse {
                service: SERVICE,
                message: e.to_string(),
            })?;

        Ok(body.id)
    }
}

/// Used when no CRM credentials are configured
pub struct DisabledCrm;

#[async_trait]
impl CrmClient for DisabledCrm {
    async fn upsert_contact(&self, _contact: &CrmContact) -> IntegrationResult<String> {
        Err(IntegrationError::NotConfigured(SERVICE))
    }
}
