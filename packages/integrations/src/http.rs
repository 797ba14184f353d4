// ABOUTME: Shared HTTP plumbing for the external service clients
// ABOUTME: Base URL handling, bearer auth and status-code mapping

use std::time::Duration;

use reqwest::{Client, Response};
use url::Url;

use crate::error::{IntegrationError, IntegrationResult};

/// Request timeout for every external call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in an `IntegrationError::Api`
const MAX_ERROR_BODY: usize = 500;

/// Base URL and API key for one external service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: Url,
    pub api_key: String,
}

impl ServiceConfig {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> IntegrationResult<Self> {
        // A trailing slash keeps `join` from dropping the last path segment
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        let base_url = Url::parse(&normalized)
            .map_err(|e| IntegrationError::Configuration(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            base_url,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self, path: &str) -> IntegrationResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| IntegrationError::Configuration(e.to_string()))
    }
}

pub fn build_client() -> IntegrationResult<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| IntegrationError::Network(e.to_string()))
}

/// Turn non-2xx responses into `IntegrationError::Api`
pub async fn check_status(service: &'static str, response: Response) -> IntegrationResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(IntegrationError::Api {
        service,
        status: status.as_u16(),
        message: porchlight_core::truncate(body.trim(), MAX_ERROR_BODY),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = ServiceConfig::new("https://crm.example.com/api/v2", "key").unwrap();
        assert_eq!(
            config.endpoint("/contacts").unwrap().as_str(),
            "https://crm.example.com/api/v2/contacts"
        );
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let err = ServiceConfig::new("not a url", "key").unwrap_err();
        assert!(matches!(err, IntegrationError::Configuration(_)));
    }
}
