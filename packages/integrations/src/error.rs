// ABOUTME: Error type for calls to external services
// ABOUTME: Distinguishes unconfigured services from network and API failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("{0} integration is not configured")]
    NotConfigured(&'static str),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("{service} returned HTTP {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}

pub type IntegrationResult<T> = Result<T, IntegrationError>;

impl IntegrationError {
    /// Unconfigured services are skipped, not failed
    pub fn is_not_configured(&self) -> bool {
        matches!(self, IntegrationError::NotConfigured(_))
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        IntegrationError::Network(err.to_string())
    }
}
