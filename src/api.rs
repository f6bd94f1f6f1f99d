// Rental backend API: error types, client configuration and the async seam
// the screens talk through.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{ApiEnvelope, CatalogItem, Rental, RentalCreated, RentalRequest};

pub const DEFAULT_BASE_URL: &str = "http://10.0.2.2:8000/api/";
pub const BASE_URL_ENV: &str = "CAFTAN_API_URL";
pub const TIMEOUT_ENV: &str = "CAFTAN_API_TIMEOUT_MS";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    Status { status_code: u16, message: String },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Transient failures worth another attempt on idempotent calls.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::Status { status_code, .. } => *status_code >= 500 || *status_code == 429,
            ApiError::Rejected(_) | ApiError::Decode(_) => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => {
                "Network error. Please check your connection.".to_string()
            }
            ApiError::Status { status_code: 422, .. } => {
                "Validation error. Please check your inputs.".to_string()
            }
            ApiError::Status { status_code: 400, .. } => {
                "This caftan is not available for the selected dates.".to_string()
            }
            ApiError::Status { status_code: 404, .. } => {
                "The requested item no longer exists.".to_string()
            }
            ApiError::Status { status_code, .. } => format!("Request failed ({})", status_code),
            ApiError::Rejected(message) => format!("Request failed: {}", message),
            ApiError::Decode(_) => "Unexpected response from the server.".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_config: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
            retry_config: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `CAFTAN_API_URL` and `CAFTAN_API_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_ENV) {
            config.base_url = url.trim().to_string();
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            config.timeout_ms = timeout.trim().parse().map_err(|_| {
                ClientError::ConfigError(format!("{} must be a number of milliseconds, got {:?}", TIMEOUT_ENV, timeout))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "base url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

// Everything the screens need from the backend
#[async_trait]
pub trait RentalApi: Send + Sync {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, ApiError>;

    async fn get_item(&self, id: i64) -> Result<CatalogItem, ApiError>;

    async fn create_rental(&self, request: &RentalRequest) -> Result<RentalCreated, ApiError>;

    async fn list_rentals(&self) -> Result<Vec<Rental>, ApiError>;

    async fn delete_rental(&self, id: i64) -> Result<(), ApiError>;
}

/// Unwraps a `{success, message, data}` response body.
///
/// Non-2xx statuses become `ApiError::Status` carrying the server message
/// when the body has one.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    check_status(status, body)?;
    let envelope: ApiEnvelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    envelope.into_data()
}

/// Like `decode_envelope` for calls whose data is not used.
pub fn decode_ack(status: u16, body: &str) -> Result<(), ApiError> {
    check_status(status, body)?;
    let envelope: ApiEnvelope<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if envelope.success {
        Ok(())
    } else {
        Err(ApiError::Rejected(envelope.message))
    }
}

fn check_status(status: u16, body: &str) -> Result<(), ApiError> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .map(|envelope| envelope.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.trim().chars().take(200).collect());

    Err(ApiError::Status {
        status_code: status,
        message,
    })
}
