// HTTP implementation of RentalApi on top of reqwest
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::{decode_ack, decode_envelope, ApiError, ClientConfig, ClientError, RentalApi, RetryConfig};
use crate::cache::{CacheConfig, CacheStatsReport, DetailCache};
use crate::models::{CatalogItem, Rental, RentalCreated, RentalRequest};

pub struct HttpRentalClient {
    http: Client,
    config: ClientConfig,
    details: DetailCache,
}

impl HttpRentalClient {
    pub fn new(config: ClientConfig, cache_config: CacheConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        info!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "rental client ready");
        Ok(Self {
            http,
            config,
            details: DetailCache::new(cache_config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStatsReport {
        self.details.stats()
    }

    /// Joins `path` onto the base url, which is treated as a directory.
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.config.base_url, path)
    }

    // Helper to calculate exponential backoff with jitter
    pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
        let base_backoff_ms = (config.initial_backoff_ms as f64
            * config.backoff_multiplier.powf(retry_attempt as f64))
        .min(config.max_backoff_ms as f64);

        let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
        let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

        Duration::from_millis(backoff_ms as u64)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    // Returns status and body text; decoding happens in the caller
    async fn send(&self, request: RequestBuilder) -> Result<(u16, String), ApiError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(status, bytes = body.len(), "response received");
        Ok((status, body))
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms)
        } else {
            ApiError::Network(error.to_string())
        }
    }

    // GETs are idempotent, so transient failures are retried with backoff
    async fn get_with_retry<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let retry = &self.config.retry_config;
        let mut attempt = 0;

        loop {
            let result = self
                .send(self.request(Method::GET, path))
                .await
                .and_then(|(status, body)| decode_envelope(status, &body));

            match result {
                Err(error) if error.is_retryable() && attempt < retry.max_retries => {
                    let backoff = Self::calculate_backoff(attempt, retry);
                    warn!(path, attempt, backoff_ms = backoff.as_millis() as u64, %error, "retrying request");
                    sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl RentalApi for HttpRentalClient {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, ApiError> {
        let items: Vec<CatalogItem> = self.get_with_retry("caftans").await?;
        for item in &items {
            self.details.store(item.clone());
        }
        info!(count = items.len(), "catalog loaded");
        Ok(items)
    }

    async fn get_item(&self, id: i64) -> Result<CatalogItem, ApiError> {
        if let Some(item) = self.details.get(id) {
            debug!(item_id = id, "item served from cache");
            return Ok(item);
        }

        let item: CatalogItem = self.get_with_retry(&format!("caftans/{}", id)).await?;
        self.details.store(item.clone());
        Ok(item)
    }

    async fn create_rental(&self, request: &RentalRequest) -> Result<RentalCreated, ApiError> {
        info!(item_id = request.caftan_id, start = %request.start_date, end = %request.end_date, "submitting rental");
        let (status, body) = self
            .send(self.request(Method::POST, "rentals").json(request))
            .await?;
        let created: RentalCreated = decode_envelope(status, &body)?;
        info!(rental_id = created.rental.id, "rental created");
        Ok(created)
    }

    async fn list_rentals(&self) -> Result<Vec<Rental>, ApiError> {
        let rentals: Vec<Rental> = self.get_with_retry("rentals").await?;
        info!(count = rentals.len(), "rentals loaded");
        Ok(rentals)
    }

    async fn delete_rental(&self, id: i64) -> Result<(), ApiError> {
        let (status, body) = self
            .send(self.request(Method::DELETE, &format!("rentals/{}", id)))
            .await?;
        decode_ack(status, &body)?;
        info!(rental_id = id, "rental deleted");
        Ok(())
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("http://10.0.2.2:8000/api/", "caftans", "http://10.0.2.2:8000/api/caftans"; "#1 trailing slash")]
    #[test_case("http://10.0.2.2:8000/api", "caftans/3", "http://10.0.2.2:8000/api/caftans/3"; "#2 no trailing slash")]
    #[test_case("https://rentals.example/", "/rentals", "https://rentals.example/rentals"; "#3 leading slash on path")]
    fn test_join_url(base: &str, path: &str, expected: &str) {
        assert_eq!(join_url(base, path), expected);
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let config = RetryConfig {
            jitter_factor: 0.0,
            ..RetryConfig::default()
        };

        assert_eq!(HttpRentalClient::calculate_backoff(0, &config), Duration::from_millis(100));
        assert_eq!(HttpRentalClient::calculate_backoff(2, &config), Duration::from_millis(400));
        assert_eq!(HttpRentalClient::calculate_backoff(20, &config), Duration::from_millis(10000));
    }

    #[test]
    fn test_backoff_jitter_stays_in_band() {
        let config = RetryConfig::default();
        for _ in 0..100 {
            let backoff = HttpRentalClient::calculate_backoff(1, &config).as_millis();
            // 200ms base, +/- 5%
            assert!((190..=210).contains(&backoff), "backoff {} out of band", backoff);
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ClientConfig {
            base_url: "10.0.2.2:8000/api".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            HttpRentalClient::new(config, CacheConfig::default()),
            Err(ClientError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_cached_item_skips_network() {
        // Nothing listens on this port; a cache hit must not try to connect
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9/api/".to_string(),
            timeout_ms: 200,
            retry_config: RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            },
        };
        let client = HttpRentalClient::new(config, CacheConfig::default()).unwrap();
        client.details.store(CatalogItem {
            id: 7,
            name: "Caftan Fassi".to_string(),
            size: Some("L".to_string()),
            price: "120.00".to_string(),
            image_url: None,
            availability: true,
            created_at: None,
            updated_at: None,
        });

        let item = client.get_item(7).await.unwrap();
        assert_eq!(item.name, "Caftan Fassi");
        assert_eq!(client.cache_stats().hit_count, 1);
        assert_eq!(client.endpoint("caftans/7"), "http://127.0.0.1:9/api/caftans/7");
    }
}
