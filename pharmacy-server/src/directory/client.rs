//! Duty-pharmacy directory HTTP client.
//!
//! Provides async methods for querying the remote directory. Handles
//! authentication, the response envelope, and rate limiting via a
//! concurrency bound.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::domain::Place;

use super::DutyDirectory;
use super::error::DirectoryError;
use super::types::{Envelope, PlaceDto, RawPharmacy};

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Configuration for the directory client.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Base URL of the directory API
    pub base_url: String,
    /// API key sent in the `authorization` header
    pub api_key: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl DirectoryConfig {
    /// Create a new config with the given base URL and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Client for the duty-pharmacy directory API.
///
/// Uses a semaphore to limit concurrent requests; the directory rate-limits
/// aggressively during the evening duty-list rush.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl DirectoryClient {
    /// Create a new directory client with the given configuration.
    pub fn new(config: DirectoryConfig) -> Result<Self, DirectoryError> {
        let mut headers = HeaderMap::new();

        // The directory takes the raw key in the authorization header.
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| DirectoryError::Api {
            status: 0,
            message: "invalid API key format".to_string(),
        })?;
        headers.insert(AUTHORIZATION, api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// GET a URL, unwrap the envelope, and return `data` (which may be
    /// absent even on success, e.g. an unknown pharmacy id).
    async fn get_optional<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, DirectoryError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DirectoryError::Api {
                status: 0,
                message: "semaphore closed".to_string(),
            })?;

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DirectoryError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| DirectoryError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        if !envelope.is_success() {
            return Err(DirectoryError::Rejected {
                message: envelope
                    .message
                    .unwrap_or_else(|| "no failure message".to_string()),
            });
        }

        Ok(envelope.data)
    }

    /// GET a URL where a successful envelope must carry data.
    async fn get_data<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, DirectoryError> {
        self.get_optional(url, query)
            .await?
            .ok_or_else(|| DirectoryError::Json {
                message: "successful response missing data field".to_string(),
                body: None,
            })
    }
}

impl DutyDirectory for DirectoryClient {
    async fn fetch_all_pharmacies(&self) -> Result<Vec<RawPharmacy>, DirectoryError> {
        self.get_data(format!("{}/all", self.base_url), &[]).await
    }

    async fn fetch_pharmacies_by_city(
        &self,
        city_slug: &str,
        district_slug: Option<&str>,
    ) -> Result<Vec<RawPharmacy>, DirectoryError> {
        let mut query = vec![("city", city_slug)];
        if let Some(district) = district_slug {
            query.push(("district", district));
        }
        self.get_data(self.base_url.clone(), &query).await
    }

    async fn fetch_cities(&self) -> Result<Vec<Place>, DirectoryError> {
        let dtos: Vec<PlaceDto> = self
            .get_data(format!("{}/cities", self.base_url), &[])
            .await?;
        Ok(dtos.into_iter().map(|d| Place::new(d.name, d.slug)).collect())
    }

    async fn fetch_districts(&self, city_slug: &str) -> Result<Vec<Place>, DirectoryError> {
        let dtos: Vec<PlaceDto> = self
            .get_data(format!("{}/cities", self.base_url), &[("city", city_slug)])
            .await?;
        Ok(dtos.into_iter().map(|d| Place::new(d.name, d.slug)).collect())
    }

    async fn fetch_pharmacy_by_id(&self, id: &str) -> Result<RawPharmacy, DirectoryError> {
        self.get_optional(format!("{}/pharmacy", self.base_url), &[("id", id)])
            .await?
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = DirectoryConfig::new("https://duty.example/api", "test-key");

        assert_eq!(config.base_url, "https://duty.example/api");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn config_builder() {
        let config = DirectoryConfig::new("https://duty.example/api", "test-key")
            .with_max_concurrent(10)
            .with_timeout(60);

        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn client_trims_trailing_slash() {
        let config = DirectoryConfig::new("https://duty.example/api/", "test-key");
        let client = DirectoryClient::new(config).unwrap();
        assert_eq!(client.base_url, "https://duty.example/api");
    }

    // Integration tests would require a real API key and make actual HTTP
    // requests; the resolver tests exercise the full flow against
    // MockDirectory instead.
}
