//! API client for the published plant catalog.
//!
//! This module provides the `ApiClient` struct for fetching plant
//! lists and the curated sort order from the catalog's static JSON
//! documents, plus the `PlantService` trait the repository uses so
//! tests can substitute an in-memory service.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{GrowZone, Plant};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the published catalog documents
const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/dlaporte/plantcache-data/main/catalog";

/// Document holding the full plant list
const PLANTS_DOCUMENT: &str = "plants.json";

/// Document holding the curated sort order (a plant list; the
/// precedence is the order of ids within it)
const SORT_ORDER_DOCUMENT: &str = "custom_plant_sort_order.json";

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
/// 1 second is polite to the server while not making users wait too long.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Remote source of plant data.
///
/// The repository reaches the network only through this trait.
#[async_trait]
pub trait PlantService: Send + Sync {
    /// Fetch the full plant catalog.
    async fn all_plants(&self) -> Result<Vec<Plant>>;

    /// Fetch the plants for a single grow zone.
    async fn plants_by_grow_zone(&self, zone: GrowZone) -> Result<Vec<Plant>>;

    /// Fetch the curated precedence list of plant ids.
    async fn plant_sort_order(&self) -> Result<Vec<String>>;
}

/// An entry in the sort-order document. Only the id matters; the rest
/// of the plant fields are ignored.
#[derive(Debug, Deserialize)]
struct SortOrderEntry {
    #[serde(rename = "plantId")]
    plant_id: String,
}

/// API client for the plant catalog.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client against the default published catalog.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a specific catalog base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, document: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, document);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    // Rate limited
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }
}

/// The catalog has no per-zone document; zone queries filter the full
/// list client-side.
fn filter_by_zone(plants: Vec<Plant>, zone: GrowZone) -> Vec<Plant> {
    plants
        .into_iter()
        .filter(|plant| plant.grow_zone() == zone)
        .collect()
}

#[async_trait]
impl PlantService for ApiClient {
    async fn all_plants(&self) -> Result<Vec<Plant>> {
        let plants: Vec<Plant> = self.get(PLANTS_DOCUMENT).await?;
        debug!(count = plants.len(), "Fetched plant catalog");
        Ok(plants)
    }

    async fn plants_by_grow_zone(&self, zone: GrowZone) -> Result<Vec<Plant>> {
        let plants = self.all_plants().await?;
        Ok(filter_by_zone(plants, zone))
    }

    async fn plant_sort_order(&self) -> Result<Vec<String>> {
        let entries: Vec<SortOrderEntry> = self.get(SORT_ORDER_DOCUMENT).await?;
        Ok(entries.into_iter().map(|entry| entry.plant_id).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
