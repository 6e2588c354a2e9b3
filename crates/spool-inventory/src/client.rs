//! HTTP client for the inventory service

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::records::{FilamentRecord, Inventory, SpoolRecord, VendorRecord};
use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_ATTEMPTS: u32 = 3;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The engine's seam onto the inventory service.
///
/// The production implementation is [`InventoryClient`]; tests substitute a
/// scripted snapshot.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Fetch and join the full inventory snapshot.
    async fn fetch_inventory(&self) -> Result<Inventory>;
}

/// Typed client for a Spoolman-compatible inventory service.
#[derive(Clone)]
pub struct InventoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl InventoryClient {
    /// Create a client for the service at `base_url` (e.g.
    /// `http://localhost:7912`). A trailing slash is tolerated.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| Error::Transport {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET one resource collection, retrying connect/timeout failures with a
    /// doubling delay. HTTP error statuses and undecodable bodies are not
    /// retried; the service answered, it just said no.
    async fn get_json<T: DeserializeOwned>(&self, resource: &str) -> Result<T> {
        let url = format!("{}/api/v1/{}", self.base_url, resource);
        let mut delay = INITIAL_RETRY_DELAY;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.http.get(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        return Err(Error::Status { url, status });
                    }
                    let text = response.text().await.map_err(|source| Error::Transport {
                        url: url.clone(),
                        source,
                    })?;
                    return serde_json::from_str(&text).map_err(|e| Error::Schema {
                        url,
                        message: e.to_string(),
                    });
                }
                Err(source)
                    if (source.is_connect() || source.is_timeout())
                        && attempt < FETCH_ATTEMPTS =>
                {
                    tracing::info!(
                        %url,
                        attempt,
                        delay_secs = delay.as_secs(),
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(source) => return Err(Error::Transport { url, source }),
            }
        }
    }

    /// Fetch vendors, filaments and spools and join them into one snapshot.
    pub async fn fetch_inventory(&self) -> Result<Inventory> {
        tracing::debug!(url = %self.base_url, "fetching inventory");
        let vendors: Vec<VendorRecord> = self.get_json("vendor").await?;
        let filaments: Vec<FilamentRecord> = self.get_json("filament").await?;
        let spools: Vec<SpoolRecord> = self.get_json("spool").await?;
        tracing::info!(
            vendors = vendors.len(),
            filaments = filaments.len(),
            spools = spools.len(),
            "inventory loaded"
        );
        Ok(Inventory::assemble(vendors, filaments, spools))
    }

    /// Filaments with at least one active spool.
    pub async fn fetch_active_filaments(&self) -> Result<Vec<FilamentRecord>> {
        let inventory = self.fetch_inventory().await?;
        Ok(inventory
            .active_filaments()
            .into_iter()
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InventoryApi for InventoryClient {
    async fn fetch_inventory(&self) -> Result<Inventory> {
        InventoryClient::fetch_inventory(self).await
    }
}
