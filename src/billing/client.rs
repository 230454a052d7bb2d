//! Billing catalog sources
//!
//! The engine consumes a flat SKU list. It comes either from the Cloud Billing
//! Catalog API (`CloudCatalogClient`) or from a JSON dump on disk
//! (`FileCatalogSource`). Both decode the same wire shape.

use crate::billing::sku::{CatalogPage, Sku};
use crate::error::{CostError, Result};
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Public Cloud Billing API root.
pub const DEFAULT_ENDPOINT: &str = "https://cloudbilling.googleapis.com/v1";

/// Largest page the catalog API serves.
pub const MAX_PAGE_SIZE: u32 = 5000;

/// Something that can list the SKUs of a billing service.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_skus(&self, service_id: &str) -> Result<Vec<Sku>>;
}

/// SKUs stored in a JSON file, either a catalog page or a bare array.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SkuDump {
    List(Vec<Sku>),
    Page(CatalogPage),
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn fetch_skus(&self, service_id: &str) -> Result<Vec<Sku>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let skus = match serde_json::from_str::<SkuDump>(&content)? {
            SkuDump::List(skus) => skus,
            SkuDump::Page(page) => page.skus,
        };
        debug!(
            path = %self.path.display(),
            service_id,
            count = skus.len(),
            "Loaded SKUs from file"
        );
        Ok(skus)
    }
}

/// Cloud Billing Catalog REST client.
#[derive(Debug, Clone)]
pub struct CloudCatalogClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    currency_code: String,
    page_size: u32,
    retry: ExponentialBackoffPolicy,
    show_progress: bool,
}

impl CloudCatalogClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            currency_code: "USD".to_string(),
            page_size: MAX_PAGE_SIZE,
            retry: ExponentialBackoffPolicy::for_cloud_api(),
            show_progress: true,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_currency(mut self, currency_code: impl Into<String>) -> Self {
        self.currency_code = currency_code.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_retry(mut self, retry: ExponentialBackoffPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    async fn fetch_page(&self, service_id: &str, page_token: &str) -> Result<CatalogPage> {
        let url = format!("{}/services/{}/skus", self.endpoint, service_id);
        let page_size = self.page_size.to_string();
        let mut query = vec![
            ("key", self.api_key.as_str()),
            ("currencyCode", self.currency_code.as_str()),
            ("pageSize", page_size.as_str()),
        ];
        if !page_token.is_empty() {
            query.push(("pageToken", page_token));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| CostError::CatalogSource {
                message: format!("request to {} failed", url),
                transient: true,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CostError::CatalogSource {
                message: format!("catalog API returned {}: {}", status, body.trim()),
                transient: status.is_server_error() || status.as_u16() == 429,
                source: None,
            });
        }

        let body = response.text().await.map_err(|e| CostError::CatalogSource {
            message: "failed to read catalog response".to_string(),
            transient: true,
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&body).map_err(|e| CostError::CatalogSource {
            message: "malformed catalog page".to_string(),
            transient: false,
            source: Some(Box::new(e)),
        })
    }

    fn spinner(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

#[async_trait]
impl CatalogSource for CloudCatalogClient {
    async fn fetch_skus(&self, service_id: &str) -> Result<Vec<Sku>> {
        let pb = self.spinner();
        pb.set_message("Fetching billing catalog...");

        let mut skus = Vec::new();
        let mut token = String::new();
        let mut pages = 0u32;
        loop {
            let client = self;
            let page_token = token.as_str();
            let page = match self
                .retry
                .execute_with_retry(move || client.fetch_page(service_id, page_token))
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };

            pages += 1;
            skus.extend(page.skus);
            pb.set_message(format!("Fetched {} SKUs ({} pages)", skus.len(), pages));

            if page.next_page_token.is_empty() {
                break;
            }
            token = page.next_page_token;
        }

        pb.finish_and_clear();
        info!(service_id, pages, count = skus.len(), "Fetched billing catalog");
        Ok(skus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SKU_JSON: &str = r#"{
        "description": "E2 Instance Core running in Americas",
        "category": {
            "serviceDisplayName": "Compute Engine",
            "resourceFamily": "Compute",
            "resourceGroup": "CPU",
            "usageType": "OnDemand"
        },
        "serviceRegions": ["us-central1"],
        "pricingInfo": [{
            "pricingExpression": {
                "usageUnitDescription": "hour",
                "tieredRates": [{"startUsageAmount": 0, "unitPrice": {"currencyCode": "USD", "units": "0", "nanos": 21811590}}]
            }
        }]
    }"#;

    fn dump(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_file_source_reads_page() {
        let file = dump(&format!(r#"{{"skus": [{}], "nextPageToken": ""}}"#, SKU_JSON));
        let skus = FileCatalogSource::new(file.path()).fetch_skus("6F81-5844-456A").await.unwrap();
        assert_eq!(skus.len(), 1);
        assert_eq!(skus[0].category.resource_group, "CPU");
    }

    #[tokio::test]
    async fn test_file_source_reads_bare_array() {
        let file = dump(&format!("[{}, {}]", SKU_JSON, SKU_JSON));
        let skus = FileCatalogSource::new(file.path()).fetch_skus("6F81-5844-456A").await.unwrap();
        assert_eq!(skus.len(), 2);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileCatalogSource::new("/nonexistent/skus.json");
        assert!(matches!(source.fetch_skus("x").await, Err(CostError::Io(_))));
    }

    #[test]
    fn test_builder_normalizes_endpoint_and_page_size() {
        let client = CloudCatalogClient::new("key")
            .with_endpoint("http://localhost:1234/v1/")
            .with_page_size(0);
        assert_eq!(client.endpoint, "http://localhost:1234/v1");
        assert_eq!(client.page_size, 1);
    }
}
