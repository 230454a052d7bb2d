//! Billing catalog: SKU records, indexing, matching and pricing.

pub mod catalog;
pub mod client;
pub mod matcher;
pub mod pricing;
pub mod sku;

pub use catalog::CatalogIndex;
pub use client::{CatalogSource, CloudCatalogClient, FileCatalogSource};
pub use matcher::{find_sku, MatchPolicy, SkuKind, SkuQuery};
pub use pricing::{PricingInfo, HOURS_PER_MONTH, HOURS_PER_YEAR};
pub use sku::{Category, Sku, TierRate, COMPUTE_ENGINE_SERVICE_ID};
