//! SKU records from the Cloud Billing catalog
//!
//! `Sku` is the flattened, immutable view the engine works on. It deserializes
//! directly from the catalog wire shape (`pricingInfo[0].pricingExpression`),
//! so a page fetched over HTTP and a SKU dump on disk decode the same way.

use serde::{Deserialize, Deserializer};

/// Billing service id of Compute Engine.
pub const COMPUTE_ENGINE_SERVICE_ID: &str = "6F81-5844-456A";

/// Region sentinel for SKUs available everywhere.
pub const GLOBAL_REGION: &str = "global";

const NANOS_PER_UNIT: f64 = 1_000_000_000.0;

/// Billing category of a SKU.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub service_display_name: String,
    pub resource_family: String,
    pub resource_group: String,
    pub usage_type: String,
}

impl Category {
    pub fn new(
        service_display_name: impl Into<String>,
        resource_family: impl Into<String>,
        resource_group: impl Into<String>,
        usage_type: impl Into<String>,
    ) -> Self {
        Self {
            service_display_name: service_display_name.into(),
            resource_family: resource_family.into(),
            resource_group: resource_group.into(),
            usage_type: usage_type.into(),
        }
    }
}

/// Price of one usage unit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Money {
    pub currency_code: String,
    #[serde(deserialize_with = "de_int64")]
    pub units: i64,
    pub nanos: i64,
}

impl Money {
    /// Amount in currency units.
    pub fn amount(&self) -> f64 {
        self.units as f64 + self.nanos as f64 / NANOS_PER_UNIT
    }
}

/// A price valid from `start_usage_amount` usage units upward.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierRate {
    pub start_usage_amount: f64,
    pub unit_price: Money,
}

impl TierRate {
    pub fn new(start_usage_amount: f64, currency_code: impl Into<String>, nanos: i64) -> Self {
        Self {
            start_usage_amount,
            unit_price: Money {
                currency_code: currency_code.into(),
                units: 0,
                nanos,
            },
        }
    }
}

/// A priced catalog line item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireSku")]
pub struct Sku {
    pub description: String,
    pub category: Category,
    pub service_regions: Vec<String>,
    pub pricing_tiers: Vec<TierRate>,
    pub usage_unit_description: String,
}

impl Sku {
    pub fn new(
        description: impl Into<String>,
        category: Category,
        service_regions: &[&str],
        usage_unit_description: impl Into<String>,
        pricing_tiers: Vec<TierRate>,
    ) -> Self {
        Self {
            description: description.into(),
            category,
            service_regions: service_regions.iter().map(|r| r.to_string()).collect(),
            pricing_tiers,
            usage_unit_description: usage_unit_description.into(),
        }
    }

    /// Whether the SKU is sold in `region` (or globally).
    pub fn available_in(&self, region: &str) -> bool {
        self.service_regions
            .iter()
            .any(|r| r == region || r == GLOBAL_REGION)
    }
}

/// One page of `services/{id}/skus`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogPage {
    pub skus: Vec<Sku>,
    pub next_page_token: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WireSku {
    description: String,
    category: Category,
    service_regions: Vec<String>,
    pricing_info: Vec<WirePricingInfo>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WirePricingInfo {
    pricing_expression: WirePricingExpression,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WirePricingExpression {
    usage_unit_description: String,
    tiered_rates: Vec<TierRate>,
}

impl From<WireSku> for Sku {
    fn from(wire: WireSku) -> Self {
        // Only the current pricing entry is relevant.
        let expression = wire
            .pricing_info
            .into_iter()
            .next()
            .map(|p| p.pricing_expression)
            .unwrap_or_default();
        Sku {
            description: wire.description,
            category: wire.category,
            service_regions: wire.service_regions,
            pricing_tiers: expression.tiered_rates,
            usage_unit_description: expression.usage_unit_description,
        }
    }
}

/// int64 fields are encoded as JSON strings by the catalog API.
fn de_int64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Number(i64),
        Text(String),
    }

    match Int64::deserialize(deserializer)? {
        Int64::Number(n) => Ok(n),
        Int64::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
