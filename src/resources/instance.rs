//! Compute Engine instance cost model
//!
//! An instance is priced as cores plus memory. Both components are matched in
//! the catalog bucket of the instance's usage type; pricing is completed for
//! both or for neither.

use crate::billing::matcher::{find_sku, MatchPolicy, SkuKind, SkuQuery};
use crate::billing::pricing::{self, PricingInfo};
use crate::billing::CatalogIndex;
use crate::error::{CostError, Result};
use crate::resources::description::Description;
use crate::resources::reference::ReferenceData;
use crate::resources::CostModel;
use crate::units;
use serde::Serialize;
use tracing::debug;

/// Region of a zone ("us-central1-a" -> "us-central1").
pub fn region_of_zone(zone: &str) -> Result<&str> {
    match zone.rfind('-') {
        Some(i) if i > 0 && i + 1 < zone.len() => Ok(&zone[..i]),
        _ => Err(CostError::InvalidZoneFormat(zone.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreInfo {
    /// Resource group of the matched SKU; empty until priced.
    pub resource_group: String,
    pub number: u32,
    pub fractional_core_share: f64,
    pub pricing: Option<PricingInfo>,
}

impl CoreInfo {
    pub fn total_price(&self) -> Result<f64> {
        let pricing = self.pricing.as_ref().ok_or(CostError::PricingIncomplete)?;
        Ok(pricing.hourly_unit_price * self.number as f64 * self.fractional_core_share)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryInfo {
    /// Resource group of the matched SKU; empty until priced.
    pub resource_group: String,
    pub amount_gib: f64,
    pub extended: bool,
    pub pricing: Option<PricingInfo>,
}

impl MemoryInfo {
    /// Memory expressed in the pricing unit of the matched SKU.
    pub fn billed_units(&self) -> Result<f64> {
        let pricing = self.pricing.as_ref().ok_or(CostError::PricingIncomplete)?;
        units::convert("gib", self.amount_gib, pricing.unit_magnitude())
            .map_err(|_| CostError::UnsupportedUnit(pricing.usage_unit.clone()))
    }

    pub fn total_price(&self) -> Result<f64> {
        let units = self.billed_units()?;
        let pricing = self.pricing.as_ref().ok_or(CostError::PricingIncomplete)?;
        Ok(pricing.hourly_unit_price * units)
    }
}

/// A `google_compute_instance`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeInstance {
    pub id: String,
    pub name: String,
    pub machine_type: String,
    pub region: String,
    pub zone: String,
    pub usage_type: String,
    pub description: Description,
    pub cores: CoreInfo,
    pub memory: MemoryInfo,
}

impl ComputeInstance {
    /// Build an unpriced instance, resolving its shape from reference data.
    pub fn new(
        reference: &dyn ReferenceData,
        name: impl Into<String>,
        id: impl Into<String>,
        machine_type: impl Into<String>,
        zone: impl Into<String>,
        usage_type: impl Into<String>,
    ) -> Result<Self> {
        let machine_type = machine_type.into();
        let zone = zone.into();
        let usage_type = usage_type.into();

        let region = region_of_zone(&zone)?.to_string();
        let description = Description::for_instance(&machine_type, &usage_type)?;
        let (core_count, memory_gib) = reference.machine_details(&machine_type)?;

        Ok(Self {
            id: id.into(),
            name: name.into(),
            cores: CoreInfo {
                resource_group: String::new(),
                number: core_count,
                fractional_core_share: reference.fractional_core_share(&machine_type),
                pricing: None,
            },
            memory: MemoryInfo {
                resource_group: String::new(),
                amount_gib: memory_gib,
                extended: machine_type.ends_with("-ext"),
                pricing: None,
            },
            machine_type,
            region,
            zone,
            usage_type,
            description,
        })
    }

    fn memory_description(&self) -> Description {
        if self.memory.extended {
            self.description.refined(&["Extended"], &[])
        } else {
            self.description.refined(&[], &["Extended"])
        }
    }
}

impl CostModel for ComputeInstance {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_type(&self) -> &str {
        &self.machine_type
    }

    fn complete_pricing(&mut self, catalog: &CatalogIndex, policy: MatchPolicy) -> Result<()> {
        let core_skus = catalog.lookup_cores(&self.usage_type)?;
        let core_query = SkuQuery {
            kind: SkuKind::Core,
            description: &self.description,
            region: &self.region,
            usage_type: Some(&self.usage_type),
            resource_group: None,
        };
        let core_sku = find_sku(core_skus, &core_query, policy)?;
        let core_pricing = pricing::extract_for(SkuKind::Core, core_sku, 0.0)?;

        let ram_skus = catalog.lookup_ram(&self.usage_type)?;
        let memory_description = self.memory_description();
        let ram_query = SkuQuery {
            kind: SkuKind::Memory,
            description: &memory_description,
            ..core_query
        };
        let ram_sku = find_sku(ram_skus, &ram_query, policy)?;
        let ram_pricing = pricing::extract_for(SkuKind::Memory, ram_sku, self.memory.amount_gib)?;

        debug!(
            instance = %self.name,
            core_sku = %core_sku.description,
            ram_sku = %ram_sku.description,
            "Priced instance"
        );
        self.cores.resource_group = core_sku.category.resource_group.clone();
        self.cores.pricing = Some(core_pricing);
        self.memory.resource_group = ram_sku.category.resource_group.clone();
        self.memory.pricing = Some(ram_pricing);
        Ok(())
    }

    fn total_price(&self) -> Result<f64> {
        Ok(self.cores.total_price()? + self.memory.total_price()?)
    }
}
