//! Catalog index
//!
//! Partitions the flat SKU list into lookup tables. Core and RAM SKUs are
//! keyed by usage type, disk SKUs by resource group. The index is built once
//! per run and shared read-only by every resource that gets priced.

use crate::billing::sku::Sku;
use crate::error::{CostError, Result};
use std::collections::HashMap;
use tracing::debug;

const COMPUTE_FAMILY: &str = "Compute";
const STORAGE_FAMILY: &str = "Storage";

/// Resource group shared by N1 core and RAM SKUs.
const N1_STANDARD: &str = "N1Standard";

/// SKU lookup tables for Compute Engine instances and disks.
#[derive(Debug, Default, Clone)]
pub struct CatalogIndex {
    cores: HashMap<String, Vec<Sku>>,
    ram: HashMap<String, Vec<Sku>>,
    disks: HashMap<String, Vec<Sku>>,
}

impl CatalogIndex {
    /// Index a raw SKU list, preserving catalog order inside each bucket.
    pub fn build(skus: impl IntoIterator<Item = Sku>) -> Self {
        let mut index = CatalogIndex::default();
        let mut skipped = 0usize;

        for sku in skus {
            match sku.category.resource_family.as_str() {
                COMPUTE_FAMILY => index.add_compute_sku(sku),
                STORAGE_FAMILY => index
                    .disks
                    .entry(sku.category.resource_group.clone())
                    .or_default()
                    .push(sku),
                _ => skipped += 1,
            }
        }

        debug!(
            core_usage_types = index.cores.len(),
            ram_usage_types = index.ram.len(),
            disk_groups = index.disks.len(),
            skipped,
            "Indexed billing catalog"
        );
        index
    }

    fn add_compute_sku(&mut self, sku: Sku) {
        let group = sku.category.resource_group.as_str();
        let n1 = group == N1_STANDARD;
        let is_core = group == "CPU" || (n1 && !sku.description.contains("Ram"));
        let is_ram = group == "RAM" || (n1 && !sku.description.contains("Core"));

        let usage_type = sku.category.usage_type.clone();
        match (is_core, is_ram) {
            (true, true) => {
                self.cores.entry(usage_type.clone()).or_default().push(sku.clone());
                self.ram.entry(usage_type).or_default().push(sku);
            }
            (true, false) => self.cores.entry(usage_type).or_default().push(sku),
            (false, true) => self.ram.entry(usage_type).or_default().push(sku),
            (false, false) => {}
        }
    }

    /// Core SKUs of a usage type (`OnDemand`, `Preemptible`, `Commit1Yr`, ...).
    pub fn lookup_cores(&self, usage_type: &str) -> Result<&[Sku]> {
        self.cores
            .get(usage_type)
            .map(Vec::as_slice)
            .ok_or_else(|| CostError::NoSkuOfUsageType(usage_type.to_string()))
    }

    /// RAM SKUs of a usage type.
    pub fn lookup_ram(&self, usage_type: &str) -> Result<&[Sku]> {
        self.ram
            .get(usage_type)
            .map(Vec::as_slice)
            .ok_or_else(|| CostError::NoSkuOfUsageType(usage_type.to_string()))
    }

    /// Disk SKUs for a disk type such as `pd-standard`.
    pub fn lookup_disks(&self, disk_type: &str) -> Result<&[Sku]> {
        let group = disk_resource_group(disk_type)?;
        self.disks
            .get(group)
            .map(Vec::as_slice)
            .ok_or_else(|| CostError::NoSkuOfResourceGroup(group.to_string()))
    }

    /// Number of indexed SKUs, counting N1Standard SKUs once per bucket.
    pub fn len(&self) -> usize {
        [&self.cores, &self.ram, &self.disks]
            .iter()
            .flat_map(|m| m.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Billing resource group of a disk type.
pub fn disk_resource_group(disk_type: &str) -> Result<&'static str> {
    match disk_type {
        "pd-standard" => Ok("PDStandard"),
        "pd-ssd" | "pd-balanced" => Ok("SSD"),
        "local-ssd" => Ok("LocalSSD"),
        other => Err(CostError::InvalidDiskType(other.to_string())),
    }
}
