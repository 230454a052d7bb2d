//! Persistent disk cost model

use crate::billing::catalog::disk_resource_group;
use crate::billing::matcher::{find_sku, MatchPolicy, SkuKind, SkuQuery};
use crate::billing::pricing::{self, PricingInfo};
use crate::billing::CatalogIndex;
use crate::error::{CostError, Result};
use crate::resources::description::Description;
use crate::resources::instance::region_of_zone;
use crate::resources::reference::ReferenceData;
use crate::resources::CostModel;
use crate::units;
use serde::Serialize;
use tracing::debug;

/// A `google_compute_disk` or `google_compute_region_disk`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeDisk {
    pub name: String,
    pub id: String,
    pub disk_type: String,
    pub zones: Vec<String>,
    pub region: String,
    pub image: Option<String>,
    pub snapshot: Option<String>,
    pub size_gib: i64,
    pub description: Description,
    pub pricing: Option<PricingInfo>,
}

impl ComputeDisk {
    /// Build an unpriced disk.
    ///
    /// The size comes from `size` when given, else from the image, else from
    /// the type's default, and must lie within the type's bounds for the
    /// location. An explicit size smaller than the image is rejected.
    /// Snapshot sizes are not known, so a snapshot does not affect the size.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reference: &dyn ReferenceData,
        name: impl Into<String>,
        id: impl Into<String>,
        disk_type: impl Into<String>,
        zones: Vec<String>,
        image: Option<String>,
        snapshot: Option<String>,
        size: Option<i64>,
    ) -> Result<Self> {
        let disk_type = disk_type.into();
        let first_zone = zones
            .first()
            .ok_or_else(|| CostError::InvalidZoneFormat(String::new()))?;
        let region = region_of_zone(first_zone)?.to_string();
        let bounds = reference.disk_size_bounds(&disk_type, first_zone, &region)?;

        let size = size.filter(|s| *s > 0);
        let size_gib = match (&image, size) {
            (None, Some(s)) => s,
            (None, None) => bounds.default,
            (Some(img), None) => reference.image_disk_size(img)?,
            (Some(img), Some(s)) => {
                let image_size = reference.image_disk_size(img)?;
                if s < image_size {
                    return Err(CostError::ImageSmallerThanRequestedSize { size: s, image_size });
                }
                s
            }
        };

        if size_gib < bounds.min || size_gib > bounds.max {
            return Err(CostError::SizeOutOfRange {
                size: size_gib,
                min: bounds.min,
                max: bounds.max,
            });
        }

        let description = Description::for_disk(&disk_type, zones.len() > 1);
        Ok(Self {
            name: name.into(),
            id: id.into(),
            disk_type,
            zones,
            region,
            image,
            snapshot,
            size_gib,
            description,
            pricing: None,
        })
    }

    pub fn is_regional(&self) -> bool {
        self.zones.len() > 1
    }

    /// Size expressed in the pricing unit of the matched SKU.
    pub fn billed_units(&self) -> Result<f64> {
        let pricing = self.pricing.as_ref().ok_or(CostError::PricingIncomplete)?;
        units::convert("gib", self.size_gib as f64, pricing.unit_magnitude())
            .map_err(|_| CostError::UnsupportedUnit(pricing.usage_unit.clone()))
    }
}

impl CostModel for ComputeDisk {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_type(&self) -> &str {
        &self.disk_type
    }

    fn complete_pricing(&mut self, catalog: &CatalogIndex, policy: MatchPolicy) -> Result<()> {
        let skus = catalog.lookup_disks(&self.disk_type)?;
        let group = disk_resource_group(&self.disk_type)?;
        let query = SkuQuery {
            kind: SkuKind::Disk,
            description: &self.description,
            region: &self.region,
            usage_type: None,
            resource_group: Some(group),
        };
        let sku = find_sku(skus, &query, policy)?;
        let pricing = pricing::extract_for(SkuKind::Disk, sku, self.size_gib as f64)?;
        debug!(disk = %self.name, sku = %sku.description, "Priced disk");
        self.pricing = Some(pricing);
        Ok(())
    }

    fn total_price(&self) -> Result<f64> {
        let units = self.billed_units()?;
        let pricing = self.pricing.as_ref().ok_or(CostError::PricingIncomplete)?;
        Ok(units * pricing.hourly_unit_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::pricing::HOURS_PER_MONTH;
    use crate::billing::sku::{Category, Sku, TierRate};
    use crate::resources::reference::StaticReference;

    fn zones(z: &[&str]) -> Vec<String> {
        z.iter().map(|s| s.to_string()).collect()
    }

    fn disk(disk_type: &str, z: &[&str], image: Option<&str>, size: Option<i64>) -> Result<ComputeDisk> {
        let reference = StaticReference::builtin().unwrap();
        ComputeDisk::new(
            &reference,
            "data",
            "",
            disk_type,
            zones(z),
            image.map(String::from),
            None,
            size,
        )
    }

    fn storage_sku(description: &str, group: &str, unit: &str, nanos: i64) -> Sku {
        storage_sku_of_usage(description, group, "OnDemand", unit, nanos)
    }

    fn storage_sku_of_usage(description: &str, group: &str, usage_type: &str, unit: &str, nanos: i64) -> Sku {
        Sku::new(
            description,
            Category::new("Compute Engine", "Storage", group, usage_type),
            &["us-central1"],
            unit,
            vec![TierRate::new(0.0, "USD", nanos)],
        )
    }

    #[test]
    fn test_size_resolution_order() {
        assert_eq!(disk("pd-standard", &["us-central1-a"], None, Some(100)).unwrap().size_gib, 100);
        assert_eq!(disk("pd-standard", &["us-central1-a"], None, None).unwrap().size_gib, 500);
        assert_eq!(disk("pd-standard", &["us-central1-a"], None, Some(0)).unwrap().size_gib, 500);
        assert_eq!(disk("pd-ssd", &["us-central1-a"], Some("centos-7"), None).unwrap().size_gib, 20);
        assert_eq!(disk("pd-ssd", &["us-central1-a"], Some("centos-7"), Some(50)).unwrap().size_gib, 50);
    }

    #[test]
    fn test_size_validation() {
        assert!(matches!(
            disk("pd-ssd", &["us-central1-a"], Some("centos-7"), Some(15)),
            Err(CostError::ImageSmallerThanRequestedSize { size: 15, image_size: 20 })
        ));
        assert!(matches!(
            disk("pd-standard", &["us-central1-a"], None, Some(5)),
            Err(CostError::SizeOutOfRange { size: 5, min: 10, .. })
        ));
        assert!(matches!(
            disk("local-ssd", &["us-central1-a"], None, Some(500)),
            Err(CostError::SizeOutOfRange { max: 375, .. })
        ));
    }

    #[test]
    fn test_regional_disk() {
        let d = disk("pd-standard", &["us-central1-a", "us-central1-b"], None, Some(300)).unwrap();
        assert!(d.is_regional());
        assert_eq!(d.region, "us-central1");
        assert!(d.description.contains.contains(&"Regional".to_string()));
    }

    #[test]
    fn test_invalid_zone() {
        assert!(matches!(disk("pd-standard", &["uscentral1"], None, None), Err(CostError::InvalidZoneFormat(_))));
        assert!(matches!(disk("pd-standard", &[], None, None), Err(CostError::InvalidZoneFormat(_))));
    }

    #[test]
    fn test_pd_standard_hourly_price() {
        let index = CatalogIndex::build(vec![
            storage_sku("Regional Storage PD Capacity", "PDStandard", "tebibyte month", 80_000_000_000),
            storage_sku("Storage PD Capacity", "PDStandard", "tebibyte month", 40_000_000_000),
        ]);
        let mut d = disk("pd-standard", &["us-central1-a"], None, Some(100)).unwrap();
        d.complete_pricing(&index, MatchPolicy::Reject).unwrap();
        let expected = 100.0 / 1024.0 * 40.0 / HOURS_PER_MONTH;
        assert!((d.total_price().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_disk_matches_any_usage_type() {
        let index = CatalogIndex::build(vec![storage_sku_of_usage(
            "Storage PD Capacity",
            "PDStandard",
            "Commit1Yr",
            "gibibyte month",
            40_000_000,
        )]);
        let mut d = disk("pd-standard", &["us-central1-a"], None, Some(100)).unwrap();
        d.complete_pricing(&index, MatchPolicy::Reject).unwrap();
        let expected = 100.0 * 0.04 / HOURS_PER_MONTH;
        assert!((d.total_price().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_disk_unit() {
        let index = CatalogIndex::build(vec![storage_sku("SSD backed PD Capacity", "SSD", "gibibite month", 170_000_000)]);
        let mut d = disk("pd-ssd", &["us-central1-a"], None, Some(100)).unwrap();
        assert!(matches!(
            d.complete_pricing(&index, MatchPolicy::Warn),
            Err(CostError::UnsupportedUnit(_))
        ));
        assert!(d.pricing.is_none());
    }
}
