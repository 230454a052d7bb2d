//! Pricing extraction
//!
//! Turns a SKU's tiered rates into a single `PricingInfo`. Tiers are scanned
//! from the highest start amount down; the first tier accepted by the selector
//! wins. Disk SKUs are priced per month and are normalized to hourly here.

use crate::billing::matcher::SkuKind;
use crate::billing::sku::{Sku, TierRate};
use crate::error::{CostError, Result};
use crate::units;
use serde::Serialize;

/// Hours in the 30-day billing month used by disk SKUs.
pub const HOURS_PER_MONTH: f64 = 24.0 * 30.0;

/// Hours in a 365-day year.
pub const HOURS_PER_YEAR: f64 = 24.0 * 365.0;

/// Unit price of a matched SKU.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricingInfo {
    /// Usage unit description as published ("gibibyte hour", "hour", ...).
    pub usage_unit: String,
    /// Price of one usage unit for one hour, in `currency_type`.
    pub hourly_unit_price: f64,
    pub currency_type: String,
}

impl PricingInfo {
    /// Magnitude part of the usage unit ("gibibyte hour" -> "gibibyte").
    pub fn unit_magnitude(&self) -> &str {
        self.usage_unit.split(' ').next().unwrap_or_default()
    }

    fn monthly_to_hourly(mut self) -> Self {
        self.hourly_unit_price /= HOURS_PER_MONTH;
        self
    }
}

/// Selector accepting every tier, i.e. the top one.
pub fn top_tier(_: &TierRate) -> bool {
    true
}

/// Extract pricing from the highest tier accepted by `selector`.
pub fn extract<F>(sku: &Sku, selector: F) -> Result<PricingInfo>
where
    F: Fn(&TierRate) -> bool,
{
    let mut tiers: Vec<&TierRate> = sku.pricing_tiers.iter().collect();
    tiers.sort_by(|a, b| b.start_usage_amount.total_cmp(&a.start_usage_amount));

    let tier = tiers
        .into_iter()
        .find(|t| selector(t))
        .ok_or_else(|| CostError::NoPricingTier(sku.description.clone()))?;

    Ok(PricingInfo {
        usage_unit: sku.usage_unit_description.clone(),
        hourly_unit_price: tier.unit_price.amount(),
        currency_type: tier.unit_price.currency_code.clone(),
    })
}

/// Fail with `UnsupportedUnit` unless the SKU's unit magnitude converts.
fn ensure_convertible(pricing: &PricingInfo) -> Result<()> {
    if units::is_supported(pricing.unit_magnitude()) {
        Ok(())
    } else {
        Err(CostError::UnsupportedUnit(pricing.usage_unit.clone()))
    }
}

/// Extract hourly pricing for one kind of priced component.
///
/// `size_gib` is only consulted for disks, where it selects the usage tier.
pub fn extract_for(kind: SkuKind, sku: &Sku, size_gib: f64) -> Result<PricingInfo> {
    match kind {
        SkuKind::Core => extract(sku, top_tier),
        SkuKind::Memory => {
            let pricing = extract(sku, top_tier)?;
            ensure_convertible(&pricing)?;
            Ok(pricing)
        }
        SkuKind::Disk => {
            let candidate = PricingInfo {
                usage_unit: sku.usage_unit_description.clone(),
                ..PricingInfo::default()
            };
            ensure_convertible(&candidate)?;
            let usage = units::convert("gib", size_gib, candidate.unit_magnitude())?;
            let pricing = extract(sku, |t| t.start_usage_amount <= usage)?;
            Ok(pricing.monthly_to_hourly())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::sku::Category;

    fn tiered_sku(unit: &str, tiers: Vec<TierRate>) -> Sku {
        Sku::new(
            "Storage PD Capacity",
            Category::new("Compute Engine", "Storage", "PDStandard", "OnDemand"),
            &["us-central1"],
            unit,
            tiers,
        )
    }

    #[test]
    fn test_default_selector_uses_top_tier() {
        let sku = tiered_sku(
            "hour",
            vec![TierRate::new(0.0, "USD", 0), TierRate::new(100.0, "USD", 31_611_000)],
        );
        let p = extract(&sku, top_tier).unwrap();
        assert!((p.hourly_unit_price - 0.031611).abs() < 1e-12);
        assert_eq!(p.currency_type, "USD");
        assert_eq!(p.usage_unit, "hour");
    }

    #[test]
    fn test_selector_scans_downward() {
        let sku = tiered_sku(
            "gibibyte month",
            vec![
                TierRate::new(0.0, "USD", 40_000_000),
                TierRate::new(1024.0, "USD", 30_000_000),
            ],
        );
        let small = extract(&sku, |t| t.start_usage_amount <= 100.0).unwrap();
        assert!((small.hourly_unit_price - 0.04).abs() < 1e-12);
        let large = extract(&sku, |t| t.start_usage_amount <= 2048.0).unwrap();
        assert!((large.hourly_unit_price - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_no_pricing_tier() {
        let sku = tiered_sku("gibibyte month", vec![TierRate::new(10.0, "USD", 1)]);
        assert!(matches!(
            extract(&sku, |t| t.start_usage_amount <= 5.0),
            Err(CostError::NoPricingTier(_))
        ));
        let empty = tiered_sku("hour", vec![]);
        assert!(matches!(extract(&empty, top_tier), Err(CostError::NoPricingTier(_))));
    }

    #[test]
    fn test_disk_pricing_is_hourly() {
        let sku = tiered_sku("gibibyte month", vec![TierRate::new(0.0, "USD", 40_000_000)]);
        let p = extract_for(SkuKind::Disk, &sku, 100.0).unwrap();
        assert!((p.hourly_unit_price - 0.04 / HOURS_PER_MONTH).abs() < 1e-15);
        assert_eq!(p.unit_magnitude(), "gibibyte");
    }

    #[test]
    fn test_unsupported_units() {
        let disk = tiered_sku("gibibite month", vec![TierRate::new(0.0, "USD", 1)]);
        assert!(matches!(
            extract_for(SkuKind::Disk, &disk, 10.0),
            Err(CostError::UnsupportedUnit(u)) if u == "gibibite month"
        ));
        let ram = tiered_sku("count hour", vec![TierRate::new(0.0, "USD", 1)]);
        assert!(matches!(
            extract_for(SkuKind::Memory, &ram, 0.0),
            Err(CostError::UnsupportedUnit(_))
        ));
        // Core prices are per hour; the unit is never converted.
        assert!(extract_for(SkuKind::Core, &ram, 0.0).is_ok());
    }
}
