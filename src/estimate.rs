//! Cost estimation over a decoded plan
//!
//! Each change is built, priced and diffed on its own. A failure is recorded
//! against its resource and the batch moves on.

use crate::billing::{CatalogIndex, MatchPolicy};
use crate::error::{CostError, Result};
use crate::plan::{Change, DecodedPlan, DiskSpec, InstanceSpec, ResourceChange};
use crate::resources::{
    ComputeDisk, ComputeInstance, InstanceDelta, ReferenceData, ResourceState,
};
use tracing::{info, warn};

/// A priced change.
#[derive(Debug, Clone)]
pub enum PricedResource {
    Instance {
        state: ResourceState<ComputeInstance>,
        delta: InstanceDelta,
    },
    Disk {
        state: ResourceState<ComputeDisk>,
        delta: f64,
    },
}

impl PricedResource {
    /// Hourly cost change of the resource.
    pub fn delta(&self) -> f64 {
        match self {
            PricedResource::Instance { delta, .. } => delta.total,
            PricedResource::Disk { delta, .. } => *delta,
        }
    }
}

/// Result of estimating one plan.
#[derive(Debug, Default)]
pub struct Estimate {
    pub resources: Vec<PricedResource>,
    pub failures: Vec<CostError>,
}

impl Estimate {
    /// Sum of the deltas of every priced resource.
    pub fn total_delta(&self) -> f64 {
        self.resources.iter().map(PricedResource::delta).sum()
    }

    pub fn instances(&self) -> impl Iterator<Item = (&ResourceState<ComputeInstance>, &InstanceDelta)> {
        self.resources.iter().filter_map(|r| match r {
            PricedResource::Instance { state, delta } => Some((state, delta)),
            PricedResource::Disk { .. } => None,
        })
    }

    pub fn disks(&self) -> impl Iterator<Item = (&ResourceState<ComputeDisk>, f64)> {
        self.resources.iter().filter_map(|r| match r {
            PricedResource::Disk { state, delta } => Some((state, *delta)),
            PricedResource::Instance { .. } => None,
        })
    }
}

/// Prices plan changes against a catalog built once per run.
pub struct Estimator<'a> {
    catalog: &'a CatalogIndex,
    reference: &'a dyn ReferenceData,
    policy: MatchPolicy,
}

impl<'a> Estimator<'a> {
    pub fn new(catalog: &'a CatalogIndex, reference: &'a dyn ReferenceData, policy: MatchPolicy) -> Self {
        Self {
            catalog,
            reference,
            policy,
        }
    }

    /// Price every change of `plan` in plan order.
    pub fn estimate(&self, plan: DecodedPlan) -> Estimate {
        let mut estimate = Estimate {
            resources: Vec::with_capacity(plan.changes.len()),
            failures: plan.failures,
        };

        for change in plan.changes {
            let address = change.address().to_string();
            match self.price_change(change) {
                Ok(priced) => estimate.resources.push(priced),
                Err(e) => {
                    warn!(resource = %address, "Could not price resource: {}", e);
                    estimate.failures.push(e);
                }
            }
        }

        info!(
            priced = estimate.resources.len(),
            failed = estimate.failures.len(),
            total_delta = estimate.total_delta(),
            "Estimated plan"
        );
        estimate
    }

    fn price_change(&self, change: ResourceChange) -> Result<PricedResource> {
        match change {
            ResourceChange::Instance(c) => {
                let mut state = self.instance_state(c)?;
                state.complete_pricing(self.catalog, self.policy)?;
                let delta = state.instance_delta()?;
                Ok(PricedResource::Instance { state, delta })
            }
            ResourceChange::Disk(c) => {
                let mut state = self.disk_state(c)?;
                state.complete_pricing(self.catalog, self.policy)?;
                let delta = state.delta()?;
                Ok(PricedResource::Disk { state, delta })
            }
        }
    }

    fn instance_state(&self, change: Change<InstanceSpec>) -> Result<ResourceState<ComputeInstance>> {
        let build = |spec: InstanceSpec| {
            ComputeInstance::new(
                self.reference,
                spec.name.clone(),
                spec.id.clone(),
                spec.machine_type.clone(),
                spec.zone.clone(),
                spec.usage_type.clone(),
            )
            .map_err(|e| e.for_resource(spec.name, spec.machine_type))
        };
        let before = change.before.map(build).transpose()?;
        let after = change.after.map(build).transpose()?;
        ResourceState::new(before, after, change.action)
            .map_err(|e| e.for_resource(change.address, crate::plan::INSTANCE_TYPE))
    }

    fn disk_state(&self, change: Change<DiskSpec>) -> Result<ResourceState<ComputeDisk>> {
        let build = |spec: DiskSpec| {
            ComputeDisk::new(
                self.reference,
                spec.name.clone(),
                spec.id,
                spec.disk_type.clone(),
                spec.zones,
                spec.image,
                spec.snapshot,
                spec.size,
            )
            .map_err(|e| e.for_resource(spec.name, spec.disk_type))
        };
        let before = change.before.map(build).transpose()?;
        let after = change.after.map(build).transpose()?;
        ResourceState::new(before, after, change.action)
            .map_err(|e| e.for_resource(change.address, crate::plan::DISK_TYPE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::sku::{Category, Sku, TierRate};
    use crate::resources::{Action, StaticReference};

    fn catalog() -> CatalogIndex {
        let sku = |d: &str, group: &str, unit: &str, nanos: i64| {
            Sku::new(
                d,
                Category::new("Compute Engine", "Compute", group, "OnDemand"),
                &["us-central1"],
                unit,
                vec![TierRate::new(0.0, "USD", nanos)],
            )
        };
        CatalogIndex::build(vec![
            sku("E2 Instance Core running in Americas", "CPU", "hour", 21_811_590),
            sku("E2 Instance Ram running in Americas", "RAM", "gibibyte hour", 2_923_530),
        ])
    }

    fn instance(name: &str, machine_type: &str, zone: &str) -> InstanceSpec {
        InstanceSpec {
            name: name.to_string(),
            id: String::new(),
            machine_type: machine_type.to_string(),
            zone: zone.to_string(),
            usage_type: "OnDemand".to_string(),
        }
    }

    #[test]
    fn test_partial_failures_do_not_stop_the_batch() {
        let catalog = catalog();
        let reference = StaticReference::builtin().unwrap();
        let plan = DecodedPlan {
            format_version: "0.1".to_string(),
            changes: vec![
                ResourceChange::Instance(Change {
                    address: "google_compute_instance.ok".to_string(),
                    action: Action::Create,
                    before: None,
                    after: Some(instance("ok", "e2-standard-2", "us-central1-a")),
                }),
                ResourceChange::Instance(Change {
                    address: "google_compute_instance.eu".to_string(),
                    action: Action::Create,
                    before: None,
                    after: Some(instance("eu", "e2-standard-2", "europe-west1-b")),
                }),
                ResourceChange::Instance(Change {
                    address: "google_compute_instance.bad".to_string(),
                    action: Action::Create,
                    before: None,
                    after: Some(instance("bad", "e2-standard-2", "nowhere")),
                }),
            ],
            failures: vec![],
        };

        let estimate = Estimator::new(&catalog, &reference, MatchPolicy::Warn).estimate(plan);
        assert_eq!(estimate.resources.len(), 1);
        assert_eq!(estimate.failures.len(), 2);
        assert!(matches!(estimate.failures[0].root(), CostError::NoMatchingSku { .. }));
        assert!(estimate.failures[0].to_string().starts_with("eu(e2-standard-2): "));
        assert!(matches!(estimate.failures[1].root(), CostError::InvalidZoneFormat(_)));

        let expected = 2.0 * 0.02181159 + 8.0 * 0.00292353;
        assert!((estimate.total_delta() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_delete_is_negative() {
        let catalog = catalog();
        let reference = StaticReference::builtin().unwrap();
        let plan = DecodedPlan {
            format_version: "0.1".to_string(),
            changes: vec![ResourceChange::Instance(Change {
                address: "google_compute_instance.gone".to_string(),
                action: Action::Delete,
                before: Some(instance("gone", "e2-medium", "us-central1-b")),
                after: None,
            })],
            failures: vec![],
        };
        let estimate = Estimator::new(&catalog, &reference, MatchPolicy::Warn).estimate(plan);
        let (_, delta) = estimate.instances().next().unwrap();
        assert!((delta.core + 2.0 * 0.02181159 * 0.5).abs() < 1e-12);
        assert!((delta.memory + 4.0 * 0.00292353).abs() < 1e-12);
        assert!(estimate.total_delta() < 0.0);
    }
}
