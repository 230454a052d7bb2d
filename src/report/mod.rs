//! Estimate reports
//!
//! An `Estimate` is first flattened into a serializable `Report`; the text,
//! JSON and HTML renderers all work from that.

mod html;
mod text;

use crate::billing::PricingInfo;
use crate::error::Result;
use crate::estimate::{Estimate, PricedResource};
use crate::resources::{ComputeDisk, ComputeInstance, InstanceDelta, ResourceState};
use serde::{Deserialize, Serialize};

pub use html::render_html;
pub use text::render_text;

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Html,
}

/// Price, quantity and cost of one billed component.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentCost {
    pub unit_cost: f64,
    pub units: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceCost {
    pub machine_type: String,
    pub zone: String,
    pub usage_type: String,
    pub cpu: ComponentCost,
    pub ram: ComponentCost,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceReport {
    pub name: String,
    pub id: String,
    pub action: String,
    pub machine_type: String,
    pub zone: String,
    pub before: Option<InstanceCost>,
    pub after: Option<InstanceCost>,
    pub delta: InstanceDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskReport {
    pub name: String,
    pub id: String,
    pub action: String,
    pub disk_type: String,
    pub zones: String,
    pub image: String,
    pub snapshot: String,
    pub before: Option<ComponentCost>,
    pub after: Option<ComponentCost>,
    pub delta: f64,
}

/// One priced resource, tagged with its kind in JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceReport {
    Instance(InstanceReport),
    Disk(DiskReport),
}

impl ResourceReport {
    pub fn id(&self) -> &str {
        match self {
            ResourceReport::Instance(i) => &i.id,
            ResourceReport::Disk(d) => &d.id,
        }
    }
}

/// Everything a renderer needs. Resources keep plan order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub pricing_unit: String,
    pub total_delta: f64,
    pub resources: Vec<ResourceReport>,
    pub failures: Vec<String>,
}

impl Report {
    pub fn from_estimate(estimate: &Estimate) -> Result<Self> {
        let resources = estimate
            .resources
            .iter()
            .map(|r| match r {
                PricedResource::Instance { state, delta } => {
                    instance_report(state, *delta).map(ResourceReport::Instance)
                }
                PricedResource::Disk { state, delta } => disk_report(state, *delta).map(ResourceReport::Disk),
            })
            .collect::<Result<Vec<_>>>()?;

        let currency = estimate
            .resources
            .iter()
            .filter_map(|r| match r {
                PricedResource::Instance { state, .. } => state.current().cores.pricing.as_ref(),
                PricedResource::Disk { state, .. } => state.current().pricing.as_ref(),
            })
            .map(|p: &PricingInfo| p.currency_type.clone())
            .next()
            .unwrap_or_else(|| "USD".to_string());

        Ok(Self {
            pricing_unit: format!("{}/hour", currency),
            total_delta: estimate.total_delta(),
            resources,
            failures: estimate.failures.iter().map(|e| e.to_string()).collect(),
        })
    }

    pub fn instances(&self) -> impl Iterator<Item = &InstanceReport> {
        self.resources.iter().filter_map(|r| match r {
            ResourceReport::Instance(i) => Some(i),
            ResourceReport::Disk(_) => None,
        })
    }

    pub fn disks(&self) -> impl Iterator<Item = &DiskReport> {
        self.resources.iter().filter_map(|r| match r {
            ResourceReport::Disk(d) => Some(d),
            ResourceReport::Instance(_) => None,
        })
    }
}

/// Render `estimate` in `format`.
pub fn render(estimate: &Estimate, format: OutputFormat, color: bool) -> Result<String> {
    let report = Report::from_estimate(estimate)?;
    match format {
        OutputFormat::Text => Ok(render_text(&report, color)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
        OutputFormat::Html => Ok(render_html(&report)),
    }
}

/// "a" when unchanged, "a -> b" otherwise; one-sided values pass through.
pub(crate) fn change(before: Option<&str>, after: Option<&str>) -> String {
    match (before, after) {
        (Some(b), Some(a)) if b != a => format!("{} -> {}", b, a),
        (Some(v), _) | (None, Some(v)) => v.to_string(),
        (None, None) => String::new(),
    }
}

fn instance_cost(instance: &ComputeInstance) -> Result<InstanceCost> {
    let unit_price = |p: &Option<PricingInfo>| p.as_ref().map_or(0.0, |p| p.hourly_unit_price);
    let cpu = ComponentCost {
        unit_cost: unit_price(&instance.cores.pricing),
        units: instance.cores.number as f64 * instance.cores.fractional_core_share,
        total_cost: instance.cores.total_price()?,
    };
    let ram = ComponentCost {
        unit_cost: unit_price(&instance.memory.pricing),
        units: instance.memory.billed_units()?,
        total_cost: instance.memory.total_price()?,
    };
    Ok(InstanceCost {
        machine_type: instance.machine_type.clone(),
        zone: instance.zone.clone(),
        usage_type: instance.usage_type.clone(),
        total_cost: cpu.total_cost + ram.total_cost,
        cpu,
        ram,
    })
}

fn instance_report(state: &ResourceState<ComputeInstance>, delta: InstanceDelta) -> Result<InstanceReport> {
    let (before, after) = (state.before(), state.after());
    let id = change(
        before.map(|i| i.id.as_str()).filter(|s| !s.is_empty()),
        after.map(|i| i.id.as_str()).filter(|s| !s.is_empty()),
    );
    Ok(InstanceReport {
        name: change(before.map(|i| i.name.as_str()), after.map(|i| i.name.as_str())),
        id: if id.is_empty() { "unknown".to_string() } else { id },
        action: state.action().to_string(),
        machine_type: change(
            before.map(|i| i.machine_type.as_str()),
            after.map(|i| i.machine_type.as_str()),
        ),
        zone: change(before.map(|i| i.zone.as_str()), after.map(|i| i.zone.as_str())),
        before: before.map(instance_cost).transpose()?,
        after: after.map(instance_cost).transpose()?,
        delta,
    })
}

fn disk_cost(disk: &ComputeDisk) -> Result<ComponentCost> {
    Ok(ComponentCost {
        unit_cost: disk.pricing.as_ref().map_or(0.0, |p| p.hourly_unit_price),
        units: disk.billed_units()?,
        total_cost: crate::resources::CostModel::total_price(disk)?,
    })
}

fn disk_report(state: &ResourceState<ComputeDisk>, delta: f64) -> Result<DiskReport> {
    let (before, after) = (state.before(), state.after());
    let text = |f: fn(&ComputeDisk) -> String| change(before.map(f).as_deref(), after.map(f).as_deref());
    let id = text(|d| d.id.clone());
    Ok(DiskReport {
        name: text(|d| d.name.clone()),
        id: if id.is_empty() { "unknown".to_string() } else { id },
        action: state.action().to_string(),
        disk_type: text(|d| d.disk_type.clone()),
        zones: text(|d| {
            let mut zones = d.zones.clone();
            zones.sort();
            zones.join(", ")
        }),
        image: text(|d| d.image.clone().unwrap_or_default()),
        snapshot: text(|d| d.snapshot.clone().unwrap_or_default()),
        before: before.map(disk_cost).transpose()?,
        after: after.map(disk_cost).transpose()?,
        delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change() {
        assert_eq!(change(Some("a"), Some("a")), "a");
        assert_eq!(change(Some("a"), Some("b")), "a -> b");
        assert_eq!(change(None, Some("b")), "b");
        assert_eq!(change(Some("a"), None), "a");
        assert_eq!(change(None, None), "");
    }

    #[test]
    fn test_empty_estimate_renders() {
        let estimate = Estimate::default();
        let report = Report::from_estimate(&estimate).unwrap();
        assert_eq!(report.pricing_unit, "USD/hour");
        assert_eq!(report.total_delta, 0.0);

        let json = render(&estimate, OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["pricing_unit"], "USD/hour");
        assert!(value["resources"].as_array().unwrap().is_empty());
    }
}
