//! Terraform plan decoding
//!
//! Reads the JSON produced by `terraform show -json <planfile>` and extracts
//! the Compute Engine instance and disk changes. Everything else in the plan
//! is skipped. A change that cannot be understood is reported against its
//! address without affecting the others.

use crate::error::{CostError, Result};
use crate::resources::Action;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const INSTANCE_TYPE: &str = "google_compute_instance";
pub const DISK_TYPE: &str = "google_compute_disk";
pub const REGION_DISK_TYPE: &str = "google_compute_region_disk";

/// Disk type Terraform assumes when none is given.
const DEFAULT_DISK_TYPE: &str = "pd-standard";

/// Instance attributes relevant to pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSpec {
    pub name: String,
    pub id: String,
    pub machine_type: String,
    pub zone: String,
    pub usage_type: String,
}

/// Disk attributes relevant to pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskSpec {
    pub name: String,
    pub id: String,
    pub disk_type: String,
    pub zones: Vec<String>,
    pub image: Option<String>,
    pub snapshot: Option<String>,
    pub size: Option<i64>,
}

/// One side-by-side change from the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Change<T> {
    pub address: String,
    pub action: Action,
    pub before: Option<T>,
    pub after: Option<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceChange {
    Instance(Change<InstanceSpec>),
    Disk(Change<DiskSpec>),
}

impl ResourceChange {
    pub fn address(&self) -> &str {
        match self {
            ResourceChange::Instance(c) => &c.address,
            ResourceChange::Disk(c) => &c.address,
        }
    }
}

/// Supported changes in plan order, plus the ones that could not be decoded.
#[derive(Debug, Default)]
pub struct DecodedPlan {
    pub format_version: String,
    pub changes: Vec<ResourceChange>,
    pub failures: Vec<CostError>,
}

#[derive(Deserialize)]
struct RawPlan {
    #[serde(default)]
    format_version: String,
    #[serde(default)]
    resource_changes: Vec<RawResourceChange>,
}

#[derive(Deserialize)]
struct RawResourceChange {
    #[serde(default)]
    address: String,
    #[serde(rename = "type")]
    resource_type: String,
    #[serde(default)]
    name: String,
    change: RawChange,
}

#[derive(Deserialize)]
struct RawChange {
    actions: Vec<String>,
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct InstanceValues {
    name: Option<String>,
    id: Option<String>,
    instance_id: Option<String>,
    machine_type: Option<String>,
    zone: Option<String>,
    scheduling: Option<Vec<Scheduling>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Scheduling {
    preemptible: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct DiskValues {
    name: Option<String>,
    id: Option<String>,
    #[serde(rename = "type")]
    disk_type: Option<String>,
    zone: Option<String>,
    replica_zones: Option<Vec<String>>,
    image: Option<String>,
    snapshot: Option<String>,
    size: Option<i64>,
}

/// Map Terraform's action list to an `Action`; `None` for changes that cost nothing.
pub fn parse_actions(actions: &[String]) -> Result<Option<Action>> {
    let actions: Vec<&str> = actions.iter().map(String::as_str).collect();
    let action = match actions.as_slice() {
        ["create"] => Action::Create,
        ["delete"] => Action::Delete,
        ["update"] => Action::Update,
        ["no-op"] => Action::NoOp,
        ["delete", "create"] | ["create", "delete"] => Action::Replace,
        ["read"] => return Ok(None),
        other => return Err(CostError::Plan(format!("unsupported actions {:?}", other))),
    };
    Ok(Some(action))
}

/// Read and decode a plan file.
pub fn load_plan(path: &Path) -> Result<DecodedPlan> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CostError::Plan(format!("cannot read {}: {}", path.display(), e)))?;
    decode_plan(&content)
}

/// Decode a JSON plan.
pub fn decode_plan(json: &str) -> Result<DecodedPlan> {
    let raw: RawPlan = serde_json::from_str(json)?;
    if raw.format_version.is_empty() {
        return Err(CostError::Plan(
            "unexpected plan input, it has to contain a format version field".to_string(),
        ));
    }

    let mut plan = DecodedPlan {
        format_version: raw.format_version,
        ..DecodedPlan::default()
    };
    for rc in raw.resource_changes {
        let address = if rc.address.is_empty() {
            format!("{}.{}", rc.resource_type, rc.name)
        } else {
            rc.address.clone()
        };
        match decode_change(&address, &rc) {
            Ok(Some(change)) => plan.changes.push(change),
            Ok(None) => {}
            Err(e) => plan.failures.push(e.for_resource(address, rc.resource_type)),
        }
    }

    debug!(
        format_version = %plan.format_version,
        changes = plan.changes.len(),
        failures = plan.failures.len(),
        "Decoded plan"
    );
    Ok(plan)
}

fn decode_change(address: &str, rc: &RawResourceChange) -> Result<Option<ResourceChange>> {
    let supported = matches!(rc.resource_type.as_str(), INSTANCE_TYPE | DISK_TYPE | REGION_DISK_TYPE);
    if !supported {
        debug!(address, resource_type = %rc.resource_type, "Skipping unsupported resource");
        return Ok(None);
    }

    let action = match parse_actions(&rc.change.actions)? {
        Some(a) => a,
        None => return Ok(None),
    };

    let before = rc.change.before.as_ref().filter(|v| !v.is_null());
    let after = rc.change.after.as_ref().filter(|v| !v.is_null());
    let valid = match (before.is_some(), after.is_some()) {
        (false, false) => false,
        (false, true) => action == Action::Create,
        (true, false) => action == Action::Delete,
        (true, true) => matches!(action, Action::Update | Action::Replace | Action::NoOp),
    };
    if !valid {
        return Err(CostError::Plan(format!(
            "action '{}' does not match the before/after states of the change",
            action
        )));
    }

    let change = if rc.resource_type == INSTANCE_TYPE {
        ResourceChange::Instance(Change {
            address: address.to_string(),
            action,
            before: before.map(instance_spec).transpose()?,
            after: after.map(instance_spec).transpose()?,
        })
    } else {
        ResourceChange::Disk(Change {
            address: address.to_string(),
            action,
            before: before.map(disk_spec).transpose()?,
            after: after.map(disk_spec).transpose()?,
        })
    };
    Ok(Some(change))
}

/// Last path segment of a self link or partial resource path.
fn last_segment(s: &str) -> &str {
    s.rsplit('/').next().unwrap_or(s)
}

fn instance_spec(value: &serde_json::Value) -> Result<InstanceSpec> {
    let v = InstanceValues::deserialize(value)?;
    let preemptible = v
        .scheduling
        .unwrap_or_default()
        .first()
        .and_then(|s| s.preemptible)
        .unwrap_or(false);
    Ok(InstanceSpec {
        name: v.name.unwrap_or_default(),
        id: v.instance_id.or(v.id).unwrap_or_default(),
        machine_type: last_segment(&v.machine_type.unwrap_or_default()).to_string(),
        zone: last_segment(&v.zone.unwrap_or_default()).to_string(),
        usage_type: if preemptible { "Preemptible" } else { "OnDemand" }.to_string(),
    })
}

fn disk_spec(value: &serde_json::Value) -> Result<DiskSpec> {
    let v = DiskValues::deserialize(value)?;
    let zones = match v.replica_zones.filter(|z| !z.is_empty()) {
        Some(replicas) => replicas.iter().map(|z| last_segment(z).to_string()).collect(),
        None => v.zone.iter().map(|z| last_segment(z).to_string()).collect(),
    };
    let disk_type = v
        .disk_type
        .filter(|t| !t.is_empty())
        .map_or_else(|| DEFAULT_DISK_TYPE.to_string(), |t| last_segment(&t).to_string());
    Ok(DiskSpec {
        name: v.name.unwrap_or_default(),
        id: v.id.unwrap_or_default(),
        disk_type,
        zones,
        image: v.image.filter(|s| !s.is_empty()),
        snapshot: v.snapshot.filter(|s| !s.is_empty()),
        size: v.size,
    })
}
