//! Static reference data
//!
//! Machine-type shapes, disk size bounds and public image sizes. The built-in
//! tables are embedded from `data/`; each can be replaced by a JSON file of
//! the same shape (see `[reference]` in the config).

use crate::config::ReferenceConfig;
use crate::error::{CostError, Result};
use crate::units;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const BUILTIN_MACHINE_TYPES: &str = include_str!("../../data/machine_types.json");
const BUILTIN_DISK_TYPES: &str = include_str!("../../data/disk_types.json");
const BUILTIN_IMAGES: &str = include_str!("../../data/compute_images.json");

/// Billed vCPU share of shared-core machine types.
const SHARED_CORE_FRACTIONS: [(&str, f64); 5] = [
    ("e2-micro", 0.125),
    ("e2-small", 0.25),
    ("e2-medium", 0.5),
    ("f1-micro", 0.2),
    ("g1-small", 0.5),
];

/// Size limits of a disk type in one location, in GiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DiskBounds {
    #[serde(rename = "default_gib")]
    pub default: i64,
    #[serde(rename = "min_gib")]
    pub min: i64,
    #[serde(rename = "max_gib")]
    pub max: i64,
}

/// Lookups the cost models need besides the catalog.
pub trait ReferenceData: Send + Sync {
    /// Core count and memory (GiB) of a machine type.
    fn machine_details(&self, machine_type: &str) -> Result<(u32, f64)>;

    /// Fraction of a vCPU billed per core; 1.0 for everything but shared-core types.
    fn fractional_core_share(&self, machine_type: &str) -> f64;

    /// Size bounds of a disk type. A zone entry wins over a region entry.
    fn disk_size_bounds(&self, disk_type: &str, zone: &str, region: &str) -> Result<DiskBounds>;

    /// Disk size of an image given by name, family, or (partial) resource path.
    fn image_disk_size(&self, image: &str) -> Result<i64>;
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct MachineShape {
    cores: u32,
    memory_gib: f64,
}

#[derive(Debug, Deserialize)]
struct DiskEntry {
    #[serde(rename = "type")]
    disk_type: String,
    location: String,
    #[serde(flatten)]
    bounds: DiskBounds,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageEntry {
    image: String,
    family: String,
    creation_timestamp: String,
    disk_size_gib: i64,
}

/// Reference tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticReference {
    machines: HashMap<String, MachineShape>,
    /// disk type -> zone or region -> bounds
    disks: HashMap<String, HashMap<String, DiskBounds>>,
    image_sizes: HashMap<String, i64>,
    /// family -> image names, newest first
    families: HashMap<String, Vec<String>>,
}

impl StaticReference {
    /// Tables shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_MACHINE_TYPES, BUILTIN_DISK_TYPES, BUILTIN_IMAGES)
    }

    /// Built-in tables with any configured overrides applied.
    pub fn load(overrides: &ReferenceConfig) -> Result<Self> {
        let machines = read_or(overrides.machine_types.as_deref(), BUILTIN_MACHINE_TYPES)?;
        let disks = read_or(overrides.disk_types.as_deref(), BUILTIN_DISK_TYPES)?;
        let images = read_or(overrides.images.as_deref(), BUILTIN_IMAGES)?;
        Self::from_json(&machines, &disks, &images)
    }

    pub fn from_json(machine_types: &str, disk_types: &str, images: &str) -> Result<Self> {
        let machines: HashMap<String, MachineShape> = serde_json::from_str(machine_types)?;

        let mut disks: HashMap<String, HashMap<String, DiskBounds>> = HashMap::new();
        for entry in serde_json::from_str::<Vec<DiskEntry>>(disk_types)? {
            disks
                .entry(entry.disk_type)
                .or_default()
                .insert(entry.location, entry.bounds);
        }

        let mut image_list: Vec<ImageEntry> = serde_json::from_str(images)?;
        // RFC 3339 timestamps with a common offset order lexically.
        image_list.sort_by(|a, b| b.creation_timestamp.cmp(&a.creation_timestamp));
        let mut image_sizes = HashMap::new();
        let mut families: HashMap<String, Vec<String>> = HashMap::new();
        for img in image_list {
            families.entry(img.family).or_default().push(img.image.clone());
            image_sizes.insert(img.image, img.disk_size_gib);
        }

        debug!(
            machine_types = machines.len(),
            disk_types = disks.len(),
            images = image_sizes.len(),
            "Loaded reference data"
        );
        Ok(Self {
            machines,
            disks,
            image_sizes,
            families,
        })
    }
}

fn read_or(path: Option<&Path>, builtin: &str) -> Result<String> {
    match path {
        Some(p) => Ok(std::fs::read_to_string(p)?),
        None => Ok(builtin.to_string()),
    }
}

/// Parse `[family-]custom-<cores>-<memMiB>[-ext]` into cores and GiB.
fn custom_machine_details(machine_type: &str) -> Option<(u32, f64)> {
    let re = regex::Regex::new(r"^(?:[a-z0-9]+-)?custom-(\d+)-(\d+)(?:-ext)?$").ok()?;
    let caps = re.captures(machine_type)?;
    let cores = caps[1].parse().ok()?;
    let mem_mib: f64 = caps[2].parse().ok()?;
    let mem_gib = units::convert("mib", mem_mib, "gib").ok()?;
    Some((cores, mem_gib))
}

impl ReferenceData for StaticReference {
    fn machine_details(&self, machine_type: &str) -> Result<(u32, f64)> {
        if machine_type.contains("custom") {
            return custom_machine_details(machine_type)
                .ok_or_else(|| CostError::InvalidCustomMachineType(machine_type.to_string()));
        }
        self.machines
            .get(machine_type)
            .map(|m| (m.cores, m.memory_gib))
            .ok_or_else(|| CostError::UnsupportedMachineType(machine_type.to_string()))
    }

    fn fractional_core_share(&self, machine_type: &str) -> f64 {
        SHARED_CORE_FRACTIONS
            .iter()
            .find(|(t, _)| *t == machine_type)
            .map_or(1.0, |(_, share)| *share)
    }

    fn disk_size_bounds(&self, disk_type: &str, zone: &str, region: &str) -> Result<DiskBounds> {
        let by_location = self
            .disks
            .get(disk_type)
            .ok_or_else(|| CostError::InvalidDiskType(disk_type.to_string()))?;
        by_location
            .get(zone)
            .or_else(|| by_location.get(region))
            .copied()
            .ok_or_else(|| CostError::UnsupportedDiskLocation {
                disk_type: disk_type.to_string(),
                location: region.to_string(),
            })
    }

    fn image_disk_size(&self, image: &str) -> Result<i64> {
        let name = image.rsplit('/').next().unwrap_or(image);
        let concrete = self
            .families
            .get(name)
            .and_then(|images| images.first())
            .map_or(name, String::as_str);
        self.image_sizes
            .get(concrete)
            .copied()
            .ok_or_else(|| CostError::InvalidImage(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> StaticReference {
        StaticReference::builtin().unwrap()
    }

    #[test]
    fn test_predefined_machine_types() {
        let r = reference();
        assert_eq!(r.machine_details("n1-standard-1").unwrap(), (1, 3.75));
        assert_eq!(r.machine_details("e2-micro").unwrap(), (2, 1.0));
        assert_eq!(r.machine_details("g1-small").unwrap(), (1, 1.7));
        assert!(matches!(
            r.machine_details("n9-standard-1"),
            Err(CostError::UnsupportedMachineType(t)) if t == "n9-standard-1"
        ));
    }

    #[test]
    fn test_custom_machine_types() {
        let r = reference();
        assert_eq!(r.machine_details("custom-2-4096").unwrap(), (2, 4.0));
        assert_eq!(r.machine_details("n2-custom-4-10240").unwrap(), (4, 10.0));
        assert_eq!(r.machine_details("n2-custom-2-16384-ext").unwrap(), (2, 16.0));
        for bad in ["custom-2", "n2-custom-x-1024", "custom--1024", "n2-custom-2-1024-big"] {
            assert!(
                matches!(r.machine_details(bad), Err(CostError::InvalidCustomMachineType(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_fractional_core_share() {
        let r = reference();
        assert_eq!(r.fractional_core_share("e2-micro"), 0.125);
        assert_eq!(r.fractional_core_share("f1-micro"), 0.2);
        assert_eq!(r.fractional_core_share("n1-standard-1"), 1.0);
    }

    #[test]
    fn test_disk_bounds_zone_wins_over_region() {
        let r = reference();
        let zonal = r.disk_size_bounds("pd-standard", "us-west1-b", "us-west1").unwrap();
        assert_eq!((zonal.default, zonal.min, zonal.max), (500, 10, 65536));
        let regional = r.disk_size_bounds("pd-standard", "", "us-central1").unwrap();
        assert_eq!((regional.default, regional.min), (500, 200));
        let local = r.disk_size_bounds("local-ssd", "us-central1-a", "us-central1").unwrap();
        assert_eq!((local.default, local.min, local.max), (375, 375, 375));
    }

    #[test]
    fn test_disk_bounds_errors() {
        let r = reference();
        assert!(matches!(
            r.disk_size_bounds("pd-extreme", "us-west1-b", "us-west1"),
            Err(CostError::InvalidDiskType(_))
        ));
        assert!(matches!(
            r.disk_size_bounds("local-ssd", "", "us-central1"),
            Err(CostError::UnsupportedDiskLocation { .. })
        ));
    }

    #[test]
    fn test_image_sizes() {
        let r = reference();
        assert_eq!(r.image_disk_size("centos-7").unwrap(), 20);
        assert_eq!(r.image_disk_size("centos-cloud/centos-7").unwrap(), 20);
        assert_eq!(
            r.image_disk_size("projects/debian-cloud/global/images/debian-10-buster-v20200910").unwrap(),
            10
        );
        assert!(matches!(
            r.image_disk_size("projects/x/global/images/nothing"),
            Err(CostError::InvalidImage(i)) if i == "nothing"
        ));
    }

    #[test]
    fn test_family_resolves_to_newest_image() {
        let images = r#"[
            {"image": "img-old", "family": "fam", "creation_timestamp": "2020-01-01T00:00:00.000-07:00", "disk_size_gib": 10},
            {"image": "img-new", "family": "fam", "creation_timestamp": "2020-06-01T00:00:00.000-07:00", "disk_size_gib": 30}
        ]"#;
        let r = StaticReference::from_json("{}", "[]", images).unwrap();
        assert_eq!(r.image_disk_size("fam").unwrap(), 30);
        assert_eq!(r.image_disk_size("img-old").unwrap(), 10);
    }
}
