//! Priced resource models
//!
//! Compute instances and disks, the before/after state of a planned change,
//! and the reference data their construction depends on.

pub mod description;
pub mod disk;
pub mod instance;
pub mod reference;
pub mod state;

pub use description::Description;
pub use disk::ComputeDisk;
pub use instance::{ComputeInstance, CoreInfo, MemoryInfo};
pub use reference::{DiskBounds, ReferenceData, StaticReference};
pub use state::{Action, InstanceDelta, ResourceState};

use crate::billing::{CatalogIndex, MatchPolicy};
use crate::error::Result;

/// A resource whose hourly price can be resolved from the catalog.
pub trait CostModel {
    fn name(&self) -> &str;

    /// Type shown in diagnostics: machine type or disk type.
    fn resource_type(&self) -> &str;

    /// Match SKUs and fill in pricing. On error nothing is filled in.
    fn complete_pricing(&mut self, catalog: &CatalogIndex, policy: MatchPolicy) -> Result<()>;

    /// Hourly price; fails with `PricingIncomplete` before `complete_pricing`.
    fn total_price(&self) -> Result<f64>;
}
