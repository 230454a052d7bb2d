//! tfcost library
//!
//! Hourly cost estimation for the Compute Engine resources changed by a
//! Terraform plan, priced against the Cloud Billing catalog.

pub mod billing;
pub mod config;
pub mod error;
pub mod estimate;
pub mod exit_codes;
pub mod plan;
pub mod report;
pub mod resources;
pub mod retry;
pub mod units;

// Re-export commonly used types
pub use billing::{CatalogIndex, CatalogSource, MatchPolicy};
pub use config::Config;
pub use error::{CostError, Result};
pub use estimate::{Estimate, Estimator};
pub use report::OutputFormat;
