//! Error types for tfcost
//!
//! Two error types live here: `CostError` (main error enum) and `ConfigError`
//! (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `CostError`.
//! CLI code uses `anyhow::Result<T>` for top-level error handling and maps the
//! underlying `CostError` to an exit code at the very end (see `exit_codes`).
//!
//! ## Per-resource failures
//!
//! Construction and pricing errors never abort a batch. The estimator wraps
//! them in `CostError::Resource`, which carries the resource name and type so
//! the report can point at the offending plan entry.
//!
//! ## Retry Awareness
//!
//! Errors implement `IsRetryable`. The `RetryPolicy` in `src/retry.rs` only
//! retries `CatalogSource` failures flagged as transient, `Io` and `Retryable`.
//! Catalog, matching and pricing errors are deterministic and fail immediately.

use thiserror::Error;

/// Main error type for tfcost
#[derive(Error, Debug)]
pub enum CostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("invalid disk type '{0}'")]
    InvalidDiskType(String),

    #[error("found no core or RAM SKU of usage type '{0}'")]
    NoSkuOfUsageType(String),

    #[error("found no disk SKU of resource group '{0}'")]
    NoSkuOfResourceGroup(String),

    #[error("wrong machine type format '{0}'")]
    InvalidMachineTypeFormat(String),

    #[error("invalid custom machine type format '{0}'")]
    InvalidCustomMachineType(String),

    #[error("machine type '{0}' not supported")]
    UnsupportedMachineType(String),

    #[error("invalid zone format '{0}'")]
    InvalidZoneFormat(String),

    #[error("no disk type '{disk_type}' running in '{location}'")]
    UnsupportedDiskLocation { disk_type: String, location: String },

    #[error("invalid image specification '{0}'")]
    InvalidImage(String),

    #[error("size {size} GiB is not in the valid range [{min}, {max}]")]
    SizeOutOfRange { size: i64, min: i64, max: i64 },

    #[error("size {size} GiB should at least be the size of the specified image ({image_size} GiB)")]
    ImageSmallerThanRequestedSize { size: i64, image_size: i64 },

    #[error("could not find {component} pricing information in region '{region}'")]
    NoMatchingSku { component: String, region: String },

    #[error("{count} SKUs match {component} in region '{region}': {descriptions:?}")]
    AmbiguousSku {
        component: String,
        region: String,
        count: usize,
        descriptions: Vec<String>,
    },

    #[error("no pricing tier of SKU '{0}' applies")]
    NoPricingTier(String),

    #[error("memory unit '{0}' of SKU is not supported")]
    UnsupportedUnit(String),

    #[error("pricing information has not been completed")]
    PricingIncomplete,

    #[error("{name}({resource_type}): {source}")]
    Resource {
        name: String,
        resource_type: String,
        #[source]
        source: Box<CostError>,
    },

    #[error("Plan error: {0}")]
    Plan(String),

    #[error("Invalid arguments: {0}")]
    Usage(String),

    #[error("Billing catalog error: {message}")]
    CatalogSource {
        message: String,
        transient: bool,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Retryable error (attempt {attempt}/{max_attempts}): {reason}")]
    Retryable {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CostError {
    /// Annotate an error with the resource it belongs to.
    pub fn for_resource(self, name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        CostError::Resource {
            name: name.into(),
            resource_type: resource_type.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping resource annotations.
    pub fn root(&self) -> &CostError {
        match self {
            CostError::Resource { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CostError>;

/// Trait for determining if an error is retryable
///
/// Used by `RetryPolicy` implementations to determine whether an error
/// should trigger a retry attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for CostError {
    fn is_retryable(&self) -> bool {
        match self {
            CostError::CatalogSource { transient, .. } => *transient,
            CostError::Retryable { .. } | CostError::Io(_) => true,
            _ => false,
        }
    }
}
