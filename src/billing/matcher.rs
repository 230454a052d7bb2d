//! SKU matching
//!
//! Filters a catalog bucket by region, description constraints and category,
//! and resolves the first satisfying SKU in catalog order. How competing
//! matches are treated is governed by `MatchPolicy`.

use crate::billing::sku::Sku;
use crate::error::{CostError, Result};
use crate::resources::description::Description;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The fixed set of priced components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkuKind {
    Core,
    Memory,
    Disk,
}

impl SkuKind {
    pub fn label(self) -> &'static str {
        match self {
            SkuKind::Core => "core",
            SkuKind::Memory => "memory",
            SkuKind::Disk => "disk",
        }
    }

    /// Token of the sibling component that must be absent. N1Standard core
    /// and RAM SKUs share a resource group and differ only in description.
    fn sibling_token(self) -> Option<&'static str> {
        match self {
            SkuKind::Core => Some("Ram"),
            SkuKind::Memory => Some("Core"),
            SkuKind::Disk => None,
        }
    }

    fn resource_family(self) -> &'static str {
        match self {
            SkuKind::Core | SkuKind::Memory => "Compute",
            SkuKind::Disk => "Storage",
        }
    }
}

/// How to resolve more than one satisfying SKU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Return the first match silently.
    First,
    /// Return the first match and log the competitors.
    #[default]
    Warn,
    /// Fail with `AmbiguousSku`.
    Reject,
}

/// What a component needs from the catalog.
#[derive(Debug, Clone)]
pub struct SkuQuery<'a> {
    pub kind: SkuKind,
    pub description: &'a Description,
    pub region: &'a str,
    /// Required usage type; `None` accepts any.
    pub usage_type: Option<&'a str>,
    /// Required resource group; `None` accepts any.
    pub resource_group: Option<&'a str>,
}

impl SkuQuery<'_> {
    fn fits_category(&self, sku: &Sku) -> bool {
        let c = &sku.category;
        c.resource_family == self.kind.resource_family()
            && self.usage_type.map_or(true, |u| c.usage_type == u)
            && self.resource_group.map_or(true, |g| c.resource_group == g)
    }

    /// Whether a single SKU satisfies the query.
    pub fn is_match(&self, sku: &Sku) -> bool {
        sku.available_in(self.region)
            && self.description.fits(&sku.description)
            && self
                .kind
                .sibling_token()
                .map_or(true, |t| !sku.description.contains(t))
            && self.fits_category(sku)
    }
}

/// Resolve the SKU for `query` among `skus`.
pub fn find_sku<'s>(skus: &'s [Sku], query: &SkuQuery<'_>, policy: MatchPolicy) -> Result<&'s Sku> {
    let mut matches = skus.iter().filter(|s| query.is_match(s));
    let first = matches.next().ok_or_else(|| CostError::NoMatchingSku {
        component: query.kind.label().to_string(),
        region: query.region.to_string(),
    })?;

    if policy == MatchPolicy::First {
        debug!(sku = %first.description, "Matched {} SKU", query.kind.label());
        return Ok(first);
    }

    let others: Vec<&Sku> = matches.collect();
    if others.is_empty() {
        debug!(sku = %first.description, "Matched {} SKU", query.kind.label());
        return Ok(first);
    }

    let descriptions: Vec<String> = std::iter::once(first)
        .chain(others.iter().copied())
        .map(|s| s.description.clone())
        .collect();

    match policy {
        MatchPolicy::Reject => Err(CostError::AmbiguousSku {
            component: query.kind.label().to_string(),
            region: query.region.to_string(),
            count: descriptions.len(),
            descriptions,
        }),
        _ => {
            warn!(
                region = query.region,
                candidates = ?descriptions,
                "{} SKUs match {}; using '{}'",
                descriptions.len(),
                query.kind.label(),
                first.description
            );
            Ok(first)
        }
    }
}
