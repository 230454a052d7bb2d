//! Before/after state of a planned resource change and its cost delta

use crate::billing::{CatalogIndex, MatchPolicy};
use crate::error::{CostError, Result};
use crate::resources::instance::ComputeInstance;
use crate::resources::CostModel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the plan does to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Create,
    Delete,
    Update,
    NoOp,
    Replace,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Update => "update",
            Action::NoOp => "no-op",
            Action::Replace => "replace",
        };
        f.write_str(s)
    }
}

/// Per-component cost change of an instance, in currency per hour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InstanceDelta {
    pub core: f64,
    pub memory: f64,
    pub total: f64,
}

/// A resource before and after a planned change.
///
/// A missing `before` means the resource is created, a missing `after` that
/// it is deleted. Both sides present means update, replace or no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    sides: Sides<T>,
    action: Action,
}

#[derive(Debug, Clone, PartialEq)]
enum Sides<T> {
    Before(T),
    After(T),
    Both(T, T),
}

impl<T> ResourceState<T> {
    pub fn new(before: Option<T>, after: Option<T>, action: Action) -> Result<Self> {
        let sides = match (before, after) {
            (None, Some(a)) if action == Action::Create => Sides::After(a),
            (Some(b), None) if action == Action::Delete => Sides::Before(b),
            (Some(b), Some(a)) if matches!(action, Action::Update | Action::Replace | Action::NoOp) => {
                Sides::Both(b, a)
            }
            (before, after) => {
                return Err(CostError::Plan(format!(
                    "action '{}' does not fit a change with{} before state and{} after state",
                    action,
                    if before.is_some() { "" } else { " no" },
                    if after.is_some() { "" } else { " no" },
                )))
            }
        };
        Ok(Self { sides, action })
    }

    pub fn before(&self) -> Option<&T> {
        match &self.sides {
            Sides::Before(b) | Sides::Both(b, _) => Some(b),
            Sides::After(_) => None,
        }
    }

    pub fn after(&self) -> Option<&T> {
        match &self.sides {
            Sides::After(a) | Sides::Both(_, a) => Some(a),
            Sides::Before(_) => None,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// The side that names the resource: `after` if present, else `before`.
    pub fn current(&self) -> &T {
        match &self.sides {
            Sides::After(t) | Sides::Both(_, t) | Sides::Before(t) => t,
        }
    }

    fn sides_mut(&mut self) -> Vec<&mut T> {
        match &mut self.sides {
            Sides::Before(t) | Sides::After(t) => vec![t],
            Sides::Both(b, a) => vec![b, a],
        }
    }
}

impl<T: CostModel> ResourceState<T> {
    /// Price both sides, annotating failures with the failing side's name and type.
    pub fn complete_pricing(&mut self, catalog: &CatalogIndex, policy: MatchPolicy) -> Result<()> {
        for side in self.sides_mut() {
            side.complete_pricing(catalog, policy)
                .map_err(|e| e.for_resource(side.name(), side.resource_type()))?;
        }
        Ok(())
    }

    /// `after.total - before.total`, a missing side counting as zero.
    pub fn delta(&self) -> Result<f64> {
        Ok(side_total(self.after(), T::total_price)? - side_total(self.before(), T::total_price)?)
    }
}

impl ResourceState<ComputeInstance> {
    pub fn instance_delta(&self) -> Result<InstanceDelta> {
        let core = side_total(self.after(), |i| i.cores.total_price())?
            - side_total(self.before(), |i| i.cores.total_price())?;
        let memory = side_total(self.after(), |i| i.memory.total_price())?
            - side_total(self.before(), |i| i.memory.total_price())?;
        Ok(InstanceDelta {
            core,
            memory,
            total: core + memory,
        })
    }
}

fn side_total<T>(side: Option<&T>, price: impl Fn(&T) -> Result<f64>) -> Result<f64> {
    side.map_or(Ok(0.0), price)
}
