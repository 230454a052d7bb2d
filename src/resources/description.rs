//! SKU description constraints
//!
//! SKU descriptions are free text ("Preemptible N2 Custom Instance Ram running
//! in Sao Paulo"). A `Description` is the conjunction of substrings a matching
//! SKU must contain and must not contain. The instance rules below run in a
//! fixed order; later rules only add tokens, they never undo earlier ones.

use crate::error::{CostError, Result};
use serde::Serialize;

/// Family tokens other than N1 that appear in core and RAM SKU descriptions.
/// N1 commitment and N1 custom SKUs carry none of them.
const ANYTHING_BUT_N1: [&str; 6] = ["N2", "N2D", "E2", "Compute", "Memory", "Sole Tenancy"];

/// Required and forbidden substrings of a SKU description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Description {
    pub contains: Vec<String>,
    pub omits: Vec<String>,
}

impl Description {
    pub fn require(&mut self, token: impl Into<String>) {
        self.contains.push(token.into());
    }

    pub fn forbid(&mut self, token: impl Into<String>) {
        self.omits.push(token.into());
    }

    /// Whether `text` satisfies every constraint.
    pub fn fits(&self, text: &str) -> bool {
        self.contains.iter().all(|c| text.contains(c.as_str()))
            && !self.omits.iter().any(|o| text.contains(o.as_str()))
    }

    /// Copy with extra required and forbidden tokens.
    pub fn refined(&self, contains: &[&str], omits: &[&str]) -> Description {
        let mut d = self.clone();
        d.contains.extend(contains.iter().map(|s| s.to_string()));
        d.omits.extend(omits.iter().map(|s| s.to_string()));
        d
    }

    /// Constraints for an instance's core and RAM SKUs.
    pub fn for_instance(machine_type: &str, usage_type: &str) -> Result<Description> {
        let machine = Machine {
            machine_type,
            usage_type,
        };
        let mut d = Description::default();
        for (_, rule) in INSTANCE_RULES {
            rule(&machine, &mut d)?;
        }
        Ok(d)
    }

    /// Constraints for a disk's capacity SKU.
    pub fn for_disk(disk_type: &str, regional: bool) -> Description {
        let mut d = Description::default();
        match disk_type {
            "pd-standard" => d.require("Storage PD Capacity"),
            "pd-ssd" => d.require("SSD backed PD Capacity"),
            // Region and resource group alone select the SKU.
            _ => {}
        }

        if regional {
            d.require("Regional");
        } else {
            d.forbid("Regional");
        }
        d
    }
}

struct Machine<'a> {
    machine_type: &'a str,
    usage_type: &'a str,
}

impl Machine<'_> {
    fn is_commitment(&self) -> bool {
        self.usage_type.starts_with("Commit")
    }
}

type InstanceRule = fn(&Machine<'_>, &mut Description) -> Result<()>;

/// Instance rules in precedence order.
const INSTANCE_RULES: [(&str, InstanceRule); 4] = [
    ("preemptible", preemptible_rule),
    ("commitment", commitment_rule),
    ("custom", custom_rule),
    ("family", family_rule),
];

fn preemptible_rule(m: &Machine<'_>, d: &mut Description) -> Result<()> {
    if m.usage_type == "Preemptible" {
        d.require("Preemptible");
    } else {
        d.forbid("Preemptible");
    }
    Ok(())
}

fn commitment_rule(m: &Machine<'_>, d: &mut Description) -> Result<()> {
    if !m.is_commitment() {
        d.forbid("Commitment");
        return Ok(());
    }

    d.require("Commitment");
    // N1 commitment SKUs name no family.
    if m.machine_type.contains("n1") {
        d.forbid("N1");
        ANYTHING_BUT_N1.iter().for_each(|t| d.forbid(*t));
    }
    Ok(())
}

fn custom_rule(m: &Machine<'_>, d: &mut Description) -> Result<()> {
    if !m.machine_type.contains("custom") {
        d.forbid("Custom");
    } else if !m.machine_type.starts_with("e2") {
        // E2 custom machines are billed on the regular E2 SKUs.
        d.require("Custom");
    }
    Ok(())
}

fn family_rule(m: &Machine<'_>, d: &mut Description) -> Result<()> {
    let t = m.machine_type;

    // N1 custom machines ("custom-2-4096") have no family token at all.
    if t.starts_with("custom") {
        d.forbid("N1");
        ANYTHING_BUT_N1.iter().for_each(|tok| d.forbid(*tok));
        return Ok(());
    }

    if t.starts_with("c2-") {
        d.require("Compute");
    } else if t.starts_with("m1-")
        || t.starts_with("m2-")
        || t.starts_with("n1-mega")
        || t.starts_with("n1-ultra")
    {
        d.require("Memory");
        d.forbid("Upgrade");
    } else if t.starts_with("n1-") || t.starts_with("f1-") || t.starts_with("g1-") {
        if !m.is_commitment() {
            d.require("N1");
        }
    } else {
        let i = t
            .find('-')
            .ok_or_else(|| CostError::InvalidMachineTypeFormat(t.to_string()))?;
        d.require(format!("{} ", t[..i].to_uppercase()));
    }
    Ok(())
}
