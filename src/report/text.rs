//! Terminal tables

use super::{ComponentCost, DiskReport, InstanceReport, Report, ResourceReport};
use comfy_table::{Cell, Color, Table};

fn money(x: f64) -> String {
    format!("{:.6}", x)
}

fn delta_cell(delta: f64, color: bool) -> Cell {
    let cell = Cell::new(money(delta));
    if !color {
        return cell;
    }
    if delta > 0.0 {
        cell.fg(Color::Red)
    } else if delta < 0.0 {
        cell.fg(Color::Green)
    } else {
        cell
    }
}

fn trend(delta: f64) -> &'static str {
    if delta > 0.0 {
        "Up (↑)"
    } else if delta < 0.0 {
        "Down (↓)"
    } else {
        "No change"
    }
}

/// Render the summary followed by one table per resource.
pub fn render_text(report: &Report, color: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "The total cost change for all resources is {:.6} {}.\n\n",
        report.total_delta, report.pricing_unit
    ));
    out.push_str(&summary_table(report, color).to_string());
    out.push_str("\n\n");

    for resource in &report.resources {
        let table = match resource {
            ResourceReport::Instance(i) => instance_table(i, &report.pricing_unit, color),
            ResourceReport::Disk(d) => disk_table(d, &report.pricing_unit, color),
        };
        out.push_str(&table.to_string());
        out.push_str("\n\n");
    }

    if !report.failures.is_empty() {
        out.push_str("Resources that could not be priced:\n");
        for failure in &report.failures {
            out.push_str(&format!("  - {}\n", failure));
        }
    }
    out
}

fn summary_table(report: &Report, color: bool) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Name".to_string(),
        "ID".to_string(),
        "Type".to_string(),
        "Action".to_string(),
        format!("Delta ({})", report.pricing_unit),
    ]);
    for resource in &report.resources {
        let (name, id, kind, action, delta) = match resource {
            ResourceReport::Instance(i) => (&i.name, &i.id, &i.machine_type, &i.action, i.delta.total),
            ResourceReport::Disk(d) => (&d.name, &d.id, &d.disk_type, &d.action, d.delta),
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(id),
            Cell::new(kind),
            Cell::new(action),
            delta_cell(delta, color),
        ]);
    }
    table
}

fn cost_rows(label: &str, cost: Option<&ComponentCost>) -> [Vec<String>; 3] {
    let c = cost.cloned().unwrap_or_default();
    [
        vec![label.to_string(), "Cost per unit".to_string(), money(c.unit_cost)],
        vec![label.to_string(), "Number of units".to_string(), format!("{:.2}", c.units)],
        vec![label.to_string(), "Units cost".to_string(), money(c.total_cost)],
    ]
}

fn instance_table(i: &InstanceReport, unit: &str, color: bool) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["", "", "CPU", "RAM", "Total"]);
    for (field, value) in [
        ("Name", &i.name),
        ("ID", &i.id),
        ("Zone", &i.zone),
        ("Machine type", &i.machine_type),
        ("Action", &i.action),
    ] {
        table.add_row(vec![field, "", value.as_str(), "", ""]);
    }
    table.add_row(vec!["Pricing", unit, "", "", ""]);

    for (label, side) in [("Before", i.before.as_ref()), ("After", i.after.as_ref())] {
        let cpu = cost_rows(label, side.map(|s| &s.cpu));
        let ram = cost_rows(label, side.map(|s| &s.ram));
        let total = money(side.map_or(0.0, |s| s.total_cost));
        for (c, r) in cpu.into_iter().zip(ram) {
            table.add_row(vec![
                c[0].clone(),
                c[1].clone(),
                c[2].clone(),
                r[2].clone(),
                total.clone(),
            ]);
        }
    }

    table.add_row(vec![
        Cell::new("DELTA"),
        Cell::new(trend(i.delta.total)),
        delta_cell(i.delta.core, color),
        delta_cell(i.delta.memory, color),
        delta_cell(i.delta.total, color),
    ]);
    table
}

fn disk_table(d: &DiskReport, unit: &str, color: bool) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["", "", "Disk"]);
    for (field, value) in [
        ("Name", &d.name),
        ("ID", &d.id),
        ("Zones", &d.zones),
        ("Disk type", &d.disk_type),
        ("Image", &d.image),
        ("Snapshot", &d.snapshot),
        ("Action", &d.action),
    ] {
        table.add_row(vec![field, "", value.as_str()]);
    }
    table.add_row(vec!["Pricing", unit, ""]);
    for row in cost_rows("Before", d.before.as_ref())
        .into_iter()
        .chain(cost_rows("After", d.after.as_ref()))
    {
        table.add_row(row);
    }
    table.add_row(vec![
        Cell::new("DELTA"),
        Cell::new(trend(d.delta)),
        delta_cell(d.delta, color),
    ]);
    table
}
