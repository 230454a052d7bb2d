//! Self-contained HTML report with hourly, monthly and yearly views

use super::{ComponentCost, DiskReport, InstanceReport, Report, ResourceReport};
use crate::billing::{HOURS_PER_MONTH, HOURS_PER_YEAR};
use chrono::Utc;

/// Periods shown, with the factor applied to hourly amounts.
const PERIODS: [(&str, &str, f64); 3] = [
    ("Hourly", "hour", 1.0),
    ("Monthly", "month", HOURS_PER_MONTH),
    ("Yearly", "year", HOURS_PER_YEAR),
];

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn delta_class(delta: f64) -> &'static str {
    if delta > 0.0 {
        "up"
    } else if delta < 0.0 {
        "down"
    } else {
        "same"
    }
}

pub fn render_html(report: &Report) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Cost Estimation Report</title>
    <style>
        body { font-family: monospace; margin: 20px; }
        table { border-collapse: collapse; width: 100%; margin-bottom: 24px; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #4285F4; color: white; }
        tr:nth-child(even) { background-color: #f2f2f2; }
        .up { color: red; }
        .down { color: green; }
        .failure { color: #b00; }
    </style>
</head>
<body>
    <h1>Cost Estimation Report</h1>
    <p>Generated: "#,
    );
    html.push_str(&Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string());
    html.push_str("</p>\n");

    let currency = report
        .pricing_unit
        .split('/')
        .next()
        .unwrap_or(&report.pricing_unit)
        .to_string();

    for (title, period, factor) in PERIODS {
        let unit = format!("{}/{}", currency, period);
        html.push_str(&format!("    <h2 id=\"{}\">{} ({})</h2>\n", period, title, unit));
        html.push_str(&format!(
            "    <p>Total cost change: <span class=\"{}\">{:.6} {}</span></p>\n",
            delta_class(report.total_delta),
            report.total_delta * factor,
            unit
        ));
        for resource in &report.resources {
            html.push_str(&match resource {
                ResourceReport::Instance(i) => instance_table(i, factor),
                ResourceReport::Disk(d) => disk_table(d, factor),
            });
        }
    }

    if !report.failures.is_empty() {
        html.push_str("    <h2>Resources that could not be priced</h2>\n    <ul>\n");
        for failure in &report.failures {
            html.push_str(&format!("        <li class=\"failure\">{}</li>\n", escape(failure)));
        }
        html.push_str("    </ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn general_rows(fields: &[(&str, &str)], columns: usize) -> String {
    fields
        .iter()
        .map(|(k, v)| {
            format!(
                "        <tr><th>{}</th><td colspan=\"{}\">{}</td></tr>\n",
                k,
                columns,
                escape(v)
            )
        })
        .collect()
}

fn cost_cells(cost: Option<&ComponentCost>, factor: f64) -> [String; 3] {
    let c = cost.cloned().unwrap_or_default();
    [
        format!("{:.6}", c.unit_cost * factor),
        format!("{:.2}", c.units),
        format!("{:.6}", c.total_cost * factor),
    ]
}

fn instance_table(i: &InstanceReport, factor: f64) -> String {
    let mut html = String::from("    <table>\n");
    html.push_str(&general_rows(
        &[
            ("Name", i.name.as_str()),
            ("ID", i.id.as_str()),
            ("Zone", i.zone.as_str()),
            ("Machine type", i.machine_type.as_str()),
            ("Action", i.action.as_str()),
        ],
        4,
    ));
    html.push_str("        <tr><th></th><th></th><th>CPU</th><th>RAM</th><th>Total</th></tr>\n");
    for (label, side) in [("Before", i.before.as_ref()), ("After", i.after.as_ref())] {
        let cpu = cost_cells(side.map(|s| &s.cpu), factor);
        let ram = cost_cells(side.map(|s| &s.ram), factor);
        let total = format!("{:.6}", side.map_or(0.0, |s| s.total_cost) * factor);
        for (n, row) in ["Cost per unit", "Number of units", "Units cost"].iter().enumerate() {
            html.push_str(&format!(
                "        <tr><th>{}</th><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                label, row, cpu[n], ram[n], total
            ));
        }
    }
    html.push_str(&format!(
        "        <tr><th>DELTA</th><td></td><td class=\"{}\">{:.6}</td><td class=\"{}\">{:.6}</td><td class=\"{}\">{:.6}</td></tr>\n",
        delta_class(i.delta.core),
        i.delta.core * factor,
        delta_class(i.delta.memory),
        i.delta.memory * factor,
        delta_class(i.delta.total),
        i.delta.total * factor
    ));
    html.push_str("    </table>\n");
    html
}

fn disk_table(d: &DiskReport, factor: f64) -> String {
    let mut html = String::from("    <table>\n");
    html.push_str(&general_rows(
        &[
            ("Name", d.name.as_str()),
            ("ID", d.id.as_str()),
            ("Zones", d.zones.as_str()),
            ("Disk type", d.disk_type.as_str()),
            ("Image", d.image.as_str()),
            ("Snapshot", d.snapshot.as_str()),
            ("Action", d.action.as_str()),
        ],
        2,
    ));
    html.push_str("        <tr><th></th><th></th><th>Disk</th></tr>\n");
    for (label, side) in [("Before", d.before.as_ref()), ("After", d.after.as_ref())] {
        let cells = cost_cells(side, factor);
        for (n, row) in ["Cost per unit", "Number of units", "Units cost"].iter().enumerate() {
            html.push_str(&format!(
                "        <tr><th>{}</th><td>{}</td><td>{}</td></tr>\n",
                label, row, cells[n]
            ));
        }
    }
    html.push_str(&format!(
        "        <tr><th>DELTA</th><td></td><td class=\"{}\">{:.6}</td></tr>\n",
        delta_class(d.delta),
        d.delta * factor
    ));
    html.push_str("    </table>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periods_scale_totals() {
        let report = Report {
            pricing_unit: "USD/hour".to_string(),
            total_delta: 1.0,
            resources: vec![],
            failures: vec!["a<b>(x): broken".to_string()],
        };
        let html = render_html(&report);
        assert!(html.contains("1.000000 USD/hour"));
        assert!(html.contains("720.000000 USD/month"));
        assert!(html.contains("8760.000000 USD/year"));
        assert!(html.contains("a&lt;b&gt;(x): broken"));
        assert!(html.contains("Generated: "));
    }
}
