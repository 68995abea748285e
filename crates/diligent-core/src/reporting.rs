//! Report sinks: the `report.json` artifact and the terminal summary.

use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::{AnalysisItem, Report};

/// Default file name of the report artifact.
pub const DEFAULT_REPORT_PATH: &str = "report.json";

/// Write the report as indented JSON.
pub fn write_report_json(path: &Path, report: &Report) -> Result<()> {
    let content = report.to_pretty_json().context("serialize report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Read a report previously written by [`write_report_json`].
pub fn read_report_json(path: &Path) -> Result<Report> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parse report {:?}", path))
}

/// Render a plain-text tree of the report for the terminal.
pub fn render_summary_text(report: &Report) -> String {
    let mut out = String::new();
    for item in &report.items {
        render_item(&mut out, item, 0);
    }
    out.push_str(&format!(
        "\n{} checks, {} nodes, {} flagged, {} alerts\n",
        report.items.len(),
        report.total_nodes(),
        report.flagged_count(),
        report.alerts().len()
    ));
    out
}

fn render_item(out: &mut String, item: &AnalysisItem, depth: usize) {
    let indent = "  ".repeat(depth);
    let marker = if item.flagged { "FLAGGED" } else { "ok" };
    out.push_str(&format!("{indent}[{marker}] {}\n", item.command));
    if !item.description.is_empty() {
        out.push_str(&format!("{indent}    {}\n", item.description));
    }
    if let Some(alert) = &item.alert {
        out.push_str(&format!("{indent}    alert: {alert}\n"));
    }
    for child in &item.follow_ups {
        render_item(out, child, depth + 1);
    }
}
