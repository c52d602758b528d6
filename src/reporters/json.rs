//! JSON reporter
//!
//! Outputs the full report as pretty-printed JSON. NaN values become
//! `null`; the sibling `status` field says why.

use super::{RiskReport, ScenarioView};
use anyhow::Result;
use serde_json::json;

/// Render report as JSON
pub fn render(report: &RiskReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render a scenario result as JSON, tagged with its kind
pub fn render_scenario(view: ScenarioView<'_>) -> Result<String> {
    let value = match view {
        ScenarioView::WhatIf(outcome) => json!({
            "kind": "what_if",
            "entities": outcome.model.entities(),
            "delta": outcome.delta,
            "metrics": outcome.bundle,
        }),
        ScenarioView::Removal(outcome) => json!({
            "kind": "removal",
            "entities": outcome.model.entities(),
            "summary": outcome.summary,
            "metrics": outcome.bundle,
        }),
        ScenarioView::Modification(outcome) => json!({
            "kind": "modification",
            "entities": outcome.model.entities(),
            "summary": outcome.summary,
            "metrics": outcome.bundle,
        }),
        ScenarioView::Comparison(table) => json!({
            "kind": "comparison",
            "rows": table.rows,
            "riskiest": table.riskiest(),
        }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}
