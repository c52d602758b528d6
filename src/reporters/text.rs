//! Text (terminal) reporter
//!
//! Styling goes through `console`, which drops it when stdout is not a
//! terminal, so piped output stays plain.

use super::{
    contribution_share, format_annotated, format_element, report_order, ChangeRow, RiskReport,
    ScenarioView,
};
use crate::models::Definedness;
use crate::scenario::ComparisonTable;
use anyhow::Result;
use console::style;

const RULE: &str = "──────────────────────────────────────";

/// Render report as formatted terminal output
pub fn render(report: &RiskReport, top: usize) -> Result<String> {
    let m = &report.metrics;
    let mut out = String::new();

    // Header
    out.push_str(&format!(
        "\n{}  {}\n",
        style("Systemic Risk Report").bold(),
        style(&report.source).dim()
    ));
    out.push_str(&format!("{}\n", style(RULE).dim()));
    out.push_str(&format!(
        "Entities: {}  Mean stress: {:.4}  Risk matrix: {}\n\n",
        m.entity_count, m.mean_stress, report.risk_matrix
    ));

    out.push_str(&format!("{}\n", style("NETWORK").bold()));
    out.push_str(&format!(
        "  Systemic risk S: {}  Normalized: {}\n",
        style(format_annotated(&m.score)).bold(),
        format_annotated(&m.normalized_score)
    ));
    out.push_str(&format!(
        "  Fragility R: {}  Degree moment ratio: {}\n",
        format_annotated(&m.fragility),
        format_annotated(&m.degree_moment_ratio)
    ));
    if m.decomposition_residual.is_finite() {
        out.push_str(&format!(
            "  {}\n",
            style(format!("Decomposition residual: {:.2e}", m.decomposition_residual)).dim()
        ));
    }
    out.push('\n');

    // Contributors
    let order = report_order(report, top);
    out.push_str(&format!(
        "{} ({} of {})\n",
        style("CONTRIBUTORS").bold(),
        order.len(),
        report.entities.len()
    ));
    out.push_str(&format!(
        "{}\n",
        style(format!(
            "  {:>3}  {:<12} {:>10} {:>10} {:>8} {:>10} {:>10} {:>10}",
            "#", "ID", "STRESS", "CONTRIB", "SHARE", "INCREMENT", "CENTRAL", "CRITICAL"
        ))
        .dim()
    ));
    for (rank, &i) in order.iter().enumerate() {
        let entity = &report.entities[i];
        let share = contribution_share(m, i)
            .map(|p| format!("{p:.1}%"))
            .unwrap_or_else(|| "n/a".to_string());
        let id: String = entity.id.chars().take(12).collect();
        out.push_str(&format!(
            "  {:>3}  {:<12} {:>10.4} {:>10} {:>8} {:>10} {:>10} {:>10}\n",
            rank + 1,
            id,
            entity.stress,
            format_element(&m.decomposition, i),
            share,
            format_annotated(&m.risk_increment[i]),
            format_element(&m.centrality, i),
            format_element(&m.criticality, i),
        ));
    }

    let remaining = report.entities.len().saturating_sub(order.len());
    if remaining > 0 {
        out.push_str(&format!(
            "\n  {}\n",
            style(format!("...and {} more (use --top 0 to list all)", remaining)).dim()
        ));
    }
    out.push('\n');

    push_legend(&mut out, report);
    Ok(out)
}

fn push_legend(out: &mut String, report: &RiskReport) {
    let m = &report.metrics;
    let by_convention = [
        m.score.status,
        m.normalized_score.status,
        m.fragility.status,
        m.decomposition.status,
        m.centrality.status,
    ]
    .contains(&Definedness::ZeroByConvention)
        || m
            .risk_increment
            .iter()
            .any(|r| r.status == Definedness::ZeroByConvention);
    if by_convention {
        out.push_str(&format!("{}\n", style("* zero by convention").dim()));
    }
    if !m.gradient.is_defined() {
        out.push_str(&format!(
            "{}\n",
            style("n/a: undefined (S = 0), see --format json for the raw values").dim()
        ));
    }
}

/// Render a scenario result as terminal output
pub fn render_scenario(view: ScenarioView<'_>) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", style(view.title()).bold()));
    out.push_str(&format!("{}\n", style(RULE).dim()));

    for row in view.change_rows() {
        push_change_row(&mut out, &row);
    }

    match view {
        ScenarioView::WhatIf(outcome) => {
            out.push_str(&format!("\n{}\n", style("CONTRIBUTION CHANGES").bold()));
            let d = &outcome.delta;
            for (i, entity) in outcome.model.entities().iter().enumerate() {
                out.push_str(&format!(
                    "  {:<12} stress {:>10.4}  ΔD {:>10}  Δcriticality {:>10}\n",
                    entity.id,
                    outcome.model.stress()[i],
                    format_element(&d.decomposition_delta, i),
                    format_element(&d.criticality_delta, i),
                ));
            }
        }
        ScenarioView::Removal(outcome) => {
            out.push_str(&format!("\n{}\n", style("REMOVED").bold()));
            for removed in &outcome.summary.removed {
                out.push_str(&format!(
                    "  {:<12} {}  (stress {:.4})\n",
                    removed.id, removed.name, removed.stress
                ));
            }
        }
        ScenarioView::Modification(outcome) => {
            out.push_str(&format!("\n{}\n", style("EDITS").bold()));
            let entities = outcome.model.entities();
            for edit in &outcome.summary.edits {
                out.push_str(&format!(
                    "  {} -> {} = {:.4}\n",
                    entities[edit.from].id, entities[edit.to].id, edit.weight
                ));
            }
        }
        ScenarioView::Comparison(table) => push_comparison(&mut out, table),
    }
    out.push('\n');
    Ok(out)
}

fn push_change_row(out: &mut String, row: &ChangeRow) {
    let delta = row.delta.as_ref().map(|d| {
        let text = format_annotated(d);
        match d.defined() {
            Some(&v) if v > 0.0 => style(format!("+{text}")).red().to_string(),
            Some(&v) if v < 0.0 => style(text).green().to_string(),
            _ => text,
        }
    });
    match (&row.before, &row.after) {
        (Some(before), Some(after)) => out.push_str(&format!(
            "  {:<18} {:>10} -> {:>10}  ({})\n",
            row.label,
            format_annotated(before),
            format_annotated(after),
            delta.unwrap_or_default()
        )),
        _ => out.push_str(&format!(
            "  {:<18} {:>10}\n",
            row.label,
            delta.unwrap_or_default()
        )),
    }
}

fn push_comparison(out: &mut String, table: &ComparisonTable) {
    out.push_str(&format!(
        "{}\n",
        style(format!(
            "  {:<20} {:>10} {:>10} {:>10} {:>9} {:>12}",
            "SCENARIO", "S", "NORMALIZED", "FRAGILITY", "ENTITIES", "MEAN STRESS"
        ))
        .dim()
    ));
    for row in &table.rows {
        let name: String = row.name.chars().take(20).collect();
        out.push_str(&format!(
            "  {:<20} {:>10} {:>10} {:>10} {:>9} {:>12.4}\n",
            name,
            format_annotated(&row.score),
            format_annotated(&row.normalized_score),
            format_annotated(&row.fragility),
            row.entity_count,
            row.mean_stress
        ));
    }
    if let Some(name) = table.riskiest() {
        out.push_str(&format!("\n  Highest systemic risk: {}\n", style(name).bold()));
    }
}
