//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Suitable for pull request comments, wikis and risk memos.

use super::{
    contribution_share, format_annotated, format_element, report_order, RiskReport, ScenarioView,
};
use crate::models::Annotated;
use anyhow::Result;
use chrono::Local;

/// Largest network whose cross-risk matrix is printed in full
const MAX_MATRIX_ENTITIES: usize = 12;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &RiskReport, top: usize) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');

    md.push_str(&render_summary(report));
    md.push('\n');

    md.push_str(&render_contributors(report, top));
    md.push('\n');

    if report.entities.len() <= MAX_MATRIX_ENTITIES {
        md.push_str(&render_cross_risk(report));
        md.push('\n');
    }

    md.push_str(&render_footer());
    Ok(md)
}

fn render_header(report: &RiskReport) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        "# Systemic Risk Report\n\n**Source:** `{}` | **Risk matrix:** {}\n\nGenerated: {}\n",
        report.source, report.risk_matrix, timestamp
    )
}

fn render_summary(report: &RiskReport) -> String {
    let m = &report.metrics;
    let mut md = String::from("## Summary\n\n| Metric | Value |\n|--------|-------|\n");
    md.push_str(&format!("| Entities | {} |\n", m.entity_count));
    md.push_str(&format!("| Mean stress | {:.4} |\n", m.mean_stress));
    md.push_str(&format!("| Systemic risk S | **{}** |\n", format_annotated(&m.score)));
    md.push_str(&format!(
        "| Normalized S | {} |\n",
        format_annotated(&m.normalized_score)
    ));
    md.push_str(&format!("| Fragility R | {} |\n", format_annotated(&m.fragility)));
    md.push_str(&format!(
        "| Degree moment ratio | {} |\n",
        format_annotated(&m.degree_moment_ratio)
    ));
    md
}

fn render_contributors(report: &RiskReport, top: usize) -> String {
    let m = &report.metrics;
    let mut md = String::from("## Contributors\n\n");
    md.push_str("| # | Entity | Stress | Contribution | Share | Increment | Centrality | Criticality | Eigenvector |\n");
    md.push_str("|---|--------|--------|--------------|-------|-----------|------------|-------------|-------------|\n");
    for (rank, &i) in report_order(report, top).iter().enumerate() {
        let entity = &report.entities[i];
        let share = contribution_share(m, i)
            .map(|p| format!("{p:.1}%"))
            .unwrap_or_else(|| "n/a".to_string());
        md.push_str(&format!(
            "| {} | {} (`{}`) | {:.4} | {} | {} | {} | {} | {} | {} |\n",
            rank + 1,
            entity.name,
            entity.id,
            entity.stress,
            format_element(&m.decomposition, i),
            share,
            format_annotated(&m.risk_increment[i]),
            format_element(&m.centrality, i),
            format_element(&m.criticality, i),
            format_element(&m.eigenvector_centrality, i),
        ));
    }
    md.push_str("\n_* zero by convention, n/a undefined_\n");
    md
}

fn render_cross_risk(report: &RiskReport) -> String {
    let m = &report.metrics;
    let mut md = String::from("## Cross-Risk Matrix\n\n");
    if !m.cross_risk.is_defined() {
        md.push_str("Undefined: the systemic risk score is zero.\n");
        return md;
    }

    md.push_str("| |");
    for entity in &report.entities {
        md.push_str(&format!(" {} |", entity.id));
    }
    md.push_str("\n|---|");
    md.push_str(&"---|".repeat(report.entities.len()));
    md.push('\n');
    for (entity, row) in report.entities.iter().zip(&m.cross_risk.value) {
        md.push_str(&format!("| **{}** |", entity.id));
        for value in row {
            md.push_str(&format!(" {value:.4} |"));
        }
        md.push('\n');
    }
    md
}

fn render_footer() -> String {
    format!("---\n\n_Generated by netrisk {}_\n", env!("CARGO_PKG_VERSION"))
}

/// Render a scenario result as a before/after table
pub fn render_scenario(view: ScenarioView<'_>) -> Result<String> {
    let mut md = format!("## {}\n\n", view.title());

    if let ScenarioView::Comparison(table) = view {
        md.push_str("| Scenario | S | Normalized S | Fragility R | Entities | Mean stress |\n");
        md.push_str("|----------|---|--------------|-------------|----------|-------------|\n");
        for row in &table.rows {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.4} |\n",
                row.name,
                format_annotated(&row.score),
                format_annotated(&row.normalized_score),
                format_annotated(&row.fragility),
                row.entity_count,
                row.mean_stress
            ));
        }
        if let Some(name) = table.riskiest() {
            md.push_str(&format!("\nHighest systemic risk: **{name}**\n"));
        }
        return Ok(md);
    }

    md.push_str("| Metric | Before | After | Change |\n");
    md.push_str("|--------|--------|-------|--------|\n");
    for row in view.change_rows() {
        let cell =
            |v: &Option<Annotated<f64>>| v.as_ref().map(format_annotated).unwrap_or_default();
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            row.label,
            cell(&row.before),
            cell(&row.after),
            cell(&row.delta)
        ));
    }

    if let ScenarioView::Removal(outcome) = view {
        md.push_str("\n**Removed:** ");
        let names: Vec<String> = outcome
            .summary
            .removed
            .iter()
            .map(|r| format!("{} (`{}`)", r.name, r.id))
            .collect();
        md.push_str(&names.join(", "));
        md.push('\n');
    }
    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::{path3, test_report, zero_score_report};
    use crate::scenario::{ScenarioEngine, ScenarioStore};

    #[test]
    fn test_markdown_render_sections() {
        let md = render(&test_report(), 0).expect("render markdown");
        assert!(md.contains("# Systemic Risk Report"));
        assert!(md.contains("| Fragility R | 0.3750 |"));
        assert!(md.contains("## Contributors"));
        assert!(md.contains("Gamma (`c`)"));
        assert!(md.contains("## Cross-Risk Matrix"));
    }

    #[test]
    fn test_markdown_zero_score_has_no_matrix() {
        let md = render(&zero_score_report(), 0).expect("render markdown");
        assert!(md.contains("Undefined: the systemic risk score is zero."));
        assert!(!md.contains("NaN"));
    }

    #[test]
    fn test_markdown_comparison_table() {
        let engine = ScenarioEngine::default();
        let store = ScenarioStore::new();
        let baseline = path3();
        let shocked = baseline.with_stress(2, 6.0).expect("stress");
        store
            .save("base", baseline.clone(), engine.evaluate(&baseline), None)
            .expect("save");
        store
            .save("shock", shocked.clone(), engine.evaluate(&shocked), None)
            .expect("save");
        let table = store.compare(&["base", "shock"]).expect("compare");

        let md = render_scenario(ScenarioView::Comparison(&table)).expect("render");
        assert!(md.contains("| base |"));
        assert!(md.contains("Highest systemic risk: **shock**"));
    }
}
