//! Output reporters for netrisk evaluations and scenarios
//!
//! Supports multiple output formats:
//! - `text` - Terminal output, styled when stdout is a terminal
//! - `json` - Machine-readable JSON (undefined values are `null` next to
//!   an `"undefined"` status)
//! - `markdown` - GitHub-flavored Markdown

mod json;
mod markdown;
mod text;

use crate::config::RiskMatrixStrategy;
use crate::models::{Annotated, Definedness, MetricsBundle};
use crate::network::NetworkModel;
use crate::scenario::{ComparisonTable, ModificationOutcome, RemovalOutcome, WhatIfOutcome};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// One entity row of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRow {
    pub id: String,
    pub name: String,
    pub stress: f64,
}

/// An evaluated network, ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    /// Where the network came from (a file path or scenario name)
    pub source: String,
    pub risk_matrix: RiskMatrixStrategy,
    pub entities: Vec<EntityRow>,
    pub metrics: MetricsBundle,
}

impl RiskReport {
    pub fn new(
        source: impl Into<String>,
        model: &NetworkModel,
        metrics: MetricsBundle,
        risk_matrix: RiskMatrixStrategy,
    ) -> Self {
        let entities = model
            .entities()
            .iter()
            .zip(model.stress().iter())
            .map(|(entity, &stress)| EntityRow {
                id: entity.id.clone(),
                name: entity.name.clone(),
                stress,
            })
            .collect();
        Self {
            source: source.into(),
            risk_matrix,
            entities,
            metrics,
        }
    }
}

/// Render an evaluation report. `top` limits the entity table (0 = all).
pub fn report_with_format(report: &RiskReport, format: OutputFormat, top: usize) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report, top),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report, top),
    }
}

/// A scenario result to render
#[derive(Debug, Clone, Copy)]
pub enum ScenarioView<'a> {
    WhatIf(&'a WhatIfOutcome),
    Removal(&'a RemovalOutcome),
    Modification(&'a ModificationOutcome),
    Comparison(&'a ComparisonTable),
}

impl ScenarioView<'_> {
    fn title(&self) -> &'static str {
        match self {
            ScenarioView::WhatIf(_) => "What-if",
            ScenarioView::Removal(_) => "Entity removal",
            ScenarioView::Modification(_) => "Network modification",
            ScenarioView::Comparison(_) => "Scenario comparison",
        }
    }

    /// Before/after rows shared by the text and markdown renderers
    fn change_rows(&self) -> Vec<ChangeRow> {
        match self {
            ScenarioView::WhatIf(outcome) => {
                let d = &outcome.delta;
                vec![
                    ChangeRow::new("Systemic risk S", &d.score_before, &d.score_after),
                    ChangeRow {
                        label: "Change %",
                        before: None,
                        after: None,
                        delta: Some(d.percent_change.clone()),
                    },
                ]
            }
            ScenarioView::Removal(outcome) => {
                let s = &outcome.summary;
                vec![
                    ChangeRow::counts(
                        "Entities",
                        s.entity_count_before,
                        s.entity_count_after,
                    ),
                    ChangeRow::new("Systemic risk S", &s.score_before, &s.score_after),
                    ChangeRow::new(
                        "Normalized S",
                        &s.normalized_score_before,
                        &s.normalized_score_after,
                    ),
                    ChangeRow::new("Fragility R", &s.fragility_before, &s.fragility_after),
                ]
            }
            ScenarioView::Modification(outcome) => {
                let s = &outcome.summary;
                vec![
                    ChangeRow::new("Systemic risk S", &s.score_before, &s.score_after),
                    ChangeRow::new(
                        "Normalized S",
                        &s.normalized_score_before,
                        &s.normalized_score_after,
                    ),
                    ChangeRow::new("Fragility R", &s.fragility_before, &s.fragility_after),
                ]
            }
            ScenarioView::Comparison(_) => Vec::new(),
        }
    }
}

/// Render a scenario result in the specified format
pub fn render_scenario(view: ScenarioView<'_>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_scenario(view),
        OutputFormat::Json => json::render_scenario(view),
        OutputFormat::Markdown => markdown::render_scenario(view),
    }
}

/// One "metric: before -> after" line
struct ChangeRow {
    label: &'static str,
    before: Option<Annotated<f64>>,
    after: Option<Annotated<f64>>,
    delta: Option<Annotated<f64>>,
}

impl ChangeRow {
    fn new(label: &'static str, before: &Annotated<f64>, after: &Annotated<f64>) -> Self {
        let delta = match (before.defined(), after.defined()) {
            (Some(b), Some(a)) => Annotated::computed(a - b),
            _ => Annotated::undefined_scalar(),
        };
        Self {
            label,
            before: Some(before.clone()),
            after: Some(after.clone()),
            delta: Some(delta),
        }
    }

    fn counts(label: &'static str, before: usize, after: usize) -> Self {
        Self::new(
            label,
            &Annotated::computed(before as f64),
            &Annotated::computed(after as f64),
        )
    }
}

/// Four decimals, `*` for zero-by-convention, `n/a` for undefined
fn format_annotated(value: &Annotated<f64>) -> String {
    match value.status {
        Definedness::Computed => format!("{:.4}", value.value),
        Definedness::ZeroByConvention => format!("{:.4}*", value.value),
        Definedness::Undefined => "n/a".to_string(),
    }
}

/// Element `i` of an annotated vector, formatted like [`format_annotated`]
fn format_element(values: &Annotated<Vec<f64>>, i: usize) -> String {
    let value = values.value.get(i).copied().unwrap_or(f64::NAN);
    format_annotated(&Annotated {
        value,
        status: values.status,
    })
}

/// Share of S carried by entity `i`, as a percentage
fn contribution_share(metrics: &MetricsBundle, i: usize) -> Option<f64> {
    let s = metrics.score.defined().copied().filter(|&s| s > 0.0)?;
    let d = metrics.decomposition.defined()?;
    d.get(i).map(|d| d / s * 100.0)
}

/// Entity indices in report order: largest contribution first when the
/// decomposition is defined, input order otherwise. `top` = 0 keeps all.
fn report_order(report: &RiskReport, top: usize) -> Vec<usize> {
    let mut order = report.metrics.ranked_contributors();
    if order.is_empty() {
        order = (0..report.entities.len()).collect();
    }
    if top > 0 {
        order.truncate(top);
    }
    order
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Entity;
    use crate::scoring::RiskEngine;

    pub(crate) fn path3() -> NetworkModel {
        NetworkModel::new(
            vec![
                Entity::new("a", "Alpha"),
                Entity::new("b", "Beta"),
                Entity::new("c", "Gamma"),
            ],
            vec![1.0, 2.0, 3.0],
            vec![
                vec![0.0, 1.0, 0.0],
                vec![1.0, 0.0, 1.0],
                vec![0.0, 1.0, 0.0],
            ],
        )
        .expect("valid model")
    }

    /// Path network report for renderer tests
    pub(crate) fn test_report() -> RiskReport {
        let model = path3();
        let engine = RiskEngine::default();
        RiskReport::new("path.toml", &model, engine.evaluate(&model), engine.strategy())
    }

    /// Disconnected pair under E = A: S = 0, so the gradient is undefined
    pub(crate) fn zero_score_report() -> RiskReport {
        let model = path3();
        let engine = RiskEngine::with_strategy(RiskMatrixStrategy::AdjacencyOnly);
        let model = model.subnetwork(&[0, 2]).expect("subnetwork");
        RiskReport::new("split.toml", &model, engine.evaluate(&model), engine.strategy())
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("md").unwrap(),
            OutputFormat::Markdown
        );
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_report_with_format_dispatches() {
        let report = test_report();
        let text = report_with_format(&report, OutputFormat::Text, 0).unwrap();
        assert!(text.contains("Systemic Risk Report"));
        let json = report_with_format(&report, OutputFormat::Json, 0).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["source"], "path.toml");
        let md = report_with_format(&report, OutputFormat::Markdown, 0).unwrap();
        assert!(md.contains("# Systemic Risk Report"));
    }

    #[test]
    fn test_format_annotated() {
        assert_eq!(format_annotated(&Annotated::computed(1.23456)), "1.2346");
        assert_eq!(format_annotated(&Annotated::by_convention(0.0)), "0.0000*");
        assert_eq!(format_annotated(&Annotated::undefined_scalar()), "n/a");
    }

    #[test]
    fn test_report_order_ranks_contributors() {
        let report = test_report();
        assert_eq!(report_order(&report, 0), vec![2, 1, 0]);
        assert_eq!(report_order(&report, 1), vec![2]);
        // All-zero contributions tie and keep input order
        assert_eq!(report_order(&zero_score_report(), 0), vec![0, 1]);
    }

    #[test]
    fn test_contribution_shares_sum_to_100() {
        let report = test_report();
        let total: f64 = (0..3)
            .map(|i| contribution_share(&report.metrics, i).unwrap())
            .sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
