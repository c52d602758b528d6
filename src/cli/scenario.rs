//! What-if, remove and modify commands

use anyhow::{Context, Result};
use netrisk::config::NetriskConfig;
use netrisk::input::{load_network, resolve_entity, EdgeSpec};
use netrisk::reporters::{render_scenario, OutputFormat, ScenarioView};
use netrisk::scenario::{ScenarioEngine, WeightEdit};
use netrisk::{NetworkModel, RiskEngine, RiskResult};
use std::collections::BTreeMap;
use std::path::Path;

fn engine(config: &NetriskConfig) -> ScenarioEngine {
    ScenarioEngine::new(RiskEngine::from_config(config))
}

/// Resolve `ENTITY=VALUE` pairs; a repeated entity keeps its last value
fn stress_overrides(
    model: &NetworkModel,
    overrides: &[(String, f64)],
) -> RiskResult<BTreeMap<usize, f64>> {
    overrides
        .iter()
        .map(|(reference, value)| Ok((resolve_entity(model, reference)?, *value)))
        .collect()
}

fn weight_edits(model: &NetworkModel, edges: &[EdgeSpec]) -> RiskResult<Vec<WeightEdit>> {
    edges
        .iter()
        .map(|edge| {
            Ok(WeightEdit::new(
                resolve_entity(model, &edge.from)?,
                resolve_entity(model, &edge.to)?,
                edge.weight,
            ))
        })
        .collect()
}

pub fn what_if(
    network: &Path,
    overrides: &[(String, f64)],
    config: &NetriskConfig,
    format: OutputFormat,
) -> Result<String> {
    let baseline = load_network(network)?;
    let overrides = stress_overrides(&baseline, overrides)?;
    let outcome = engine(config)
        .what_if(&baseline, &overrides)
        .context("What-if scenario rejected")?;
    render_scenario(ScenarioView::WhatIf(&outcome), format)
}

pub fn remove(
    network: &Path,
    entities: &[String],
    config: &NetriskConfig,
    format: OutputFormat,
) -> Result<String> {
    let baseline = load_network(network)?;
    let indices = entities
        .iter()
        .map(|reference| resolve_entity(&baseline, reference))
        .collect::<RiskResult<Vec<_>>>()?;
    let outcome = engine(config)
        .remove_entities(&baseline, &indices)
        .context("Removal scenario rejected")?;
    render_scenario(ScenarioView::Removal(&outcome), format)
}

pub fn modify(
    network: &Path,
    edges: &[EdgeSpec],
    config: &NetriskConfig,
    format: OutputFormat,
) -> Result<String> {
    let baseline = load_network(network)?;
    let edits = weight_edits(&baseline, edges)?;
    let outcome = engine(config)
        .modify_network(&baseline, &edits)
        .context("Modification scenario rejected")?;
    render_scenario(ScenarioView::Modification(&outcome), format)
}
