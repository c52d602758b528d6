//! Compare command - evaluate a scenario file and compare side by side

use anyhow::{bail, Context, Result};
use netrisk::config::NetriskConfig;
use netrisk::input::load_scenarios;
use netrisk::reporters::{render_scenario, OutputFormat, ScenarioView};
use netrisk::scenario::{ScenarioEngine, ScenarioStore, MAX_COMPARISON, MIN_COMPARISON};
use netrisk::RiskEngine;
use std::path::Path;
use tracing::info;

pub fn run(path: &Path, config: &NetriskConfig, format: OutputFormat) -> Result<String> {
    let (baseline, specs) = load_scenarios(path)?;
    if !(MIN_COMPARISON..=MAX_COMPARISON).contains(&specs.len()) {
        bail!(
            "{} defines {} scenarios; a comparison needs between {} and {}",
            path.display(),
            specs.len(),
            MIN_COMPARISON,
            MAX_COMPARISON
        );
    }

    let models = specs
        .iter()
        .map(|spec| {
            spec.build(&baseline)
                .with_context(|| format!("Scenario '{}' is invalid", spec.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let engine = ScenarioEngine::new(RiskEngine::from_config(config));
    let bundles = engine.evaluate_batch(&models);
    info!("Evaluated {} scenarios", bundles.len());

    let store = ScenarioStore::new();
    for ((spec, model), bundle) in specs.iter().zip(models).zip(bundles) {
        store.save(&spec.name, model, bundle, spec.description.clone())?;
    }

    let names: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
    let table = store.compare(&names)?;
    render_scenario(ScenarioView::Comparison(&table), format)
}
