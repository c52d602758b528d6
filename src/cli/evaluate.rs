//! Evaluate command - score a network file

use anyhow::Result;
use netrisk::config::NetriskConfig;
use netrisk::input::load_network;
use netrisk::reporters::{report_with_format, OutputFormat, RiskReport};
use netrisk::RiskEngine;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Load, evaluate and render one network
pub fn run(
    network: &Path,
    config: &NetriskConfig,
    format: OutputFormat,
    top: usize,
) -> Result<String> {
    let start = Instant::now();
    let model = load_network(network)?;
    let engine = RiskEngine::from_config(config);
    let metrics = engine.evaluate(&model);
    info!(
        "Evaluated {} entities in {:?}",
        model.len(),
        start.elapsed()
    );

    let report = RiskReport::new(
        network.display().to_string(),
        &model,
        metrics,
        engine.strategy(),
    );
    report_with_format(&report, format, top)
}
