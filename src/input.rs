//! Network and scenario input files
//!
//! A network file lists entities (id, name, stress) and a square weight
//! matrix in entity order:
//!
//! ```toml
//! weights = [[0, 1], [1, 0]]
//!
//! [[entities]]
//! id = "a"
//! name = "Alpha Bank"
//! stress = 1.5
//!
//! [[entities]]
//! id = "b"
//! stress = 0.5
//! ```
//!
//! A scenario file names a baseline network (relative to the scenario file)
//! and the scenarios to derive from it:
//!
//! ```toml
//! network = "banks.toml"
//!
//! [[scenario]]
//! name = "shock a"
//! stress = { a = 4.0 }
//!
//! [[scenario]]
//! name = "drop b"
//! remove = ["b"]
//! edges = [{ from = "a", to = "c", weight = 2.0 }]
//! ```
//!
//! Entities are referenced by id, or by zero-based index when no id matches.

use crate::errors::{RiskError, RiskResult};
use crate::models::Entity;
use crate::network::NetworkModel;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One entity row of a network file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    /// Defaults to the id
    #[serde(default)]
    pub name: Option<String>,
    pub stress: f64,
}

/// On-disk network description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkFile {
    pub entities: Vec<EntityRecord>,
    pub weights: Vec<Vec<f64>>,
}

impl NetworkFile {
    /// Validate and build the model
    pub fn into_model(self) -> RiskResult<NetworkModel> {
        let (entities, stress): (Vec<_>, Vec<_>) = self
            .entities
            .into_iter()
            .map(|record| {
                let name = record.name.unwrap_or_else(|| record.id.clone());
                (Entity::new(record.id, name), record.stress)
            })
            .unzip();
        NetworkModel::new(entities, stress, self.weights)
    }
}

/// Parse `.json` files as JSON and everything else as TOML
fn parse_by_extension<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))
    } else {
        toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))
    }
}

/// Load a network file and build its model
pub fn load_network(path: &Path) -> Result<NetworkModel> {
    let file: NetworkFile = parse_by_extension(path)?;
    let model = file
        .into_model()
        .with_context(|| format!("Invalid network in {}", path.display()))?;
    debug!("Loaded {} entities from {}", model.len(), path.display());
    Ok(model)
}

/// Index of the entity with id `reference`, or `reference` read as an index
pub fn resolve_entity(model: &NetworkModel, reference: &str) -> RiskResult<usize> {
    let reference = reference.trim();
    if let Some(index) = model.index_of(reference) {
        return Ok(index);
    }
    match reference.parse::<usize>() {
        Ok(index) if index < model.len() => Ok(index),
        _ => Err(RiskError::UnknownEntity(reference.to_string())),
    }
}

/// A directed weight edit addressed by entity reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub weight: f64,
}

/// One scenario of a scenario file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Stress overrides by entity reference
    #[serde(default)]
    pub stress: BTreeMap<String, f64>,
    /// Directed weight edits, applied in order
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    /// Entities to drop after the overrides and edits
    #[serde(default)]
    pub remove: Vec<String>,
}

impl ScenarioSpec {
    /// Derive this scenario's network from `baseline`.
    ///
    /// Every reference resolves against the baseline, so removals never
    /// shift the targets of overrides or edits.
    pub fn build(&self, baseline: &NetworkModel) -> RiskResult<NetworkModel> {
        let mut model = baseline.clone();
        for (reference, &value) in &self.stress {
            model = model.with_stress(resolve_entity(baseline, reference)?, value)?;
        }
        for edge in &self.edges {
            let from = resolve_entity(baseline, &edge.from)?;
            let to = resolve_entity(baseline, &edge.to)?;
            model = model.with_weight(from, to, edge.weight)?;
        }

        let removed = self
            .remove
            .iter()
            .map(|reference| resolve_entity(baseline, reference))
            .collect::<RiskResult<Vec<_>>>()?;
        model.without_entities(&removed)
    }
}

/// On-disk scenario batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Baseline network path, relative to the scenario file
    pub network: PathBuf,
    #[serde(default, rename = "scenario")]
    pub scenarios: Vec<ScenarioSpec>,
}

/// Load a scenario file and its baseline network
pub fn load_scenarios(path: &Path) -> Result<(NetworkModel, Vec<ScenarioSpec>)> {
    let file: ScenarioFile = parse_by_extension(path)?;
    let network_path = match path.parent() {
        Some(dir) if file.network.is_relative() => dir.join(&file.network),
        _ => file.network.clone(),
    };
    let baseline = load_network(&network_path)?;
    debug!(
        "Loaded {} scenarios against {}",
        file.scenarios.len(),
        network_path.display()
    );
    Ok((baseline, file.scenarios))
}
