//! Named scenario snapshots
//!
//! Entries are keyed by their trimmed name and kept in insertion order.
//! A saved scenario shares its model and bundle through `Arc`, so listing
//! and comparing never copies matrices.

use crate::errors::{RiskError, RiskResult};
use crate::models::{Annotated, MetricsBundle};
use crate::network::NetworkModel;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// Fewest scenarios a comparison accepts
pub const MIN_COMPARISON: usize = 2;
/// Most scenarios a comparison accepts
pub const MAX_COMPARISON: usize = 4;

/// Opaque identifier assigned on save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ScenarioId(Uuid);

impl ScenarioId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One saved (network, metrics) snapshot
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub model: Arc<NetworkModel>,
    pub bundle: Arc<MetricsBundle>,
}

/// Listing entry without the heavy payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub id: ScenarioId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub entity_count: usize,
    pub score: Annotated<f64>,
}

impl From<&Scenario> for ScenarioSummary {
    fn from(scenario: &Scenario) -> Self {
        Self {
            id: scenario.id,
            name: scenario.name.clone(),
            created_at: scenario.created_at,
            description: scenario.description.clone(),
            entity_count: scenario.bundle.entity_count,
            score: scenario.bundle.score.clone(),
        }
    }
}

/// One row of a side-by-side comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub name: String,
    pub score: Annotated<f64>,
    pub normalized_score: Annotated<f64>,
    pub fragility: Annotated<f64>,
    pub entity_count: usize,
    pub mean_stress: f64,
}

/// Rows in the order the scenarios were requested
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Name of the row with the highest defined score
    pub fn riskiest(&self) -> Option<&str> {
        self.rows
            .iter()
            .filter_map(|row| row.score.defined().map(|s| (row, *s)))
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(row, _)| row.name.as_str())
    }
}

/// Thread-safe named scenario registry
#[derive(Debug, Default)]
pub struct ScenarioStore {
    scenarios: RwLock<IndexMap<String, Scenario>>,
}

impl ScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoning only happens if a thread panicked mid-update; keep the
    // `.expect()` calls in one place.

    fn read_scenarios(&self) -> RwLockReadGuard<'_, IndexMap<String, Scenario>> {
        self.scenarios
            .read()
            .expect("scenario lock poisoned, a thread panicked while holding this lock")
    }

    fn write_scenarios(&self) -> RwLockWriteGuard<'_, IndexMap<String, Scenario>> {
        self.scenarios
            .write()
            .expect("scenario lock poisoned, a thread panicked while holding this lock")
    }

    /// Save a snapshot under `name` (trimmed). An existing entry with the
    /// same name is left untouched and `DuplicateName` is returned.
    pub fn save(
        &self,
        name: &str,
        model: NetworkModel,
        bundle: MetricsBundle,
        description: Option<String>,
    ) -> RiskResult<ScenarioId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RiskError::InvalidName("scenario names must not be blank"));
        }

        let mut scenarios = self.write_scenarios();
        if scenarios.contains_key(name) {
            return Err(RiskError::DuplicateName(name.to_string()));
        }

        let id = ScenarioId::new();
        let scenario = Scenario {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
            description: description.filter(|d| !d.trim().is_empty()),
            model: Arc::new(model),
            bundle: Arc::new(bundle),
        };
        scenarios.insert(name.to_string(), scenario);
        info!("Saved scenario '{}' ({})", name, id);
        Ok(id)
    }

    /// Compare between [`MIN_COMPARISON`] and [`MAX_COMPARISON`] saved scenarios
    pub fn compare(&self, names: &[&str]) -> RiskResult<ComparisonTable> {
        if names.len() < MIN_COMPARISON {
            return Err(RiskError::InsufficientSelection {
                min: MIN_COMPARISON,
                actual: names.len(),
            });
        }
        if names.len() > MAX_COMPARISON {
            return Err(RiskError::TooManySelections {
                max: MAX_COMPARISON,
                actual: names.len(),
            });
        }

        let scenarios = self.read_scenarios();
        let rows = names
            .iter()
            .map(|name| {
                let name = name.trim();
                let scenario = scenarios
                    .get(name)
                    .ok_or_else(|| RiskError::UnknownScenario(name.to_string()))?;
                let bundle = &scenario.bundle;
                Ok(ComparisonRow {
                    name: scenario.name.clone(),
                    score: bundle.score.clone(),
                    normalized_score: bundle.normalized_score.clone(),
                    fragility: bundle.fragility.clone(),
                    entity_count: bundle.entity_count,
                    mean_stress: bundle.mean_stress,
                })
            })
            .collect::<RiskResult<Vec<_>>>()?;

        debug!("Compared {} scenarios", rows.len());
        Ok(ComparisonTable { rows })
    }

    /// Remove one scenario
    pub fn delete(&self, name: &str) -> RiskResult<()> {
        let name = name.trim();
        match self.write_scenarios().shift_remove(name) {
            Some(_) => {
                info!("Deleted scenario '{}'", name);
                Ok(())
            }
            None => Err(RiskError::UnknownScenario(name.to_string())),
        }
    }

    /// Remove every scenario
    pub fn clear(&self) {
        let mut scenarios = self.write_scenarios();
        let count = scenarios.len();
        scenarios.clear();
        info!("Cleared {} scenarios", count);
    }

    pub fn get(&self, name: &str) -> Option<Scenario> {
        self.read_scenarios().get(name.trim()).cloned()
    }

    /// Summaries in save order
    pub fn list(&self) -> Vec<ScenarioSummary> {
        self.read_scenarios().values().map(ScenarioSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.read_scenarios().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_scenarios().is_empty()
    }
}
