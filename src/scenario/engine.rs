//! Scenario engine: derive, re-evaluate, compare
//!
//! Each operation folds its batch over immutable models, so a failing
//! override or edit aborts the whole batch before any result escapes.
//! The baseline model is only ever borrowed.

use crate::errors::RiskResult;
use crate::models::{Annotated, MetricsBundle};
use crate::network::NetworkModel;
use crate::scoring::RiskEngine;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One directed weight edit `from -> to`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightEdit {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
}

impl WeightEdit {
    pub fn new(from: usize, to: usize, weight: f64) -> Self {
        Self { from, to, weight }
    }
}

/// Change in score and per-entity metrics between a baseline and a what-if
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaSummary {
    pub score_before: Annotated<f64>,
    pub score_after: Annotated<f64>,
    /// S_new − S_old
    pub score_delta: Annotated<f64>,
    /// 100 × ΔS / S_old, zero by convention when S_old = 0
    pub percent_change: Annotated<f64>,
    pub decomposition_delta: Annotated<Vec<f64>>,
    pub criticality_delta: Annotated<Vec<f64>>,
    pub cross_risk_delta: Annotated<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone)]
pub struct WhatIfOutcome {
    pub model: NetworkModel,
    pub bundle: MetricsBundle,
    pub delta: DeltaSummary,
}

/// An entity dropped by a removal scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedEntity {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub stress: f64,
}

/// Before/after comparison for a removal scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalSummary {
    pub entity_count_before: usize,
    pub entity_count_after: usize,
    pub removed: Vec<RemovedEntity>,
    pub score_before: Annotated<f64>,
    pub score_after: Annotated<f64>,
    pub score_delta: Annotated<f64>,
    pub normalized_score_before: Annotated<f64>,
    pub normalized_score_after: Annotated<f64>,
    pub fragility_before: Annotated<f64>,
    pub fragility_after: Annotated<f64>,
    pub fragility_delta: Annotated<f64>,
}

#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    pub model: NetworkModel,
    pub bundle: MetricsBundle,
    pub summary: RemovalSummary,
}

/// Before/after comparison for a weight-edit scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModificationSummary {
    pub edits: Vec<WeightEdit>,
    pub score_before: Annotated<f64>,
    pub score_after: Annotated<f64>,
    pub score_delta: Annotated<f64>,
    pub normalized_score_before: Annotated<f64>,
    pub normalized_score_after: Annotated<f64>,
    pub fragility_before: Annotated<f64>,
    pub fragility_after: Annotated<f64>,
    pub fragility_delta: Annotated<f64>,
}

#[derive(Debug, Clone)]
pub struct ModificationOutcome {
    pub model: NetworkModel,
    pub bundle: MetricsBundle,
    pub summary: ModificationSummary,
}

/// Applies structural mutations to a baseline and re-runs the risk engine
#[derive(Debug, Clone, Default)]
pub struct ScenarioEngine {
    risk: RiskEngine,
}

impl ScenarioEngine {
    pub fn new(risk: RiskEngine) -> Self {
        Self { risk }
    }

    pub fn risk_engine(&self) -> &RiskEngine {
        &self.risk
    }

    /// Evaluate one model
    pub fn evaluate(&self, model: &NetworkModel) -> MetricsBundle {
        self.risk.evaluate(model)
    }

    /// Evaluate many models in parallel; output order follows input order
    pub fn evaluate_batch(&self, models: &[NetworkModel]) -> Vec<MetricsBundle> {
        models.par_iter().map(|m| self.risk.evaluate(m)).collect()
    }

    /// Replace stress values and report how S and the decomposition move
    pub fn what_if(
        &self,
        baseline: &NetworkModel,
        overrides: &BTreeMap<usize, f64>,
    ) -> RiskResult<WhatIfOutcome> {
        let model = overrides
            .iter()
            .try_fold(baseline.clone(), |model, (&index, &value)| {
                model.with_stress(index, value)
            })?;
        debug!("What-if: {} stress overrides applied", overrides.len());

        let before = self.risk.evaluate(baseline);
        let bundle = self.risk.evaluate(&model);
        let delta = DeltaSummary {
            score_before: before.score.clone(),
            score_after: bundle.score.clone(),
            score_delta: scalar_delta(&before.score, &bundle.score),
            percent_change: percent_change(&before.score, &bundle.score),
            decomposition_delta: vector_delta(&before.decomposition, &bundle.decomposition),
            criticality_delta: vector_delta(&before.criticality, &bundle.criticality),
            cross_risk_delta: matrix_delta(&before.cross_risk, &bundle.cross_risk),
        };

        Ok(WhatIfOutcome {
            model,
            bundle,
            delta,
        })
    }

    /// Drop the entities at `indices` and compare S and R before and after
    pub fn remove_entities(
        &self,
        baseline: &NetworkModel,
        indices: &[usize],
    ) -> RiskResult<RemovalOutcome> {
        let n = baseline.len();
        let model = baseline.without_entities(indices)?;
        let removed = indices
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|index| {
                let entity = baseline.entity(index)?;
                Ok(RemovedEntity {
                    index,
                    id: entity.id.clone(),
                    name: entity.name.clone(),
                    stress: baseline.stress()[index],
                })
            })
            .collect::<RiskResult<Vec<_>>>()?;
        debug!("Removal: {} of {} entities removed", removed.len(), n);

        let before = self.risk.evaluate(baseline);
        let bundle = self.risk.evaluate(&model);
        let summary = RemovalSummary {
            entity_count_before: n,
            entity_count_after: model.len(),
            removed,
            score_before: before.score.clone(),
            score_after: bundle.score.clone(),
            score_delta: scalar_delta(&before.score, &bundle.score),
            normalized_score_before: before.normalized_score.clone(),
            normalized_score_after: bundle.normalized_score.clone(),
            fragility_before: before.fragility.clone(),
            fragility_after: bundle.fragility.clone(),
            fragility_delta: scalar_delta(&before.fragility, &bundle.fragility),
        };

        Ok(RemovalOutcome {
            model,
            bundle,
            summary,
        })
    }

    /// Apply directed weight edits in order (last write wins) and compare
    pub fn modify_network(
        &self,
        baseline: &NetworkModel,
        edits: &[WeightEdit],
    ) -> RiskResult<ModificationOutcome> {
        let model = edits.iter().try_fold(baseline.clone(), |model, edit| {
            model.with_weight(edit.from, edit.to, edit.weight)
        })?;
        debug!("Modification: {} weight edits applied", edits.len());

        let before = self.risk.evaluate(baseline);
        let bundle = self.risk.evaluate(&model);
        let summary = ModificationSummary {
            edits: edits.to_vec(),
            score_before: before.score.clone(),
            score_after: bundle.score.clone(),
            score_delta: scalar_delta(&before.score, &bundle.score),
            normalized_score_before: before.normalized_score.clone(),
            normalized_score_after: bundle.normalized_score.clone(),
            fragility_before: before.fragility.clone(),
            fragility_after: bundle.fragility.clone(),
            fragility_delta: scalar_delta(&before.fragility, &bundle.fragility),
        };

        Ok(ModificationOutcome {
            model,
            bundle,
            summary,
        })
    }
}

fn scalar_delta(before: &Annotated<f64>, after: &Annotated<f64>) -> Annotated<f64> {
    match (before.defined(), after.defined()) {
        (Some(b), Some(a)) => Annotated::computed(a - b),
        _ => Annotated::undefined_scalar(),
    }
}

fn percent_change(before: &Annotated<f64>, after: &Annotated<f64>) -> Annotated<f64> {
    match (before.defined(), after.defined()) {
        (Some(&b), Some(_)) if b == 0.0 => Annotated::by_convention(0.0),
        (Some(b), Some(a)) => Annotated::computed((a - b) / b * 100.0),
        _ => Annotated::undefined_scalar(),
    }
}

fn vector_delta(before: &Annotated<Vec<f64>>, after: &Annotated<Vec<f64>>) -> Annotated<Vec<f64>> {
    match (before.defined(), after.defined()) {
        (Some(b), Some(a)) if a.len() == b.len() => {
            Annotated::computed(a.iter().zip(b).map(|(a, b)| a - b).collect())
        }
        _ => Annotated::undefined_vector(after.value.len()),
    }
}

fn matrix_delta(
    before: &Annotated<Vec<Vec<f64>>>,
    after: &Annotated<Vec<Vec<f64>>>,
) -> Annotated<Vec<Vec<f64>>> {
    match (before.defined(), after.defined()) {
        (Some(b), Some(a)) if a.len() == b.len() => Annotated::computed(
            a.iter()
                .zip(b)
                .map(|(ra, rb)| ra.iter().zip(rb).map(|(x, y)| x - y).collect())
                .collect(),
        ),
        _ => Annotated::undefined_matrix(after.value.len()),
    }
}
