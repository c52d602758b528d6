//! Structural scenarios and their bookkeeping
//!
//! - [`ScenarioEngine`] derives new networks from a baseline (stress
//!   overrides, entity removal, weight edits) and re-evaluates them. The
//!   baseline is never touched and every batch is all-or-nothing.
//! - [`ScenarioStore`] keeps named, timestamped snapshots of
//!   (network, metrics) for side-by-side comparison. Bind one store per
//!   logical session.

mod engine;
mod store;

pub use engine::{
    DeltaSummary, ModificationOutcome, ModificationSummary, RemovalOutcome, RemovalSummary,
    RemovedEntity, ScenarioEngine, WeightEdit, WhatIfOutcome,
};
pub use store::{
    ComparisonRow, ComparisonTable, Scenario, ScenarioId, ScenarioStore, ScenarioSummary,
    MAX_COMPARISON, MIN_COMPARISON,
};
