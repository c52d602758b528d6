//! Network model: entities, stress vector and weight matrix
//!
//! A [`NetworkModel`] is immutable by convention. Every mutation
//! (`subnetwork`, `with_stress`, `with_weight`) returns a new model, so
//! bundles and saved scenarios computed from an older model stay valid.
//!
//! Entity order is the canonical row/column order of every vector and
//! matrix derived from the model.

use crate::errors::{RiskError, RiskResult};
use crate::models::Entity;
use nalgebra::{DMatrix, DVector};
use std::collections::HashSet;
use tracing::warn;

/// Entities, their stress values and the pairwise connection weights
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkModel {
    entities: Vec<Entity>,
    stress: DVector<f64>,
    weights: DMatrix<f64>,
}

impl NetworkModel {
    /// Build a model from an ordered entity list, a stress vector and a
    /// row-major weight matrix.
    ///
    /// Non-zero diagonal weights are zeroed (self-loops are excluded) with a
    /// warning rather than rejected.
    pub fn new(
        entities: Vec<Entity>,
        stress: Vec<f64>,
        weights: Vec<Vec<f64>>,
    ) -> RiskResult<Self> {
        let n = entities.len();
        if weights.len() != n {
            return Err(RiskError::ShapeMismatch {
                what: "weight matrix rows",
                expected: n,
                actual: weights.len(),
            });
        }
        if let Some(row) = weights.iter().find(|row| row.len() != n) {
            return Err(RiskError::ShapeMismatch {
                what: "weight matrix row",
                expected: n,
                actual: row.len(),
            });
        }
        let matrix = DMatrix::from_fn(n, n, |i, j| weights[i][j]);
        Self::from_parts(entities, DVector::from_vec(stress), matrix)
    }

    /// Build a model from nalgebra parts. Same validation as [`NetworkModel::new`].
    pub fn from_parts(
        entities: Vec<Entity>,
        stress: DVector<f64>,
        mut weights: DMatrix<f64>,
    ) -> RiskResult<Self> {
        let n = entities.len();
        if n == 0 {
            return Err(RiskError::EmptySelection("a network needs at least one entity"));
        }
        if stress.len() != n {
            return Err(RiskError::ShapeMismatch {
                what: "stress vector",
                expected: n,
                actual: stress.len(),
            });
        }
        if weights.nrows() != n || weights.ncols() != n {
            return Err(RiskError::ShapeMismatch {
                what: "weight matrix",
                expected: n,
                actual: if weights.nrows() != n {
                    weights.nrows()
                } else {
                    weights.ncols()
                },
            });
        }

        let mut seen = HashSet::with_capacity(n);
        for entity in &entities {
            if !seen.insert(entity.id.as_str()) {
                return Err(RiskError::DuplicateEntity(entity.id.clone()));
            }
        }

        for &value in stress.iter() {
            check_non_negative("stress", value)?;
        }

        for i in 0..n {
            for j in 0..n {
                let value = weights[(i, j)];
                if !value.is_finite() {
                    return Err(RiskError::InvalidWeight {
                        row: i,
                        col: j,
                        value,
                        reason: "weights must be finite",
                    });
                }
                if value < 0.0 {
                    return Err(RiskError::InvalidWeight {
                        row: i,
                        col: j,
                        value,
                        reason: "weights must be non-negative",
                    });
                }
            }
            if weights[(i, i)] != 0.0 {
                warn!(
                    "Zeroing self-loop weight {} on entity {}",
                    weights[(i, i)],
                    entities[i].id
                );
                weights[(i, i)] = 0.0;
            }
        }

        Ok(Self {
            entities,
            stress,
            weights,
        })
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Always false for a constructed model; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, index: usize) -> RiskResult<&Entity> {
        self.entities.get(index).ok_or(RiskError::OutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Position of the entity with the given id
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    pub fn stress(&self) -> &DVector<f64> {
        &self.stress
    }

    pub fn weights(&self) -> &DMatrix<f64> {
        &self.weights
    }

    /// Arithmetic mean of the stress vector
    pub fn mean_stress(&self) -> f64 {
        self.stress.mean()
    }

    /// A new model keeping only the entities at `keep_indices`, in their
    /// original relative order. Duplicate indices are ignored.
    pub fn subnetwork(&self, keep_indices: &[usize]) -> RiskResult<Self> {
        if keep_indices.is_empty() {
            return Err(RiskError::EmptySelection(
                "a subnetwork must keep at least one entity",
            ));
        }
        let mut keep = keep_indices.to_vec();
        keep.sort_unstable();
        keep.dedup();
        if let Some(&bad) = keep.iter().find(|&&i| i >= self.len()) {
            return Err(RiskError::OutOfRange {
                index: bad,
                len: self.len(),
            });
        }

        Ok(Self {
            entities: keep.iter().map(|&i| self.entities[i].clone()).collect(),
            stress: self.stress.select_rows(&keep),
            weights: self.weights.select_rows(&keep).select_columns(&keep),
        })
    }

    /// A new model without the entities at `remove_indices`. Duplicates are
    /// ignored and removing nothing returns an identical model.
    pub fn without_entities(&self, remove_indices: &[usize]) -> RiskResult<Self> {
        let mut removed = vec![false; self.len()];
        for &index in remove_indices {
            self.check_index(index)?;
            removed[index] = true;
        }
        let keep: Vec<usize> = (0..self.len()).filter(|&i| !removed[i]).collect();
        if keep.is_empty() {
            return Err(RiskError::EmptySelection(
                "removal would leave no entities in the network",
            ));
        }
        self.subnetwork(&keep)
    }

    /// A new model with one stress entry replaced
    pub fn with_stress(&self, index: usize, value: f64) -> RiskResult<Self> {
        self.check_index(index)?;
        check_non_negative("stress", value)?;
        let mut next = self.clone();
        next.stress[index] = value;
        Ok(next)
    }

    /// A new model with the single directed weight `from -> to` replaced.
    /// The reverse direction is left untouched.
    pub fn with_weight(&self, from: usize, to: usize, value: f64) -> RiskResult<Self> {
        self.check_index(from)?;
        self.check_index(to)?;
        check_non_negative("weight", value)?;
        if from == to && value != 0.0 {
            return Err(RiskError::InvalidWeight {
                row: from,
                col: to,
                value,
                reason: "self-loops are excluded",
            });
        }
        let mut next = self.clone();
        next.weights[(from, to)] = value;
        Ok(next)
    }

    pub(crate) fn check_index(&self, index: usize) -> RiskResult<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(RiskError::OutOfRange {
                index,
                len: self.len(),
            })
        }
    }
}

pub(crate) fn check_non_negative(what: &'static str, value: f64) -> RiskResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RiskError::NegativeValue { what, value })
    }
}
