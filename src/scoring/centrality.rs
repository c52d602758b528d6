//! Degree concentration and eigenvector centrality
//!
//! All measures run on the symmetrized adjacency, so "degree" is the
//! average of outgoing and incoming weight.

use crate::models::Annotated;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

/// Weighted degrees k_i and their total K
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeProfile {
    degrees: Vec<f64>,
    total: f64,
}

impl DegreeProfile {
    /// Row sums of a symmetrized adjacency
    pub fn from_adjacency(adjacency: &DMatrix<f64>) -> Self {
        let degrees: Vec<f64> = adjacency.row_iter().map(|row| row.sum()).collect();
        let total = degrees.iter().sum();
        debug!("Degree profile: n={}, K={:.6}", degrees.len(), total);
        Self { degrees, total }
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// K
    pub fn total(&self) -> f64 {
        self.total
    }

    fn is_disconnected(&self) -> bool {
        self.total <= 0.0
    }

    /// k_i / K, zero vector by convention when K = 0
    pub fn shares(&self) -> Annotated<Vec<f64>> {
        if self.is_disconnected() {
            return Annotated::by_convention(vec![0.0; self.degrees.len()]);
        }
        Annotated::computed(self.degrees.iter().map(|k| k / self.total).collect())
    }

    /// Herfindahl index Σ (k_i / K)²
    pub fn herfindahl(&self) -> Annotated<f64> {
        if self.is_disconnected() {
            return Annotated::by_convention(0.0);
        }
        Annotated::computed(
            self.degrees
                .iter()
                .map(|k| {
                    let share = k / self.total;
                    share * share
                })
                .sum(),
        )
    }

    /// E[k²] / E[k]
    pub fn moment_ratio(&self) -> Annotated<f64> {
        if self.is_disconnected() {
            return Annotated::by_convention(0.0);
        }
        let n = self.degrees.len() as f64;
        let mean = self.total / n;
        let mean_sq = self.degrees.iter().map(|k| k * k).sum::<f64>() / n;
        Annotated::computed(mean_sq / mean)
    }
}

/// Principal eigenvector of a symmetric non-negative matrix by power
/// iteration on (A + I), L2-normalized.
///
/// Starts from the uniform vector and stops once Σ|x_new − x| < n·tolerance.
/// Returns `None` if `max_iterations` is exhausted first.
pub fn eigenvector_centrality(
    adjacency: &DMatrix<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Option<Vec<f64>> {
    let n = adjacency.nrows();
    if n == 0 {
        return Some(vec![]);
    }

    let mut x = DVector::from_element(n, 1.0 / n as f64);
    for iteration in 0..max_iterations {
        // The +I shift keeps bipartite graphs from oscillating
        let y = adjacency * &x + &x;
        let norm = y.norm();
        if norm == 0.0 {
            return Some(vec![0.0; n]);
        }
        let next = y / norm;
        let diff: f64 = (&next - &x).abs().sum();
        x = next;
        if diff < n as f64 * tolerance {
            debug!("Eigenvector centrality converged after {} iterations", iteration + 1);
            return Some(x.iter().copied().collect());
        }
    }

    warn!(
        "Eigenvector centrality did not converge within {} iterations",
        max_iterations
    );
    None
}
