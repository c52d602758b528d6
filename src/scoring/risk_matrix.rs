//! Risk matrix construction

use crate::config::RiskMatrixStrategy;
use nalgebra::DMatrix;

/// (A + Aᵀ) / 2
pub fn symmetrized(weights: &DMatrix<f64>) -> DMatrix<f64> {
    (weights + weights.transpose()) * 0.5
}

/// Build E from an already symmetrized adjacency
pub fn risk_matrix(adjacency: &DMatrix<f64>, strategy: RiskMatrixStrategy) -> DMatrix<f64> {
    match strategy {
        RiskMatrixStrategy::IdentityPlusAdjacency => {
            let n = adjacency.nrows();
            DMatrix::identity(n, n) + adjacency
        }
        RiskMatrixStrategy::AdjacencyOnly => adjacency.clone(),
    }
}
