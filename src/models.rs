//! Core data models for netrisk
//!
//! These models are shared by the risk engine, the scenario engine and the
//! reporters. A [`MetricsBundle`] is always derived from exactly one
//! [`NetworkModel`](crate::network::NetworkModel) and is never patched.

use serde::{Deserialize, Serialize};

/// One analyzed node of the network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier (e.g. an LEI or a short ticker)
    pub id: String,
    /// Display name
    pub name: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// How a reported value came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Definedness {
    /// Computed from the formula
    #[default]
    Computed,
    /// The formula divides by zero; zero is reported by documented convention
    ZeroByConvention,
    /// Mathematically undefined; the value is NaN and must not be rendered
    Undefined,
}

/// A value together with its definedness status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotated<T> {
    pub value: T,
    pub status: Definedness,
}

impl<T> Annotated<T> {
    pub fn computed(value: T) -> Self {
        Self {
            value,
            status: Definedness::Computed,
        }
    }

    pub fn by_convention(value: T) -> Self {
        Self {
            value,
            status: Definedness::ZeroByConvention,
        }
    }

    pub fn undefined(value: T) -> Self {
        Self {
            value,
            status: Definedness::Undefined,
        }
    }

    /// False only for [`Definedness::Undefined`]
    pub fn is_defined(&self) -> bool {
        self.status != Definedness::Undefined
    }

    /// The value, if it is defined
    pub fn defined(&self) -> Option<&T> {
        self.is_defined().then_some(&self.value)
    }
}

impl Annotated<f64> {
    pub fn undefined_scalar() -> Self {
        Self::undefined(f64::NAN)
    }
}

impl Annotated<Vec<f64>> {
    pub fn undefined_vector(n: usize) -> Self {
        Self::undefined(vec![f64::NAN; n])
    }
}

impl Annotated<Vec<Vec<f64>>> {
    pub fn undefined_matrix(n: usize) -> Self {
        Self::undefined(vec![vec![f64::NAN; n]; n])
    }
}

/// Output of one risk-engine evaluation over one network
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsBundle {
    /// Number of entities the bundle was computed over
    pub entity_count: usize,
    /// Mean stress of the evaluated network
    pub mean_stress: f64,
    /// Systemic risk score S = sqrt(C'EC)
    pub score: Annotated<f64>,
    /// S / sqrt(C'C)
    pub normalized_score: Annotated<f64>,
    /// dS/dC
    pub gradient: Annotated<Vec<f64>>,
    /// D_i = C_i * g_i, sums to S
    pub decomposition: Annotated<Vec<f64>>,
    /// |sum(D) - S|, NaN when either side is undefined
    pub decomposition_residual: f64,
    /// Per-entity marginal contribution (the gradient where stress is positive)
    pub risk_increment: Vec<Annotated<f64>>,
    /// Row sums of the symmetrized adjacency
    pub degrees: Vec<f64>,
    /// k_i / K
    pub centrality: Annotated<Vec<f64>>,
    /// centrality_i * C_i
    pub criticality: Annotated<Vec<f64>>,
    /// Principal eigenvector of the symmetrized adjacency (L2-normalized)
    pub eigenvector_centrality: Annotated<Vec<f64>>,
    /// Herfindahl index of the degree shares
    pub fragility: Annotated<f64>,
    /// E[k^2] / E[k]
    pub degree_moment_ratio: Annotated<f64>,
    /// Hessian of S with respect to C (row-major)
    pub cross_risk: Annotated<Vec<Vec<f64>>>,
    /// d D_j / d C_i (row-major, row = perturbed entity)
    pub contribution_sensitivity: Annotated<Vec<Vec<f64>>>,
}

impl MetricsBundle {
    /// Indices of entities sorted by decreasing risk contribution.
    /// Empty when the decomposition is undefined.
    pub fn ranked_contributors(&self) -> Vec<usize> {
        let Some(d) = self.decomposition.defined() else {
            return Vec::new();
        };
        let mut order: Vec<usize> = (0..d.len()).collect();
        order.sort_by(|&a, &b| d[b].total_cmp(&d[a]).then(a.cmp(&b)));
        order
    }
}
