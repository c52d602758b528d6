//! Risk engine: pure functions from a network to its metrics
//!
//! The engine holds configuration only. Every method recomputes from the
//! model it is given, so one engine can serve many threads at once.

use super::centrality::{eigenvector_centrality, DegreeProfile};
use super::risk_matrix::{risk_matrix, symmetrized};
use crate::config::{CentralityConfig, EngineConfig, NetriskConfig, RiskMatrixStrategy};
use crate::models::{Annotated, MetricsBundle};
use crate::network::NetworkModel;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

/// Shared intermediate results for one model
struct Intermediates {
    adjacency: DMatrix<f64>,
    e: DMatrix<f64>,
    stress: DVector<f64>,
    /// E·C / m with m = max|C_i|, so nothing below overflows for large C
    scaled_ec: DVector<f64>,
    /// sqrt(C'EC) / m
    scaled_root: f64,
    /// |C| / m
    scaled_norm: f64,
    score: Annotated<f64>,
}

/// Systemic-risk calculator over immutable network snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskEngine {
    engine: EngineConfig,
    centrality: CentralityConfig,
}

impl RiskEngine {
    pub fn new(engine: EngineConfig, centrality: CentralityConfig) -> Self {
        Self { engine, centrality }
    }

    pub fn from_config(config: &NetriskConfig) -> Self {
        Self::new(config.engine.clone(), config.centrality.clone())
    }

    /// Default settings with a different risk-matrix strategy
    pub fn with_strategy(strategy: RiskMatrixStrategy) -> Self {
        Self {
            engine: EngineConfig {
                risk_matrix: strategy,
                ..EngineConfig::default()
            },
            centrality: CentralityConfig::default(),
        }
    }

    pub fn strategy(&self) -> RiskMatrixStrategy {
        self.engine.risk_matrix
    }

    fn prepare(&self, model: &NetworkModel) -> Intermediates {
        let adjacency = symmetrized(model.weights());
        let e = risk_matrix(&adjacency, self.engine.risk_matrix);
        let stress = model.stress().clone();

        // Work on C / max|C_i| so C'EC neither overflows nor underflows
        // while S itself is representable
        let m = stress.amax();
        let unit = if m > 0.0 { &stress / m } else { stress.clone() };
        let scaled_ec = &e * &unit;
        let radicand = unit.dot(&scaled_ec);
        debug!("n={}, m={:e}, (C'EC)/m^2={:.12}", stress.len(), m, radicand);

        let (score, scaled_root) = if radicand.is_finite() && radicand >= 0.0 {
            let root = radicand.sqrt();
            let s = m * root;
            if s.is_finite() {
                (Annotated::computed(s), root)
            } else {
                warn!("Systemic risk score overflows f64 (m = {:e}), score is undefined", m);
                (Annotated::undefined_scalar(), f64::NAN)
            }
        } else {
            warn!(
                "Degenerate risk matrix: C'EC = {} m^2 has no real square root, score is undefined",
                radicand
            );
            (Annotated::undefined_scalar(), f64::NAN)
        };

        Intermediates {
            adjacency,
            e,
            scaled_norm: unit.norm(),
            stress,
            scaled_ec,
            scaled_root,
            score,
        }
    }

    /// S = sqrt(C'EC)
    pub fn score(&self, model: &NetworkModel) -> Annotated<f64> {
        self.prepare(model).score
    }

    /// S / sqrt(C'C), zero by convention when C = 0
    pub fn normalized_score(&self, model: &NetworkModel) -> Annotated<f64> {
        normalized_of(&self.prepare(model))
    }

    /// g = EC / S, undefined when S = 0
    pub fn gradient(&self, model: &NetworkModel) -> Annotated<Vec<f64>> {
        gradient_of(&self.prepare(model))
    }

    /// D_i = C_i g_i
    pub fn decomposition(&self, model: &NetworkModel) -> Annotated<Vec<f64>> {
        let inter = self.prepare(model);
        decomposition_of(&inter, &gradient_of(&inter))
    }

    /// g_i where C_i > 0, zero by convention where C_i = 0
    pub fn risk_increment(&self, model: &NetworkModel) -> Vec<Annotated<f64>> {
        let inter = self.prepare(model);
        risk_increment_of(&inter, &gradient_of(&inter))
    }

    /// Hessian of S: E/S − (EC)(EC)ᵀ/S³
    pub fn cross_risk(&self, model: &NetworkModel) -> Annotated<Vec<Vec<f64>>> {
        let inter = self.prepare(model);
        match hessian_of(&inter) {
            Some(h) => Annotated::computed(rows_of(&h)),
            None => Annotated::undefined_matrix(model.len()),
        }
    }

    /// ∂D_j/∂C_i = δ_ij g_j + Δ_ij C_j
    pub fn contribution_sensitivity(&self, model: &NetworkModel) -> Annotated<Vec<Vec<f64>>> {
        let inter = self.prepare(model);
        let hessian = hessian_of(&inter);
        sensitivity_of(&inter, &gradient_of(&inter), hessian.as_ref())
    }

    /// Row sums of the symmetrized adjacency
    pub fn degrees(&self, model: &NetworkModel) -> Vec<f64> {
        DegreeProfile::from_adjacency(&symmetrized(model.weights()))
            .degrees()
            .to_vec()
    }

    /// Σ (k_i/K)², zero by convention when K = 0
    pub fn fragility(&self, model: &NetworkModel) -> Annotated<f64> {
        DegreeProfile::from_adjacency(&symmetrized(model.weights())).herfindahl()
    }

    /// E[k²] / E[k]
    pub fn degree_moment_ratio(&self, model: &NetworkModel) -> Annotated<f64> {
        DegreeProfile::from_adjacency(&symmetrized(model.weights())).moment_ratio()
    }

    /// k_i / K
    pub fn centrality(&self, model: &NetworkModel) -> Annotated<Vec<f64>> {
        DegreeProfile::from_adjacency(&symmetrized(model.weights())).shares()
    }

    /// centrality_i × C_i
    pub fn criticality(&self, model: &NetworkModel) -> Annotated<Vec<f64>> {
        criticality_of(&self.centrality(model), model.stress())
    }

    /// Principal eigenvector of the symmetrized adjacency
    pub fn eigenvector_centrality(&self, model: &NetworkModel) -> Annotated<Vec<f64>> {
        let adjacency = symmetrized(model.weights());
        let profile = DegreeProfile::from_adjacency(&adjacency);
        self.eigenvector_of(&adjacency, &profile)
    }

    fn eigenvector_of(
        &self,
        adjacency: &DMatrix<f64>,
        profile: &DegreeProfile,
    ) -> Annotated<Vec<f64>> {
        let n = adjacency.nrows();
        if profile.total() <= 0.0 {
            return Annotated::by_convention(vec![0.0; n]);
        }
        match eigenvector_centrality(
            adjacency,
            self.centrality.max_iterations,
            self.centrality.tolerance,
        ) {
            Some(v) => Annotated::computed(v),
            None => Annotated::undefined_vector(n),
        }
    }

    /// Compute every metric in one pass, sharing EC and S
    pub fn evaluate(&self, model: &NetworkModel) -> MetricsBundle {
        let inter = self.prepare(model);
        let gradient = gradient_of(&inter);
        let decomposition = decomposition_of(&inter, &gradient);
        let risk_increment = risk_increment_of(&inter, &gradient);
        let hessian = hessian_of(&inter);
        let contribution_sensitivity = sensitivity_of(&inter, &gradient, hessian.as_ref());
        let cross_risk = match &hessian {
            Some(h) => Annotated::computed(rows_of(h)),
            None => Annotated::undefined_matrix(model.len()),
        };

        let profile = DegreeProfile::from_adjacency(&inter.adjacency);
        let centrality = profile.shares();
        let criticality = criticality_of(&centrality, &inter.stress);
        let eigenvector_centrality = self.eigenvector_of(&inter.adjacency, &profile);

        let decomposition_residual = self.check_identity(&inter.score, &decomposition);

        MetricsBundle {
            entity_count: model.len(),
            mean_stress: model.mean_stress(),
            score: inter.score.clone(),
            normalized_score: normalized_of(&inter),
            gradient,
            decomposition,
            decomposition_residual,
            risk_increment,
            degrees: profile.degrees().to_vec(),
            centrality,
            criticality,
            eigenvector_centrality,
            fragility: profile.herfindahl(),
            degree_moment_ratio: profile.moment_ratio(),
            cross_risk,
            contribution_sensitivity,
        }
    }

    /// |Σ D_i − S|, warning when it exceeds the relative tolerance
    fn check_identity(&self, score: &Annotated<f64>, decomposition: &Annotated<Vec<f64>>) -> f64 {
        let (Some(&s), Some(d)) = (score.defined(), decomposition.defined()) else {
            return f64::NAN;
        };
        let residual = (d.iter().sum::<f64>() - s).abs();
        if residual > self.engine.identity_tolerance * s.max(f64::MIN_POSITIVE) {
            warn!(
                "Decomposition identity violated: |sum(D) - S| = {:e} for S = {}",
                residual, s
            );
        }
        residual
    }
}

fn normalized_of(inter: &Intermediates) -> Annotated<f64> {
    if inter.scaled_norm == 0.0 {
        return Annotated::by_convention(0.0);
    }
    match inter.score.defined() {
        // S / |C| with the common scale m cancelled
        Some(_) => Annotated::computed(inter.scaled_root / inter.scaled_norm),
        None => Annotated::undefined_scalar(),
    }
}

/// Positive, defined score or nothing
fn positive_score(inter: &Intermediates) -> Option<f64> {
    inter.score.defined().copied().filter(|&s| s > 0.0)
}

/// g = EC / S = (EC/m) / (S/m), which is scale-free
fn unit_gradient(inter: &Intermediates) -> Option<DVector<f64>> {
    positive_score(inter)?;
    let g = &inter.scaled_ec / inter.scaled_root;
    g.iter().all(|v| v.is_finite()).then_some(g)
}

fn gradient_of(inter: &Intermediates) -> Annotated<Vec<f64>> {
    match unit_gradient(inter) {
        Some(g) => Annotated::computed(g.iter().copied().collect()),
        None => Annotated::undefined_vector(inter.stress.len()),
    }
}

fn decomposition_of(inter: &Intermediates, gradient: &Annotated<Vec<f64>>) -> Annotated<Vec<f64>> {
    let n = inter.stress.len();
    match (inter.score.defined(), gradient.defined()) {
        (Some(_), Some(g)) => Annotated::computed(
            inter.stress.iter().zip(g).map(|(c, g)| c * g).collect(),
        ),
        // S = 0: nothing to decompose, and zeros still sum to S
        (Some(_), None) => Annotated::by_convention(vec![0.0; n]),
        (None, _) => Annotated::undefined_vector(n),
    }
}

fn risk_increment_of(inter: &Intermediates, gradient: &Annotated<Vec<f64>>) -> Vec<Annotated<f64>> {
    inter
        .stress
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            if c == 0.0 {
                Annotated::by_convention(0.0)
            } else {
                match gradient.defined() {
                    Some(g) => Annotated::computed(g[i]),
                    None => Annotated::undefined_scalar(),
                }
            }
        })
        .collect()
}

/// Δ = (E − g gᵀ) / S, or `None` when S = 0 or an entry is not finite
fn hessian_of(inter: &Intermediates) -> Option<DMatrix<f64>> {
    let s = positive_score(inter)?;
    let g = unit_gradient(inter)?;
    let h = (&inter.e - &g * g.transpose()) / s;
    if h.iter().all(|v| v.is_finite()) {
        Some(h)
    } else {
        warn!("Cross-risk matrix is not representable at S = {:e}, reporting undefined", s);
        None
    }
}

fn sensitivity_of(
    inter: &Intermediates,
    gradient: &Annotated<Vec<f64>>,
    hessian: Option<&DMatrix<f64>>,
) -> Annotated<Vec<Vec<f64>>> {
    let n = inter.stress.len();
    let (Some(g), Some(h)) = (gradient.defined(), hessian) else {
        return Annotated::undefined_matrix(n);
    };
    let rows = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let own = if i == j { g[j] } else { 0.0 };
                    own + h[(i, j)] * inter.stress[j]
                })
                .collect()
        })
        .collect();
    Annotated::computed(rows)
}

fn criticality_of(centrality: &Annotated<Vec<f64>>, stress: &DVector<f64>) -> Annotated<Vec<f64>> {
    Annotated {
        value: centrality
            .value
            .iter()
            .zip(stress.iter())
            .map(|(cen, c)| cen * c)
            .collect(),
        status: centrality.status,
    }
}

fn rows_of(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter().map(|row| row.iter().copied().collect()).collect()
}

#[cfg(test)]
mod tests;
