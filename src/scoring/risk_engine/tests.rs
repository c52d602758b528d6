use super::*;
use crate::models::{Definedness, Entity};

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn entities(n: usize) -> Vec<Entity> {
    (0..n)
        .map(|i| Entity::new(format!("E{i}"), format!("Entity {i}")))
        .collect()
}

fn network(stress: Vec<f64>, weights: Vec<Vec<f64>>) -> NetworkModel {
    NetworkModel::new(entities(stress.len()), stress, weights).expect("valid network")
}

/// 0 — 1 — 2 with stress [1, 2, 3]
fn path3() -> NetworkModel {
    network(
        vec![1.0, 2.0, 3.0],
        vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 0.0],
        ],
    )
}

fn weighted4() -> NetworkModel {
    network(
        vec![0.5, 2.0, 1.25, 3.0],
        vec![
            vec![0.0, 0.3, 0.0, 0.9],
            vec![0.1, 0.0, 0.6, 0.0],
            vec![0.0, 0.4, 0.0, 0.2],
            vec![0.7, 0.0, 0.5, 0.0],
        ],
    )
}

// =========================================================================
// CONCRETE PATH GRAPH
// =========================================================================

#[test]
fn test_path_score() {
    let bundle = RiskEngine::default().evaluate(&path3());
    assert_eq!(bundle.score.status, Definedness::Computed);
    assert!(approx_eq(bundle.score.value, 30f64.sqrt()));
    assert!(bundle.score.value > 0.0);
    assert!(approx_eq(bundle.normalized_score.value, (30.0f64 / 14.0).sqrt()));
}

#[test]
fn test_path_gradient_and_decomposition() {
    let bundle = RiskEngine::default().evaluate(&path3());
    let s = 30f64.sqrt();

    let g = bundle.gradient.defined().expect("gradient defined");
    for (actual, expected) in g.iter().zip([3.0, 6.0, 5.0]) {
        assert!(approx_eq(*actual, expected / s));
    }

    let d = bundle.decomposition.defined().expect("decomposition defined");
    for (actual, expected) in d.iter().zip([3.0, 12.0, 15.0]) {
        assert!(approx_eq(*actual, expected / s));
    }
    assert!(approx_eq(d.iter().sum::<f64>(), s));
    assert!(bundle.decomposition_residual < EPSILON);
}

#[test]
fn test_path_concentration() {
    let bundle = RiskEngine::default().evaluate(&path3());
    assert_eq!(bundle.degrees, vec![1.0, 2.0, 1.0]);
    assert_eq!(bundle.centrality.value, vec![0.25, 0.5, 0.25]);
    assert_eq!(bundle.criticality.value, vec![0.25, 1.0, 0.75]);
    assert!(approx_eq(bundle.fragility.value, 0.375));
    assert_eq!(bundle.fragility.status, Definedness::Computed);
}

#[test]
fn test_path_ranked_contributors() {
    let bundle = RiskEngine::default().evaluate(&path3());
    assert_eq!(bundle.ranked_contributors(), vec![2, 1, 0]);
}

#[test]
fn test_individual_operations_match_evaluate() {
    let engine = RiskEngine::default();
    let model = weighted4();
    let bundle = engine.evaluate(&model);

    assert_eq!(engine.score(&model), bundle.score);
    assert_eq!(engine.normalized_score(&model), bundle.normalized_score);
    assert_eq!(engine.gradient(&model), bundle.gradient);
    assert_eq!(engine.decomposition(&model), bundle.decomposition);
    assert_eq!(engine.risk_increment(&model), bundle.risk_increment);
    assert_eq!(engine.cross_risk(&model), bundle.cross_risk);
    assert_eq!(
        engine.contribution_sensitivity(&model),
        bundle.contribution_sensitivity
    );
    assert_eq!(engine.degrees(&model), bundle.degrees);
    assert_eq!(engine.fragility(&model), bundle.fragility);
    assert_eq!(engine.degree_moment_ratio(&model), bundle.degree_moment_ratio);
    assert_eq!(engine.centrality(&model), bundle.centrality);
    assert_eq!(engine.criticality(&model), bundle.criticality);
    assert_eq!(
        engine.eigenvector_centrality(&model),
        bundle.eigenvector_centrality
    );
}

// =========================================================================
// DERIVATIVES AGAINST FINITE DIFFERENCES
// =========================================================================

#[test]
fn test_gradient_matches_finite_difference() {
    let engine = RiskEngine::default();
    let model = weighted4();
    let g = engine.gradient(&model).value;
    let h = 1e-6;

    for j in 0..model.len() {
        let c = model.stress()[j];
        let up = engine.score(&model.with_stress(j, c + h).expect("edit")).value;
        let down = engine.score(&model.with_stress(j, c - h).expect("edit")).value;
        let numeric = (up - down) / (2.0 * h);
        assert!((numeric - g[j]).abs() < 1e-6, "j={j}: {numeric} vs {}", g[j]);
    }
}

#[test]
fn test_cross_risk_matches_finite_difference() {
    let engine = RiskEngine::default();
    let model = weighted4();
    let hessian = engine.cross_risk(&model).value;
    let h = 1e-5;

    for j in 0..model.len() {
        let c = model.stress()[j];
        let up = engine.gradient(&model.with_stress(j, c + h).expect("edit")).value;
        let down = engine.gradient(&model.with_stress(j, c - h).expect("edit")).value;
        for i in 0..model.len() {
            let numeric = (up[i] - down[i]) / (2.0 * h);
            assert!(
                (numeric - hessian[i][j]).abs() < 1e-6,
                "({i},{j}): {numeric} vs {}",
                hessian[i][j]
            );
        }
    }
}

#[test]
fn test_contribution_sensitivity_matches_finite_difference() {
    let engine = RiskEngine::default();
    let model = weighted4();
    let sensitivity = engine.contribution_sensitivity(&model).value;
    let h = 1e-5;

    for i in 0..model.len() {
        let c = model.stress()[i];
        let up = engine.decomposition(&model.with_stress(i, c + h).expect("edit")).value;
        let down = engine.decomposition(&model.with_stress(i, c - h).expect("edit")).value;
        for j in 0..model.len() {
            let numeric = (up[j] - down[j]) / (2.0 * h);
            assert!(
                (numeric - sensitivity[i][j]).abs() < 1e-6,
                "({i},{j}): {numeric} vs {}",
                sensitivity[i][j]
            );
        }
    }
}

#[test]
fn test_cross_risk_symmetric_for_directed_weights() {
    let bundle = RiskEngine::default().evaluate(&weighted4());
    let delta = bundle.cross_risk.defined().expect("defined");
    for i in 0..4 {
        for j in 0..4 {
            assert_eq!(delta[i][j], delta[j][i]);
        }
    }
}

#[test]
fn test_symmetrizing_preserves_score() {
    let engine = RiskEngine::default();
    let directed = network(vec![1.0, 2.0], vec![vec![0.0, 1.0], vec![0.0, 0.0]]);
    let symmetric = network(vec![1.0, 2.0], vec![vec![0.0, 0.5], vec![0.5, 0.0]]);
    assert!(approx_eq(
        engine.score(&directed).value,
        engine.score(&symmetric).value
    ));
    assert_eq!(
        engine.evaluate(&directed).cross_risk,
        engine.evaluate(&symmetric).cross_risk
    );
}

// =========================================================================
// DEGENERATE INPUTS
// =========================================================================

#[test]
fn test_zero_stress_everywhere() {
    let model = network(vec![0.0, 0.0, 0.0], path3_weights());
    let bundle = RiskEngine::default().evaluate(&model);

    assert_eq!(bundle.score, Annotated::computed(0.0));
    assert_eq!(bundle.normalized_score, Annotated::by_convention(0.0));
    assert!(!bundle.gradient.is_defined());
    assert!(bundle.gradient.value.iter().all(|v| v.is_nan()));
    assert_eq!(bundle.decomposition, Annotated::by_convention(vec![0.0; 3]));
    assert!(bundle
        .risk_increment
        .iter()
        .all(|i| i.status == Definedness::ZeroByConvention && i.value == 0.0));
    assert!(!bundle.cross_risk.is_defined());
    assert!(!bundle.contribution_sensitivity.is_defined());
    assert_eq!(bundle.decomposition_residual, 0.0);
    // Network measures do not depend on stress
    assert!(approx_eq(bundle.fragility.value, 0.375));
    assert_eq!(bundle.criticality.value, vec![0.0; 3]);
}

fn path3_weights() -> Vec<Vec<f64>> {
    vec![
        vec![0.0, 1.0, 0.0],
        vec![1.0, 0.0, 1.0],
        vec![0.0, 1.0, 0.0],
    ]
}

#[test]
fn test_risk_increment_zero_stress_entity() {
    let model = network(vec![1.0, 0.0, 3.0], path3_weights());
    let bundle = RiskEngine::default().evaluate(&model);
    let g = bundle.gradient.defined().expect("gradient defined");

    assert_eq!(bundle.risk_increment[1], Annotated::by_convention(0.0));
    assert_eq!(bundle.risk_increment[0], Annotated::computed(g[0]));
    assert_eq!(bundle.risk_increment[2], Annotated::computed(g[2]));
}

#[test]
fn test_disconnected_network() {
    let model = network(vec![3.0, 4.0], vec![vec![0.0; 2]; 2]);
    let bundle = RiskEngine::default().evaluate(&model);

    assert!(approx_eq(bundle.score.value, 5.0));
    assert!(approx_eq(bundle.normalized_score.value, 1.0));
    assert_eq!(bundle.fragility, Annotated::by_convention(0.0));
    assert_eq!(bundle.centrality, Annotated::by_convention(vec![0.0; 2]));
    assert_eq!(bundle.criticality.status, Definedness::ZeroByConvention);
    assert_eq!(
        bundle.eigenvector_centrality,
        Annotated::by_convention(vec![0.0; 2])
    );
    assert_eq!(bundle.degree_moment_ratio, Annotated::by_convention(0.0));
}

#[test]
fn test_single_entity() {
    let model = network(vec![2.5], vec![vec![0.0]]);
    let bundle = RiskEngine::default().evaluate(&model);
    assert!(approx_eq(bundle.score.value, 2.5));
    assert!(approx_eq(bundle.decomposition.value[0], 2.5));
    // Hessian of |C| in one dimension is zero
    assert!(bundle.cross_risk.value[0][0].abs() < EPSILON);
}

#[test]
fn test_adjacency_only_isolated_stress_is_undefined() {
    let engine = RiskEngine::with_strategy(RiskMatrixStrategy::AdjacencyOnly);
    // Entity 2 carries stress but no connections; entities 0-1 have none
    let model = network(
        vec![0.0, 0.0, 4.0],
        vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ],
    );
    let bundle = engine.evaluate(&model);

    assert_eq!(bundle.score, Annotated::computed(0.0));
    assert_eq!(bundle.normalized_score, Annotated::computed(0.0));
    assert!(!bundle.gradient.is_defined());
    assert_eq!(bundle.decomposition.status, Definedness::ZeroByConvention);
    assert_eq!(bundle.risk_increment[0].status, Definedness::ZeroByConvention);
    assert_eq!(bundle.risk_increment[2].status, Definedness::Undefined);
    assert!(bundle.risk_increment[2].value.is_nan());
}

#[test]
fn test_adjacency_only_drops_own_stress() {
    let engine = RiskEngine::with_strategy(RiskMatrixStrategy::AdjacencyOnly);
    // C'AC on the path: 2 * (1*2 + 2*3) = 16
    assert!(approx_eq(engine.score(&path3()).value, 4.0));
    assert_eq!(engine.strategy(), RiskMatrixStrategy::AdjacencyOnly);
}

#[test]
fn test_eigenvector_centrality_in_bundle() {
    let bundle = RiskEngine::default().evaluate(&path3());
    let v = bundle.eigenvector_centrality.defined().expect("converged");
    assert!((v[1] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    assert!((v[0] - v[2]).abs() < 1e-9);
}

#[test]
fn test_eigenvector_non_convergence_is_undefined() {
    let engine = RiskEngine::new(
        EngineConfig::default(),
        CentralityConfig {
            max_iterations: 1,
            tolerance: 1e-15,
        },
    );
    let bundle = engine.evaluate(&path3());
    assert!(!bundle.eigenvector_centrality.is_defined());
    // The rest of the bundle is unaffected
    assert!(bundle.score.is_defined());
}

#[test]
fn test_evaluate_is_deterministic() {
    let engine = RiskEngine::default();
    let model = weighted4();
    assert_eq!(engine.evaluate(&model), engine.evaluate(&model));
}

// =========================================================================
// EXTREME MAGNITUDES
// =========================================================================

fn scaled_path3(lambda: f64) -> NetworkModel {
    network(
        vec![lambda, 2.0 * lambda, 3.0 * lambda],
        vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 0.0],
        ],
    )
}

fn max_abs(rows: &[Vec<f64>]) -> f64 {
    rows.iter().flatten().fold(0.0, |m, v| m.max(v.abs()))
}

#[test]
fn test_cross_risk_scales_inversely_with_stress() {
    let engine = RiskEngine::default();
    let base = engine.evaluate(&path3());
    let base_sensitivity = &base.contribution_sensitivity.value;

    for lambda in [1e-110, 1e110] {
        let scaled = engine.evaluate(&scaled_path3(lambda));
        assert_eq!(scaled.cross_risk.status, Definedness::Computed);
        assert_eq!(scaled.contribution_sensitivity.status, Definedness::Computed);

        // Δ(λC) = Δ(C) / λ
        let tol = 1e-9 * max_abs(&base.cross_risk.value) / lambda;
        for (i, row) in scaled.cross_risk.value.iter().enumerate() {
            for (j, &h) in row.iter().enumerate() {
                let expected = base.cross_risk.value[i][j] / lambda;
                assert!(
                    (h - expected).abs() <= tol,
                    "lambda={lambda:e} ({i},{j}): {h:e} vs {expected:e}"
                );
            }
        }

        // ∂D/∂C is scale-free
        let tol = 1e-9 * max_abs(base_sensitivity);
        for (i, row) in scaled.contribution_sensitivity.value.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                assert!((v - base_sensitivity[i][j]).abs() <= tol);
            }
        }
    }
}

#[test]
fn test_score_survives_squared_overflow_and_underflow() {
    let engine = RiskEngine::default();
    let base = engine.evaluate(&path3());

    // C'EC itself is outside f64 range for both, S is not
    for lambda in [1e-200, 1e200] {
        let scaled = engine.evaluate(&scaled_path3(lambda));
        assert_eq!(scaled.score.status, Definedness::Computed);
        let expected = 30f64.sqrt() * lambda;
        assert!(((scaled.score.value - expected) / expected).abs() < 1e-12);
        assert!(approx_eq(scaled.normalized_score.value, base.normalized_score.value));
        for (g, g0) in scaled.gradient.value.iter().zip(&base.gradient.value) {
            assert!(approx_eq(*g, *g0));
        }
        let d: f64 = scaled.decomposition.value.iter().sum();
        assert!(((d - expected) / expected).abs() < 1e-12);
    }
}

#[test]
fn test_unrepresentable_cross_risk_is_undefined() {
    // S is subnormal, so 1/S overflows
    let bundle = RiskEngine::default().evaluate(&scaled_path3(1e-310));
    assert_eq!(bundle.score.status, Definedness::Computed);
    assert!(bundle.score.value > 0.0);
    assert_eq!(bundle.cross_risk.status, Definedness::Undefined);
    assert!(bundle.cross_risk.value.iter().flatten().all(|v| v.is_nan()));
    assert_eq!(
        bundle.contribution_sensitivity.status,
        Definedness::Undefined
    );
    assert!(bundle.gradient.is_defined());
}

// =========================================================================
// PROPERTY TESTS
// =========================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_network() -> impl Strategy<Value = NetworkModel> {
        (1usize..8)
            .prop_flat_map(|n| {
                (
                    prop::collection::vec(0.0f64..10.0, n),
                    prop::collection::vec(prop_oneof![Just(0.0), 0.0f64..5.0], n * n),
                )
            })
            .prop_map(|(stress, flat)| {
                let n = stress.len();
                let weights = (0..n).map(|i| flat[i * n..(i + 1) * n].to_vec()).collect();
                network(stress, weights)
            })
    }

    proptest! {
        /// Σ D_i = S
        #[test]
        fn prop_decomposition_sums_to_score(model in arb_network()) {
            let bundle = RiskEngine::default().evaluate(&model);
            let s = bundle.score.value;
            prop_assume!(s > 0.0);
            let sum: f64 = bundle.decomposition.value.iter().sum();
            prop_assert!((sum - s).abs() <= 1e-9 * s, "sum={} S={}", sum, s);
        }

        /// Δ_ij = Δ_ji
        #[test]
        fn prop_cross_risk_symmetric(model in arb_network()) {
            let bundle = RiskEngine::default().evaluate(&model);
            if let Some(delta) = bundle.cross_risk.defined() {
                let n = delta.len();
                for i in 0..n {
                    for j in 0..n {
                        let scale = delta[i][j].abs().max(1.0);
                        prop_assert!((delta[i][j] - delta[j][i]).abs() <= 1e-12 * scale);
                    }
                }
            }
        }

        /// R ∈ [1/n, 1] when K > 0
        #[test]
        fn prop_fragility_bounds(model in arb_network()) {
            let bundle = RiskEngine::default().evaluate(&model);
            let k: f64 = bundle.degrees.iter().sum();
            prop_assume!(k > 0.0);
            let n = model.len() as f64;
            let r = bundle.fragility.value;
            prop_assert!(r >= 1.0 / n - 1e-12, "R={} n={}", r, n);
            prop_assert!(r <= 1.0 + 1e-12, "R={}", r);
        }

        /// With E = I + Ā and non-negative inputs, S ≥ ||C||
        #[test]
        fn prop_network_never_reduces_risk(model in arb_network()) {
            let bundle = RiskEngine::default().evaluate(&model);
            prop_assert!(bundle.score.is_defined());
            let norm = model.stress().norm();
            prop_assert!(bundle.score.value >= norm * (1.0 - 1e-12));
            if norm > 0.0 {
                prop_assert!(bundle.normalized_score.value >= 1.0 - 1e-12);
            }
        }

        /// Centrality shares sum to one on connected inputs
        #[test]
        fn prop_centrality_is_a_distribution(model in arb_network()) {
            let bundle = RiskEngine::default().evaluate(&model);
            if bundle.centrality.status == Definedness::Computed {
                let total: f64 = bundle.centrality.value.iter().sum();
                prop_assert!((total - 1.0).abs() < 1e-12);
            }
        }
    }
}
