//! Network-Aware Systemic Risk Scoring
//!
//! This module turns a [`NetworkModel`](crate::network::NetworkModel) into a
//! [`MetricsBundle`](crate::models::MetricsBundle) using exact derivatives of
//! a matrix quadratic form.
//!
//! # Scoring Formula
//!
//! ```text
//! Ā  = (A + Aᵀ) / 2              symmetrized adjacency
//! E  = I + Ā                     risk matrix (or E = Ā, see RiskMatrixStrategy)
//! S  = sqrt(Cᵀ E C)              systemic risk score
//! S̄  = S / sqrt(Cᵀ C)            normalized score (0 when C = 0)
//! g  = E C / S                   gradient dS/dC
//! D  = C ∘ g                     decomposition, Σ D_i = S
//! Δ  = E/S − (EC)(EC)ᵀ/S³        Hessian (cross-risk / spillover)
//! ```
//!
//! # Network Concentration
//!
//! ```text
//! k_i = Σ_j Ā_ij,  K = Σ k_i
//! centrality_i  = k_i / K
//! criticality_i = centrality_i × C_i
//! fragility R   = Σ (k_i / K)²       ∈ [1/n, 1]
//! ```
//!
//! Symmetrizing A leaves S, g and D unchanged (Cᵀ A C = Cᵀ Ā C) and is what
//! makes Δ symmetric.
//!
//! # Undefined Values
//!
//! Divisions by zero never raise. Ratios with nothing to share (K = 0,
//! C = 0) are zero by convention; the score/gradient/Hessian family is
//! reported as NaN with [`Definedness::Undefined`](crate::models::Definedness).
//!
//! # Example
//!
//! Path graph 0 — 1 — 2 with stress [1, 2, 3]:
//! EC = [3, 6, 5], S² = 30, D = [3, 12, 15] / √30,
//! centrality = [¼, ½, ¼], R = 0.375.

mod centrality;
mod risk_engine;
mod risk_matrix;

pub use centrality::{eigenvector_centrality, DegreeProfile};
pub use risk_engine::RiskEngine;
pub use risk_matrix::{risk_matrix, symmetrized};
