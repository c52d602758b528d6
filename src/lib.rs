//! netrisk - network-aware systemic-risk scoring
//!
//! Scores a network of entities by S = sqrt(C'EC), where C is the per-entity
//! stress vector and E = I + A is built from the weighted adjacency. On top
//! of the score the crate provides an exact per-entity decomposition, the
//! Hessian spillover matrix, degree concentration measures and structural
//! what-if scenarios (stress overrides, entity removal, weight edits).
//!
//! ```no_run
//! use netrisk::{Entity, NetworkModel, RiskEngine};
//!
//! let model = NetworkModel::new(
//!     vec![Entity::new("a", "Alpha"), Entity::new("b", "Beta")],
//!     vec![1.0, 2.0],
//!     vec![vec![0.0, 1.0], vec![1.0, 0.0]],
//! )?;
//! let metrics = RiskEngine::default().evaluate(&model);
//! println!("S = {}", metrics.score.value);
//! # Ok::<(), netrisk::RiskError>(())
//! ```

pub mod config;
pub mod errors;
pub mod input;
pub mod models;
pub mod network;
pub mod reporters;
pub mod scenario;
pub mod scoring;

pub use errors::{RiskError, RiskResult};
pub use models::{Annotated, Definedness, Entity, MetricsBundle};
pub use network::NetworkModel;
pub use scenario::{ScenarioEngine, ScenarioStore};
pub use scoring::RiskEngine;
