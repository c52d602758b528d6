//! Configuration module for netrisk
//!
//! This module handles:
//! - Project-level configuration (netrisk.toml / .netriskrc.json)
//! - Risk-matrix strategy and numerical tolerances
//! - Eigenvector centrality iteration limits
//! - CLI defaults

mod netrisk_config;

pub use netrisk_config::{
    load_config, load_config_file, CentralityConfig, CliDefaults, EngineConfig, NetriskConfig,
    RiskMatrixStrategy, CONFIG_TEMPLATE,
};
