//! Project-level configuration support
//!
//! Loads configuration from `netrisk.toml` or `.netriskrc.json` in the
//! working directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # netrisk.toml
//!
//! [engine]
//! risk_matrix = "identity-plus-adjacency"   # or "adjacency-only"
//! identity_tolerance = 1e-9
//!
//! [centrality]
//! max_iterations = 1000
//! tolerance = 1e-6
//!
//! [defaults]
//! format = "text"
//! top = 10
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Template written by `netrisk init`
pub const CONFIG_TEMPLATE: &str = r#"# netrisk configuration

[engine]
# How the risk matrix E is built from the (symmetrized) adjacency A:
#   "identity-plus-adjacency"  E = I + A   (own stress plus network exposure)
#   "adjacency-only"           E = A       (network exposure only)
risk_matrix = "identity-plus-adjacency"

# Relative tolerance for the sum(D) == S decomposition check
identity_tolerance = 1e-9

[centrality]
# Power iteration limits for eigenvector centrality
max_iterations = 1000
tolerance = 1e-6

[defaults]
# Default output format (text, json, markdown)
format = "text"

# Entities listed in the text report (0 = all)
top = 10
"#;

/// Construction of the risk matrix E from the symmetrized adjacency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RiskMatrixStrategy {
    /// E = I + A: each entity's own stress plus network-mediated exposure
    #[default]
    IdentityPlusAdjacency,
    /// E = A: network-mediated exposure only
    AdjacencyOnly,
}

impl std::fmt::Display for RiskMatrixStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskMatrixStrategy::IdentityPlusAdjacency => write!(f, "identity-plus-adjacency"),
            RiskMatrixStrategy::AdjacencyOnly => write!(f, "adjacency-only"),
        }
    }
}

/// Configuration loaded from netrisk.toml or .netriskrc.json
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct NetriskConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub centrality: CentralityConfig,

    #[serde(default)]
    pub defaults: CliDefaults,
}

/// Risk engine settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineConfig {
    /// Risk matrix construction (default: identity-plus-adjacency)
    #[serde(default)]
    pub risk_matrix: RiskMatrixStrategy,

    /// Relative tolerance for the decomposition identity (default: 1e-9)
    #[serde(default = "default_identity_tolerance")]
    pub identity_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_matrix: RiskMatrixStrategy::default(),
            identity_tolerance: default_identity_tolerance(),
        }
    }
}

fn default_identity_tolerance() -> f64 {
    1e-9
}

/// Power iteration settings for eigenvector centrality
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CentralityConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_centrality_tolerance")]
    pub tolerance: f64,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_centrality_tolerance(),
        }
    }
}

fn default_max_iterations() -> usize {
    1000
}
fn default_centrality_tolerance() -> f64 {
    1e-6
}

/// Default CLI flags that can be set in the config file
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct CliDefaults {
    /// Default output format (text, json, markdown)
    #[serde(default)]
    pub format: Option<String>,

    /// Entities listed in the text report (0 = all)
    #[serde(default)]
    pub top: Option<usize>,
}

impl NetriskConfig {
    /// Clamp settings that would make the engine misbehave back to defaults
    pub fn sanitized(mut self) -> Self {
        if !(self.engine.identity_tolerance.is_finite() && self.engine.identity_tolerance > 0.0) {
            warn!(
                "identity_tolerance {} is not positive, using {}",
                self.engine.identity_tolerance,
                default_identity_tolerance()
            );
            self.engine.identity_tolerance = default_identity_tolerance();
        }
        if !(self.centrality.tolerance.is_finite() && self.centrality.tolerance > 0.0) {
            warn!(
                "centrality tolerance {} is not positive, using {}",
                self.centrality.tolerance,
                default_centrality_tolerance()
            );
            self.centrality.tolerance = default_centrality_tolerance();
        }
        if self.centrality.max_iterations == 0 {
            warn!("centrality max_iterations is 0, using {}", default_max_iterations());
            self.centrality.max_iterations = default_max_iterations();
        }
        self
    }
}

/// Load configuration from a directory.
///
/// Searches for configuration files in this order:
/// 1. `netrisk.toml`
/// 2. `.netriskrc.json`
///
/// Returns default configuration if no usable config file is found.
pub fn load_config(dir: &Path) -> NetriskConfig {
    let toml_path = dir.join("netrisk.toml");
    if toml_path.exists() {
        match load_config_file(&toml_path) {
            Ok(config) => {
                debug!("Loaded config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", toml_path.display(), e);
            }
        }
    }

    let json_path = dir.join(".netriskrc.json");
    if json_path.exists() {
        match load_config_file(&json_path) {
            Ok(config) => {
                debug!("Loaded config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", json_path.display(), e);
            }
        }
    }

    debug!("No config found, using defaults");
    NetriskConfig::default()
}

/// Load configuration from an explicit file; the extension picks the format
pub fn load_config_file(path: &Path) -> anyhow::Result<NetriskConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: NetriskConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };
    Ok(config.sanitized())
}
