//! CLI command definitions and handlers

mod compare;
mod evaluate;
mod init;
mod scenario;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use netrisk::config::{load_config, load_config_file, NetriskConfig};
use netrisk::input::EdgeSpec;
use netrisk::reporters::OutputFormat;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Entities listed by the text report when neither flag nor config says
const DEFAULT_TOP: usize = 10;

/// Parse `ENTITY=VALUE`
fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (entity, value) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("'{}' is not ENTITY=VALUE", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", value))?;
    if entity.trim().is_empty() {
        return Err(format!("'{}' has no entity", s));
    }
    Ok((entity.trim().to_string(), value))
}

/// Parse `FROM:TO=WEIGHT`
fn parse_edge(s: &str) -> Result<EdgeSpec, String> {
    let (pair, weight) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("'{}' is not FROM:TO=WEIGHT", s))?;
    let (from, to) = pair
        .split_once(':')
        .ok_or_else(|| format!("'{}' is not FROM:TO=WEIGHT", s))?;
    let weight: f64 = weight
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", weight))?;
    if from.trim().is_empty() || to.trim().is_empty() {
        return Err(format!("'{}' has an empty endpoint", s));
    }
    Ok(EdgeSpec {
        from: from.trim().to_string(),
        to: to.trim().to_string(),
        weight,
    })
}

/// netrisk - systemic-risk scoring for weighted networks
#[derive(Parser, Debug)]
#[command(name = "netrisk")]
#[command(
    version,
    about = "Network-aware systemic-risk scoring: exact decomposition, spillovers and what-if scenarios",
    long_about = "netrisk scores a network of entities by S = sqrt(C'EC), where C is the \
stress vector and E = I + A the network-aware risk matrix. It decomposes S \
exactly into per-entity contributions, reports the spillover (Hessian) matrix \
and degree concentration, and re-evaluates structural scenarios.",
    after_help = "\
Examples:
  netrisk evaluate banks.toml                       Score a network
  netrisk evaluate banks.toml --format json         JSON output for scripting
  netrisk what-if banks.toml --set a=4.5            Override one stress value
  netrisk remove banks.toml --entity b              Drop an entity
  netrisk modify banks.toml --edge a:c=2            Change one directed weight
  netrisk compare scenarios.toml                    Compare a scenario batch"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: netrisk.toml or .netriskrc.json in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output flags shared by every reporting command
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format: text, json, markdown (or md) [default: from config, else text]
    #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
    pub format: Option<String>,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a commented netrisk.toml template
    Init {
        /// Directory to write into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing netrisk.toml
        #[arg(long)]
        force: bool,
    },

    /// Evaluate a network file and report every metric
    #[command(after_help = "\
Examples:
  netrisk evaluate banks.toml                  Text report, top contributors
  netrisk evaluate banks.json --top 0          List every entity
  netrisk evaluate banks.toml -f md -o r.md    Markdown report to a file")]
    Evaluate {
        /// Network file (.toml or .json)
        network: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Entities listed in the report (0 = all)
        #[arg(long)]
        top: Option<usize>,
    },

    /// Override stress values and report the change
    #[command(after_help = "\
Examples:
  netrisk what-if banks.toml --set a=4.5
  netrisk what-if banks.toml --set a=0 --set 2=1.5   Entities by id or index")]
    WhatIf {
        /// Network file (.toml or .json)
        network: PathBuf,

        /// Stress override ENTITY=VALUE (repeatable)
        #[arg(long = "set", value_name = "ENTITY=VALUE", required = true, value_parser = parse_assignment)]
        overrides: Vec<(String, f64)>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Remove entities and report the change
    Remove {
        /// Network file (.toml or .json)
        network: PathBuf,

        /// Entity id or index to remove (repeatable)
        #[arg(long = "entity", value_name = "ENTITY", required = true)]
        entities: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Edit directed weights and report the change
    #[command(after_help = "\
Examples:
  netrisk modify banks.toml --edge a:c=2
  netrisk modify banks.toml --edge a:c=2 --edge c:a=2   Symmetric edit")]
    Modify {
        /// Network file (.toml or .json)
        network: PathBuf,

        /// Weight edit FROM:TO=WEIGHT (repeatable, last write wins)
        #[arg(long = "edge", value_name = "FROM:TO=WEIGHT", required = true, value_parser = parse_edge)]
        edges: Vec<EdgeSpec>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Evaluate a scenario file and compare its scenarios side by side
    Compare {
        /// Scenario file naming a baseline network and 2-4 scenarios
        scenarios: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show version information
    Version,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { path, force } = &cli.command {
        return init::run(path, *force);
    }
    if let Commands::Version = cli.command {
        println!("netrisk {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = resolve_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Evaluate {
            network,
            output,
            top,
        } => {
            let top = top.or(config.defaults.top).unwrap_or(DEFAULT_TOP);
            let format = resolve_format(&output, &config)?;
            let rendered = evaluate::run(&network, &config, format, top)?;
            emit(&rendered, output.output.as_deref())
        }
        Commands::WhatIf {
            network,
            overrides,
            output,
        } => {
            let format = resolve_format(&output, &config)?;
            let rendered = scenario::what_if(&network, &overrides, &config, format)?;
            emit(&rendered, output.output.as_deref())
        }
        Commands::Remove {
            network,
            entities,
            output,
        } => {
            let format = resolve_format(&output, &config)?;
            let rendered = scenario::remove(&network, &entities, &config, format)?;
            emit(&rendered, output.output.as_deref())
        }
        Commands::Modify {
            network,
            edges,
            output,
        } => {
            let format = resolve_format(&output, &config)?;
            let rendered = scenario::modify(&network, &edges, &config, format)?;
            emit(&rendered, output.output.as_deref())
        }
        Commands::Compare { scenarios, output } => {
            let format = resolve_format(&output, &config)?;
            let rendered = compare::run(&scenarios, &config, format)?;
            emit(&rendered, output.output.as_deref())
        }
        Commands::Init { .. } | Commands::Version => Ok(()),
    }
}

/// An explicit `--config` must load; auto-discovery falls back to defaults
fn resolve_config(explicit: Option<&Path>) -> Result<NetriskConfig> {
    match explicit {
        Some(path) => load_config_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Ok(load_config(&cwd))
        }
    }
}

/// `--format`, then `[defaults] format`, then text
fn resolve_format(args: &OutputArgs, config: &NetriskConfig) -> Result<OutputFormat> {
    let name = args
        .format
        .as_deref()
        .or(config.defaults.format.as_deref())
        .unwrap_or("text");
    OutputFormat::from_str(name)
}

/// Print to stdout or write to `output`
fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
