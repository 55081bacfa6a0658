// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! memsift - thematic clustering and semantic retrieval for memory facts.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod cluster;
mod import;
mod similar;

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use memsift_config::model::MemsiftConfig;
use memsift_core::MemsiftError;

/// memsift - thematic clustering and semantic retrieval for memory facts.
#[derive(Parser, Debug)]
#[command(name = "memsift", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Group stored memories into thematic clusters.
    Cluster {
        /// Smallest cluster kept after splitting an oversized group.
        #[arg(long)]
        min: Option<usize>,
        /// Largest cluster size.
        #[arg(long)]
        max: Option<usize>,
        /// Similarity a memory needs to join a group, 0.0 to 1.0.
        #[arg(long)]
        threshold: Option<f64>,
        /// Embed memories that have no embedding before clustering.
        #[arg(long)]
        backfill: bool,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Rank stored memories by similarity.
    #[command(group(ArgGroup::new("query").required(true).args(["like", "embedding"])))]
    Similar {
        /// Use the embedding of this stored memory as the query.
        #[arg(long, value_name = "MEMORY_ID")]
        like: Option<String>,
        /// Comma-separated query embedding.
        #[arg(long, value_name = "CSV", allow_hyphen_values = true)]
        embedding: Option<String>,
        /// Number of results.
        #[arg(short)]
        k: Option<usize>,
        /// Skip memories younger than this many days.
        #[arg(long)]
        min_age_days: Option<i64>,
        /// Only rank memories of this persona.
        #[arg(long)]
        persona: Option<String>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Load memories from a JSON Lines file.
    Import {
        /// One JSON object per line.
        file: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => memsift_config::load_and_validate_path(path),
        None => memsift_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            memsift_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    if let Some(command) = &cli.command {
        apply_overrides(&mut config, command);
        if let Err(errors) = memsift_config::validation::validate_config(&config) {
            memsift_config::render_errors(&errors);
            std::process::exit(1);
        }
    }

    init_tracing(&config.general.log_level);
    memsift_memory::recording::register_metrics();

    let outcome = match cli.command {
        Some(Commands::Cluster { backfill, json, .. }) => {
            cluster::run_cluster(&config, backfill, json).await
        }
        Some(Commands::Similar {
            like,
            embedding,
            persona,
            json,
            ..
        }) => match similar::Query::from_args(like, embedding) {
            Some(query) => similar::run_similar(&config, query, persona, json).await,
            None => Err(MemsiftError::Config(
                "one of --like or --embedding is required".to_string(),
            )),
        },
        Some(Commands::Import { file }) => import::run_import(&config, &file)
            .await
            .map(|report| println!("{}", report.summary())),
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("memsift: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("memsift: {e}");
        std::process::exit(1);
    }
}

/// Fold command-line flags into the loaded configuration so they are
/// validated like file settings.
fn apply_overrides(config: &mut MemsiftConfig, command: &Commands) {
    match command {
        Commands::Cluster {
            min,
            max,
            threshold,
            ..
        } => {
            if let Some(min) = min {
                config.clustering.min_cluster_size = *min;
            }
            if let Some(max) = max {
                config.clustering.max_cluster_size = *max;
            }
            if let Some(threshold) = threshold {
                config.clustering.similarity_threshold = *threshold;
            }
        }
        Commands::Similar {
            k, min_age_days, ..
        } => {
            if let Some(k) = k {
                config.retrieval.top_k = *k;
            }
            if let Some(days) = min_age_days {
                config.retrieval.min_age_days = *days;
            }
        }
        Commands::Import { .. } | Commands::Config => {}
    }
}

fn print_config(config: &MemsiftConfig) -> Result<(), MemsiftError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| MemsiftError::Internal(format!("failed to render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Initialize the tracing subscriber. Logs go to stderr so `--json` output
/// stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("memsift={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cluster_flags_override_config() {
        let cli = Cli::parse_from(["memsift", "cluster", "--min", "3", "--threshold", "0.4"]);
        let mut config = MemsiftConfig::default();
        apply_overrides(&mut config, cli.command.as_ref().unwrap());

        assert_eq!(config.clustering.min_cluster_size, 3);
        assert_eq!(config.clustering.max_cluster_size, 10);
        assert_eq!(config.clustering.similarity_threshold, 0.4);
    }

    #[test]
    fn out_of_range_override_fails_validation() {
        let cli = Cli::parse_from(["memsift", "cluster", "--min", "12"]);
        let mut config = MemsiftConfig::default();
        apply_overrides(&mut config, cli.command.as_ref().unwrap());
        assert!(memsift_config::validation::validate_config(&config).is_err());
    }

    #[test]
    fn similar_needs_a_query() {
        assert!(Cli::try_parse_from(["memsift", "similar"]).is_err());
        assert!(Cli::try_parse_from(["memsift", "similar", "--like", "a", "--embedding", "1,0"]).is_err());

        let cli = Cli::try_parse_from(["memsift", "similar", "--embedding", "-0.5,1", "-k", "3"]).unwrap();
        let mut config = MemsiftConfig::default();
        apply_overrides(&mut config, cli.command.as_ref().unwrap());
        assert_eq!(config.retrieval.top_k, 3);
    }

    #[test]
    fn config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&MemsiftConfig::default()).unwrap();
        assert!(rendered.contains("[clustering]"));
        assert!(rendered.contains("similarity_threshold = 0.6"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
