use pregel_flow::ppr::run_query;
use pregel_flow::{GraphFormat, QueryConfig};

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Multi-source personalized PageRank over a partitioned graph.
#[derive(Parser)]
#[command(name = "pregel-flow", about = "Multi-source personalized PageRank")]
struct Cli {
    /// Edge list, or a snapshot written with --bin-prefix.
    graph: PathBuf,

    /// Graph file format: snap or snapshot.
    #[arg(long, default_value = "snap")]
    format: GraphFormat,

    /// Number of propagation rounds.
    #[arg(long, default_value_t = 10)]
    niters: usize,

    /// Flow at or below this weight is dropped.
    #[arg(long, default_value_t = 1e-4)]
    threshold: f64,

    /// Probability of restarting at the source.
    #[arg(long, default_value_t = 0.15)]
    reset_prob: f64,

    /// Save the graph with its ppr index here.
    #[arg(long)]
    bin_prefix: Option<PathBuf>,

    /// Save the top-k ppr entries of each vertex here.
    #[arg(long)]
    saveprefix: Option<PathBuf>,

    /// Entries per vertex in the saved results.
    #[arg(long, default_value_t = 100)]
    topk: usize,

    /// File with the source count followed by source ids.
    #[arg(long)]
    sources_file: Option<PathBuf>,

    /// Read at most this many sources.
    #[arg(long, default_value_t = 1000)]
    num_sources: usize,

    /// Compute ppr vectors without a preprocessed index.
    #[arg(long)]
    no_index: bool,

    /// Worker threads (default: number of CPUs).
    #[arg(long)]
    nworkers: Option<usize>,
}

impl From<Cli> for QueryConfig {
    fn from(cli: Cli) -> Self {
        let mut config = QueryConfig::new(cli.graph);
        config.format = cli.format;
        config.niters = cli.niters;
        config.threshold = cli.threshold;
        config.reset_prob = cli.reset_prob;
        config.bin_prefix = cli.bin_prefix;
        config.saveprefix = cli.saveprefix;
        config.topk = cli.topk;
        config.sources_file = cli.sources_file;
        config.num_sources = cli.num_sources;
        config.no_index = cli.no_index;
        if let Some(nworkers) = cli.nworkers {
            config.nworkers = nworkers.max(1);
        }
        config
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = QueryConfig::from(Cli::parse());
    if let Err(err) = run_query(&config) {
        error!("{}", err);
        process::exit(1);
    }
}
