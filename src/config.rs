use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Options of one engine run.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Upper bound on the number of rounds.
    pub max_rounds: usize,
    /// Number of worker threads, each owning a contiguous vertex range.
    pub nworkers: usize,
    /// Serialize every program between apply and scatter instead of keeping
    /// it resident.
    pub persist_programs: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            max_rounds: usize::MAX,
            nworkers: num_cpus::get(),
            persist_programs: false,
        }
    }
}

impl EngineOptions {
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_nworkers(mut self, nworkers: usize) -> Self {
        self.nworkers = nworkers.max(1);
        self
    }

    pub fn with_persist_programs(mut self, persist_programs: bool) -> Self {
        self.persist_programs = persist_programs;
        self
    }
}

/// On-disk layout of the input graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphFormat {
    /// Plain `source target` edge list.
    #[default]
    Snap,
    /// Snapshot written by a previous query with an index.
    Snapshot,
}

impl FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "snap" | "tsv" => Ok(GraphFormat::Snap),
            "snapshot" | "bin" => Ok(GraphFormat::Snapshot),
            other => Err(format!("unknown graph format: {}", other)),
        }
    }
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphFormat::Snap => write!(f, "snap"),
            GraphFormat::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Settings of a multi-source personalized PageRank query.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub graph: PathBuf,
    pub format: GraphFormat,
    /// Propagation rounds. The decomposition runs one extra round to
    /// finalize leftover flow.
    pub niters: usize,
    /// Flow at or below this weight is pruned.
    pub threshold: f64,
    pub reset_prob: f64,
    /// Where to save the graph with its index.
    pub bin_prefix: Option<PathBuf>,
    /// Where to save the top-k lists.
    pub saveprefix: Option<PathBuf>,
    pub topk: usize,
    pub sources_file: Option<PathBuf>,
    /// Cap on the number of sources read from `sources_file`.
    pub num_sources: usize,
    /// Compute from scratch, ignoring any precomputed ppr vectors.
    pub no_index: bool,
    pub nworkers: usize,
}

impl QueryConfig {
    pub fn new(graph: PathBuf) -> Self {
        QueryConfig {
            graph,
            format: GraphFormat::Snap,
            niters: 10,
            threshold: 1e-4,
            reset_prob: 0.15,
            bin_prefix: None,
            saveprefix: None,
            topk: 100,
            sources_file: None,
            num_sources: 1000,
            no_index: false,
            nworkers: num_cpus::get(),
        }
    }
}
