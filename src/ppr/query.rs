use super::{
    collect_results, read_sources, save_results, CollectSettings, CollectionProgram,
    DecompositionProgram, FlowSettings, VertexData,
};
use crate::error::Result;
use crate::{
    EngineOptions, Graph, GraphFormat, Master, QueryConfig, RunSummary, SerializationPhase,
    VertexId,
};

use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct QuerySummary {
    pub num_vertices: usize,
    pub num_edges: usize,
    pub num_sources: Option<usize>,
    pub decomposition: RunSummary,
    pub collection: RunSummary,
    pub elapsed: Duration,
}

/// Loads and finalizes the query graph. A snapshot is read in the index
/// phase, so every vertex starts with its precomputed ppr vector.
pub fn load_graph(config: &QueryConfig) -> Result<Graph<VertexData>> {
    let now = Instant::now();
    info!(path = %config.graph.display(), format = %config.format, "loading graph");

    let mut graph = match config.format {
        GraphFormat::Snap => Graph::load_edge_list(&config.graph)?,
        GraphFormat::Snapshot => Graph::load_snapshot(&config.graph, SerializationPhase::Index)?,
    };
    if !graph.is_finalized() {
        graph.finalize();
    }

    info!(
        num_vertices = graph.num_vertices(),
        num_edges = graph.num_edges(),
        elapsed_ms = now.elapsed().as_millis() as u64,
        "graph loaded"
    );
    Ok(graph)
}

/// Runs the decomposition followed by the collection pass on `graph`.
pub fn compute(
    graph: &mut Graph<VertexData>,
    config: &QueryConfig,
    sources: Option<HashSet<VertexId>>,
) -> Result<(RunSummary, RunSummary)> {
    let mut settings = FlowSettings::new(config.threshold).with_reset_prob(config.reset_prob);
    if let Some(sources) = sources {
        settings = settings.with_sources(sources);
    }

    // One extra round folds whatever flow is still moving into the vertices.
    let options = EngineOptions::default()
        .with_nworkers(config.nworkers)
        .with_max_rounds(config.niters + 1);
    let mut decomposition =
        Master::for_graph(DecompositionProgram::new(settings), graph, options.clone());
    decomposition.signal_all();
    let decomposed = decomposition.start(graph)?;
    info!(elapsed_ms = decomposed.elapsed.as_millis() as u64, "decomposition done");

    let collect = CollectSettings {
        threshold: config.threshold,
        no_index: config.no_index,
    };
    let mut collection =
        Master::for_graph(CollectionProgram::default(), graph, options.with_max_rounds(1));
    collection.transform_vertices(graph, |context, vertex| {
        collect_results(context, vertex, &collect)
    })?;
    let collected = collection.start(graph)?;
    info!(elapsed_ms = collected.elapsed.as_millis() as u64, "collection done");

    Ok((decomposed, collected))
}

/// Loads the graph, answers the query and writes the requested outputs.
pub fn run_query(config: &QueryConfig) -> Result<QuerySummary> {
    let now = Instant::now();
    let mut graph = load_graph(config)?;

    let sources = match &config.sources_file {
        Some(path) => {
            let sources = read_sources(path, config.num_sources)?;
            let outside = sources
                .iter()
                .filter(|&&vid| vid as usize >= graph.num_vertices())
                .count();
            if outside > 0 {
                warn!(outside, "some sources are not in the graph");
            }
            Some(sources)
        }
        None => None,
    };
    let num_sources = sources.as_ref().map(HashSet::len);

    let (decomposition, collection) = compute(&mut graph, config, sources)?;

    if let Some(prefix) = &config.bin_prefix {
        graph.save_snapshot(prefix, SerializationPhase::Index)?;
    }
    if let Some(prefix) = &config.saveprefix {
        save_results(&graph, prefix, config.topk)?;
    }

    let summary = QuerySummary {
        num_vertices: graph.num_vertices(),
        num_edges: graph.num_edges(),
        num_sources,
        decomposition,
        collection,
        elapsed: now.elapsed(),
    };
    info!(elapsed_ms = summary.elapsed.as_millis() as u64, "query finished");
    Ok(summary)
}
