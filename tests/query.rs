//! The full query pipeline: load, decompose, collect, write.

use std::fs;

use pregel_flow::ppr::{run_query, VertexData};
use pregel_flow::{Graph, GraphFormat, PregelError, QueryConfig, SerializationPhase};
use tempfile::TempDir;

const EDGES: &str = "# toy graph\n0\t1\n1\t2\n2\t0\n2\t3\n3\t0\n";

fn setup(dir: &TempDir, sources: &str) -> QueryConfig {
    let graph = dir.path().join("graph.txt");
    fs::write(&graph, EDGES).unwrap();
    let sources_file = dir.path().join("sources.txt");
    fs::write(&sources_file, sources).unwrap();

    let mut config = QueryConfig::new(graph);
    config.sources_file = Some(sources_file);
    config.saveprefix = Some(dir.path().join("results.txt"));
    config.nworkers = 2;
    config
}

#[test]
fn single_source_ranks_itself_first() {
    let dir = TempDir::new().unwrap();
    let mut config = setup(&dir, "1\n0\n");
    config.no_index = true;

    let summary = run_query(&config).unwrap();
    assert_eq!(summary.num_vertices, 4);
    assert_eq!(summary.num_edges, 5);
    assert_eq!(summary.num_sources, Some(1));
    assert_eq!(summary.decomposition.rounds, config.niters + 1);
    assert_eq!(summary.collection.rounds, 1);

    let results = fs::read_to_string(dir.path().join("results.txt")).unwrap();
    let lines: Vec<_> = results.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("0 4 0 "), "got {:?}", lines[0]);
}

#[test]
fn topk_limits_each_line() {
    let dir = TempDir::new().unwrap();
    let mut config = setup(&dir, "2 0 3");
    config.topk = 2;

    run_query(&config).unwrap();

    let results = fs::read_to_string(dir.path().join("results.txt")).unwrap();
    let mut ids = Vec::new();
    for line in results.lines() {
        let fields: Vec<u32> = line.split(' ').map(|f| f.parse().unwrap()).collect();
        assert_eq!(fields[1], 2);
        assert_eq!(fields.len(), 4);
        ids.push(fields[0]);
    }
    assert_eq!(ids, vec![0, 3]);
}

#[test]
fn index_snapshot_reloads_for_the_next_query() {
    let dir = TempDir::new().unwrap();
    let index = dir.path().join("index.jsonl");
    let mut config = setup(&dir, "1 0");
    config.bin_prefix = Some(index.clone());

    run_query(&config).unwrap();

    let graph: Graph<VertexData> = Graph::load_snapshot(&index, SerializationPhase::Index).unwrap();
    assert_eq!(graph.num_vertices(), 4);
    assert_eq!(graph.num_edges(), 5);
    assert!((graph.data(0).ppr.sum() - 1.0).abs() < 1e-9);
    assert!(graph.data(1).ppr.is_empty());
    assert!(graph.data(0).residual.is_empty());

    let mut next = QueryConfig::new(index);
    next.format = GraphFormat::Snapshot;
    next.saveprefix = Some(dir.path().join("second.txt"));
    next.nworkers = 3;
    let summary = run_query(&next).unwrap();
    assert_eq!(summary.num_sources, None);

    let results = fs::read_to_string(dir.path().join("second.txt")).unwrap();
    assert_eq!(results.lines().count(), 4);
}

#[test]
fn missing_graph_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let config = QueryConfig::new(dir.path().join("absent.txt"));
    assert!(matches!(run_query(&config), Err(PregelError::Io { .. })));
}

#[test]
fn malformed_edge_is_reported_with_its_line() {
    let dir = TempDir::new().unwrap();
    let graph = dir.path().join("bad.txt");
    fs::write(&graph, "0 1\n1 two\n").unwrap();

    match run_query(&QueryConfig::new(graph)) {
        Err(PregelError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("unexpected result: {:?}", other.map(|s| s.num_vertices)),
    }
}
