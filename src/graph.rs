use crate::error::{PregelError, Result};

use std::fs::File;
use std::io::{self, BufRead};
use std::ops::Range;
use std::path::Path;
use tracing::warn;

pub type VertexId = u32;

/// Immutable adjacency of a finalized graph, stored as forward and reverse
/// compressed rows.
#[derive(Debug, Default, Clone)]
pub struct Topology {
    num_vertices: usize,
    out_offsets: Vec<usize>,
    out_targets: Vec<VertexId>,
    in_offsets: Vec<usize>,
    in_sources: Vec<VertexId>,
}

impl Topology {
    fn build(num_vertices: usize, edges: &[(VertexId, VertexId)]) -> Self {
        let (out_offsets, out_targets) = compress(num_vertices, edges.iter().copied());
        let (in_offsets, in_sources) =
            compress(num_vertices, edges.iter().map(|&(source, target)| (target, source)));

        Topology {
            num_vertices,
            out_offsets,
            out_targets,
            in_offsets,
            in_sources,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_edges(&self) -> usize {
        self.out_targets.len()
    }

    pub fn out_neighbors(&self, vid: VertexId) -> &[VertexId] {
        let v = vid as usize;
        &self.out_targets[self.out_offsets[v]..self.out_offsets[v + 1]]
    }

    pub fn in_neighbors(&self, vid: VertexId) -> &[VertexId] {
        let v = vid as usize;
        &self.in_sources[self.in_offsets[v]..self.in_offsets[v + 1]]
    }

    pub fn num_out_edges(&self, vid: VertexId) -> usize {
        self.out_neighbors(vid).len()
    }

    pub fn num_in_edges(&self, vid: VertexId) -> usize {
        self.in_neighbors(vid).len()
    }
}

fn compress(
    num_vertices: usize,
    edges: impl Iterator<Item = (VertexId, VertexId)> + Clone,
) -> (Vec<usize>, Vec<VertexId>) {
    let mut offsets = vec![0_usize; num_vertices + 1];
    for (from, _) in edges.clone() {
        offsets[from as usize + 1] += 1;
    }
    for v in 0..num_vertices {
        offsets[v + 1] += offsets[v];
    }

    let mut cursor = offsets.clone();
    let mut neighbors = vec![0; offsets[num_vertices]];
    for (from, to) in edges {
        neighbors[cursor[from as usize]] = to;
        cursor[from as usize] += 1;
    }

    (offsets, neighbors)
}

/// Directed graph with a dense vertex id space `0..num_vertices` and one
/// value of type `V` per vertex.
///
/// Edges may be added until [`Graph::finalize`] is called. Adding an edge
/// afterwards un-finalizes the graph, and the engine refuses to run until it
/// is finalized again.
pub struct Graph<V> {
    edges: Vec<(VertexId, VertexId)>,
    topology: Topology,
    data: Vec<V>,
    finalized: bool,
}

impl<V> Default for Graph<V>
where
    V: Default,
{
    fn default() -> Self {
        Graph::new()
    }
}

impl<V> Graph<V>
where
    V: Default,
{
    pub fn new() -> Self {
        Graph {
            edges: Vec::new(),
            topology: Topology::default(),
            data: Vec::new(),
            finalized: false,
        }
    }

    /// Makes sure `vid` exists, growing the id space if needed.
    pub fn add_vertex(&mut self, vid: VertexId) {
        let needed = vid as usize + 1;
        if self.data.len() < needed {
            self.data.resize_with(needed, V::default);
            self.finalized = false;
        }
    }

    pub fn add_edge(&mut self, source: VertexId, target: VertexId) {
        self.add_vertex(source.max(target));
        self.edges.push((source, target));
        self.finalized = false;
    }

    /// Builds the adjacency. Duplicate edges are dropped.
    pub fn finalize(&mut self) {
        self.edges.sort_unstable();
        let before = self.edges.len();
        self.edges.dedup();
        if self.edges.len() < before {
            warn!(
                duplicates = before - self.edges.len(),
                "dropped duplicate edges"
            );
        }

        self.topology = Topology::build(self.data.len(), &self.edges);
        self.finalized = true;
    }

    /// Loads a SNAP style edge list: one `source target` pair per line,
    /// whitespace separated, `#` and `%` lines are comments.
    pub fn load_edge_list(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| PregelError::io(path, err))?;

        let mut graph = Graph::new();
        for (index, line) in io::BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| PregelError::io(path, err))?;
            match parse_edge(&line) {
                Ok(Some((source, target))) => graph.add_edge(source, target),
                Ok(None) => (),
                Err(reason) => {
                    return Err(PregelError::Parse {
                        path: path.to_path_buf(),
                        line: index + 1,
                        reason,
                    })
                }
            }
        }

        Ok(graph)
    }
}

impl<V> Graph<V> {
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn num_vertices(&self) -> usize {
        self.data.len()
    }

    pub fn num_edges(&self) -> usize {
        if self.finalized {
            self.topology.num_edges()
        } else {
            self.edges.len()
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn data(&self, vid: VertexId) -> &V {
        &self.data[vid as usize]
    }

    pub fn data_mut(&mut self, vid: VertexId) -> &mut V {
        &mut self.data[vid as usize]
    }

    pub fn vertex_data(&self) -> &[V] {
        &self.data
    }

    /// Shared adjacency next to exclusive vertex values, so workers can
    /// mutate disjoint value ranges while reading the topology.
    pub fn split_mut(&mut self) -> (&Topology, &mut [V]) {
        (&self.topology, &mut self.data)
    }

    pub(crate) fn from_parts(data: Vec<V>, edges: Vec<(VertexId, VertexId)>) -> Self {
        Graph {
            edges,
            topology: Topology::default(),
            data,
            finalized: false,
        }
    }
}

fn parse_edge(line: &str) -> std::result::Result<Option<(VertexId, VertexId)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(source), Some(target)) => match (source.parse(), target.parse()) {
            (Ok(s), Ok(t)) => Ok(Some((s, t))),
            _ => Err(format!("invalid vertex id in {:?}", line)),
        },
        _ => Err(format!("expected two vertex ids, got {:?}", line)),
    }
}

/// Splits `0..num_vertices` into at most `nworkers` contiguous ranges of
/// equal length (the last one may be shorter).
pub fn partition(num_vertices: usize, nworkers: usize) -> Vec<Range<usize>> {
    let chunk = chunk_size(num_vertices, nworkers);
    (0..num_vertices)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(num_vertices))
        .collect()
}

pub(crate) fn chunk_size(num_vertices: usize, nworkers: usize) -> usize {
    let nworkers = nworkers.max(1);
    ((num_vertices + nworkers - 1) / nworkers).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Graph<()> {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(1, 3);
        graph.add_edge(2, 3);
        graph.add_edge(0, 1);
        graph.finalize();
        graph
    }

    #[test]
    fn finalize_builds_both_directions() {
        let graph = diamond();
        let topology = graph.topology();

        assert_eq!(graph.num_vertices(), 4);
        assert_eq!(graph.num_edges(), 4);
        assert_eq!(topology.out_neighbors(0), &[1, 2]);
        assert_eq!(topology.in_neighbors(3), &[1, 2]);
        assert_eq!(topology.num_out_edges(3), 0);
        assert_eq!(topology.num_in_edges(0), 0);
    }

    #[test]
    fn adding_after_finalize_requires_refinalize() {
        let mut graph = diamond();
        graph.add_edge(3, 0);
        assert!(!graph.is_finalized());
        graph.finalize();
        assert_eq!(graph.topology().out_neighbors(3), &[0]);
    }

    #[test]
    fn isolated_vertices_are_kept() {
        let mut graph: Graph<()> = Graph::new();
        graph.add_vertex(5);
        graph.add_edge(0, 1);
        graph.finalize();
        assert_eq!(graph.num_vertices(), 6);
        assert!(graph.topology().out_neighbors(5).is_empty());
    }

    #[test]
    fn parse_edge_skips_comments() {
        assert_eq!(parse_edge("# FromNodeId\tToNodeId"), Ok(None));
        assert_eq!(parse_edge("   "), Ok(None));
        assert_eq!(parse_edge("3\t7"), Ok(Some((3, 7))));
        assert_eq!(parse_edge("3 7 1.0"), Ok(Some((3, 7))));
        assert!(parse_edge("3").is_err());
        assert!(parse_edge("a b").is_err());
    }

    #[test]
    fn partition_covers_all_vertices() {
        assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
        assert_eq!(partition(2, 8), vec![0..1, 1..2]);
        assert!(partition(0, 4).is_empty());
    }
}
