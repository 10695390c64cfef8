//! Graph snapshots.
//!
//! A snapshot is a JSON-lines file: a header line with the vertex and edge
//! counts, then one record per vertex holding its out-neighbors and its
//! serialized data. What the data record contains is chosen by the caller
//! through [`SerializationPhase`], so the same vertex type can be written
//! compactly as an index or in full.

use crate::error::{PregelError, Result};
use crate::graph::{Graph, VertexId};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Shape of persisted vertex data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationPhase {
    /// Compact, lossy form kept between queries.
    Index,
    /// Everything, for checkpoints within a query.
    Full,
}

/// Vertex data that can be written to and read from a snapshot.
pub trait Persist: Sized {
    fn save(&self, phase: SerializationPhase) -> Result<serde_json::Value>;
    fn load(phase: SerializationPhase, value: serde_json::Value) -> Result<Self>;
}

#[derive(Serialize, Deserialize)]
struct Header {
    num_vertices: usize,
    num_edges: usize,
}

#[derive(Serialize, Deserialize)]
struct VertexRecord {
    id: VertexId,
    out: Vec<VertexId>,
    data: serde_json::Value,
}

impl<V> Graph<V>
where
    V: Persist + Default,
{
    pub fn save_snapshot(&self, path: &Path, phase: SerializationPhase) -> Result<()> {
        if !self.is_finalized() {
            return Err(PregelError::NotFinalized);
        }

        let file = File::create(path).map_err(|err| PregelError::io(path, err))?;
        let mut writer = BufWriter::new(file);

        let header = Header {
            num_vertices: self.num_vertices(),
            num_edges: self.num_edges(),
        };
        write_line(&mut writer, path, &header)?;

        for vid in 0..self.num_vertices() as VertexId {
            let record = VertexRecord {
                id: vid,
                out: self.topology().out_neighbors(vid).to_vec(),
                data: self.data(vid).save(phase)?,
            };
            write_line(&mut writer, path, &record)?;
        }

        writer.flush().map_err(|err| PregelError::io(path, err))?;
        info!(path = %path.display(), ?phase, "saved snapshot");
        Ok(())
    }

    /// Reads a snapshot back into a finalized graph.
    pub fn load_snapshot(path: &Path, phase: SerializationPhase) -> Result<Self> {
        let file = File::open(path).map_err(|err| PregelError::io(path, err))?;
        let mut lines = io::BufReader::new(file).lines();

        let header: Header = match lines.next() {
            Some(line) => serde_json::from_str(&line.map_err(|err| PregelError::io(path, err))?)?,
            None => {
                return Err(PregelError::Snapshot {
                    reason: format!("{} is empty", path.display()),
                })
            }
        };

        if header.num_vertices > VertexId::MAX as usize + 1 {
            return Err(PregelError::Snapshot {
                reason: format!(
                    "declared vertex count {} exceeds the id space",
                    header.num_vertices
                ),
            });
        }

        let mut data: Vec<V> = Vec::new();
        data.resize_with(header.num_vertices, V::default);
        let mut seen = vec![false; header.num_vertices];
        let mut edges = Vec::new();

        for line in lines {
            let line = line.map_err(|err| PregelError::io(path, err))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: VertexRecord = serde_json::from_str(&line)?;

            let index = record.id as usize;
            if index >= header.num_vertices {
                return Err(PregelError::Snapshot {
                    reason: format!(
                        "vertex {} beyond declared count {}",
                        record.id, header.num_vertices
                    ),
                });
            }
            if seen[index] {
                return Err(PregelError::Snapshot {
                    reason: format!("vertex {} recorded twice", record.id),
                });
            }
            seen[index] = true;

            for target in record.out {
                if target as usize >= header.num_vertices {
                    return Err(PregelError::Snapshot {
                        reason: format!("edge {} -> {} leaves the graph", record.id, target),
                    });
                }
                edges.push((record.id, target));
            }
            data[index] = V::load(phase, record.data)?;
        }

        if let Some(missing) = seen.iter().position(|&found| !found) {
            return Err(PregelError::Snapshot {
                reason: format!("vertex {} missing", missing),
            });
        }
        if edges.len() != header.num_edges {
            return Err(PregelError::Snapshot {
                reason: format!(
                    "header declares {} edges, found {}",
                    header.num_edges,
                    edges.len()
                ),
            });
        }

        let mut graph = Graph::from_parts(data, edges);
        graph.finalize();
        info!(
            path = %path.display(),
            num_vertices = graph.num_vertices(),
            num_edges = graph.num_edges(),
            "loaded snapshot"
        );
        Ok(graph)
    }
}

fn write_line<W, T>(writer: &mut W, path: &Path, value: &T) -> Result<()>
where
    W: Write,
    T: Serialize,
{
    serde_json::to_writer(&mut *writer, value)?;
    writer
        .write_all(b"\n")
        .map_err(|err| PregelError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppr::VertexData;
    use crate::SparseVec;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn load(contents: &str) -> Result<Graph<VertexData>> {
        let file = write_temp(contents);
        Graph::load_snapshot(file.path(), SerializationPhase::Index)
    }

    fn snapshot_reason(result: Result<Graph<VertexData>>) -> String {
        match result {
            Err(PregelError::Snapshot { reason }) => reason,
            Err(other) => panic!("unexpected error: {}", other),
            Ok(graph) => panic!("loaded {} vertices", graph.num_vertices()),
        }
    }

    #[test]
    fn full_phase_round_trips_graph_and_data() {
        let mut graph: Graph<VertexData> = Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 0);
        graph.add_vertex(3);
        graph.finalize();
        {
            let data = graph.data_mut(1);
            data.ppr = vec![(1, 0.75), (2, 0.25)].into_iter().collect();
            data.flow = SparseVec::singleton(0, 0.125);
            data.residual = SparseVec::singleton(0, 0.3);
        }

        let file = tempfile::NamedTempFile::new().unwrap();
        graph.save_snapshot(file.path(), SerializationPhase::Full).unwrap();
        let loaded: Graph<VertexData> =
            Graph::load_snapshot(file.path(), SerializationPhase::Full).unwrap();

        assert!(loaded.is_finalized());
        assert_eq!(loaded.num_vertices(), 4);
        assert_eq!(loaded.num_edges(), 3);
        assert_eq!(loaded.topology().out_neighbors(2), &[0]);
        assert!(loaded.topology().out_neighbors(3).is_empty());
        for vid in 0..4 {
            assert_eq!(loaded.data(vid), graph.data(vid));
        }
    }

    #[test]
    fn unfinalized_graph_is_not_saved() {
        let mut graph: Graph<VertexData> = Graph::new();
        graph.add_edge(0, 1);
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            graph.save_snapshot(file.path(), SerializationPhase::Index),
            Err(PregelError::NotFinalized)
        ));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(snapshot_reason(load("")).contains("is empty"));
    }

    #[test]
    fn oversized_vertex_count_is_rejected() {
        let reason = snapshot_reason(load(
            "{\"num_vertices\":18446744073709551615,\"num_edges\":0}\n",
        ));
        assert!(reason.contains("exceeds the id space"));

        let reason = snapshot_reason(load(
            "{\"num_vertices\":1,\"num_edges\":18446744073709551615}\n\
             {\"id\":0,\"out\":[],\"data\":{}}\n",
        ));
        assert!(reason.contains("edges"));
    }

    #[test]
    fn truncated_snapshot_is_rejected() {
        let reason = snapshot_reason(load(
            "{\"num_vertices\":3,\"num_edges\":0}\n{\"id\":0,\"out\":[],\"data\":{}}\n",
        ));
        assert_eq!(reason, "vertex 1 missing");
    }

    #[test]
    fn id_beyond_count_is_rejected() {
        let reason = snapshot_reason(load(
            "{\"num_vertices\":1,\"num_edges\":0}\n{\"id\":4,\"out\":[],\"data\":{}}\n",
        ));
        assert!(reason.contains("beyond declared count"));
    }

    #[test]
    fn duplicate_record_is_rejected() {
        let reason = snapshot_reason(load(
            "{\"num_vertices\":1,\"num_edges\":0}\n\
             {\"id\":0,\"out\":[],\"data\":{}}\n\
             {\"id\":0,\"out\":[],\"data\":{}}\n",
        ));
        assert!(reason.contains("recorded twice"));
    }

    #[test]
    fn edge_leaving_the_graph_is_rejected() {
        let reason = snapshot_reason(load(
            "{\"num_vertices\":1,\"num_edges\":1}\n{\"id\":0,\"out\":[7],\"data\":{}}\n",
        ));
        assert!(reason.contains("leaves the graph"));
    }

    #[test]
    fn edge_count_mismatch_is_rejected() {
        let reason = snapshot_reason(load(
            "{\"num_vertices\":2,\"num_edges\":3}\n\
             {\"id\":0,\"out\":[1],\"data\":{}}\n\
             {\"id\":1,\"out\":[],\"data\":{}}\n",
        ));
        assert_eq!(reason, "header declares 3 edges, found 1");
    }
}
