use super::VertexData;
use crate::error::{PregelError, Result};
use crate::{Graph, SparseVec, VertexId, Weight};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// The `k` heaviest entries of `ppr`, heaviest first. Equal weights are
/// ordered by ascending vertex id.
pub fn top_k(ppr: &SparseVec, k: usize) -> Vec<(VertexId, Weight)> {
    let mut entries: Vec<(VertexId, Weight)> = ppr.iter().map(|(&id, &w)| (id, w)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(k);
    entries
}

/// Output line for one vertex: `<id> <k> <id_1> ... <id_k>`. Vertices with
/// an empty ppr vector have no line.
pub fn format_vertex(id: VertexId, ppr: &SparseVec, topk: usize) -> Option<String> {
    if ppr.is_empty() {
        return None;
    }

    let ranked = top_k(ppr, topk);
    let mut line = format!("{} {}", id, ranked.len());
    for (neighbor, _) in ranked {
        line.push(' ');
        line.push_str(&neighbor.to_string());
    }
    Some(line)
}

/// Writes the top-k line of every vertex with a ppr vector. Returns the
/// number of lines written.
pub fn save_results(graph: &Graph<VertexData>, path: &Path, topk: usize) -> Result<usize> {
    let file = File::create(path).map_err(|err| PregelError::io(path, err))?;
    let mut writer = BufWriter::new(file);

    let mut written = 0;
    for vid in 0..graph.num_vertices() as VertexId {
        if let Some(line) = format_vertex(vid, &graph.data(vid).ppr, topk) {
            writeln!(writer, "{}", line).map_err(|err| PregelError::io(path, err))?;
            written += 1;
        }
    }
    writer.flush().map_err(|err| PregelError::io(path, err))?;

    info!(path = %path.display(), lines = written, "saved results");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_descending_weight() {
        let ppr: SparseVec = vec![(5, 0.4), (2, 0.9), (7, 0.1)].into_iter().collect();
        assert_eq!(format_vertex(3, &ppr, 2), Some("3 2 2 5".to_string()));
        assert_eq!(format_vertex(3, &ppr, 10), Some("3 3 2 5 7".to_string()));
    }

    #[test]
    fn ties_break_on_vertex_id() {
        let ppr: SparseVec = vec![(9, 0.5), (1, 0.5), (4, 0.5)].into_iter().collect();
        assert_eq!(top_k(&ppr, 3), vec![(1, 0.5), (4, 0.5), (9, 0.5)]);
    }

    #[test]
    fn empty_vector_has_no_line() {
        assert_eq!(format_vertex(0, &SparseVec::new(), 5), None);
    }

    #[test]
    fn zero_k_keeps_header() {
        let ppr = SparseVec::singleton(1, 1.0);
        assert_eq!(format_vertex(8, &ppr, 0), Some("8 0".to_string()));
    }
}
