use super::VertexData;
use crate::error::Result;
use crate::{Context, SparseVec, Vertex, VertexMut, VertexProgram, Weight};

/// Overwrites a vertex's `ppr` with the vector delivered to it.
#[derive(Debug, Clone, Default)]
pub struct CollectionProgram {
    ppr: SparseVec,
}

impl VertexProgram for CollectionProgram {
    type Data = VertexData;
    type Message = SparseVec;
    type Gather = ();

    fn init(
        &mut self,
        _context: &Context<SparseVec>,
        _vertex: Vertex<VertexData>,
        message: SparseVec,
    ) {
        self.ppr = message;
    }

    fn apply(
        &mut self,
        _context: &Context<SparseVec>,
        vertex: &mut VertexMut<VertexData>,
        _total: &(),
    ) {
        if !self.ppr.is_empty() {
            vertex.data_mut().ppr = std::mem::take(&mut self.ppr);
        }
    }

    fn save(&self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }

    fn load(&mut self, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollectSettings {
    /// Entries below this weight are not forwarded.
    pub threshold: Weight,
    /// Skip the index part: forward residuals only.
    pub no_index: bool,
}

/// Sends every source the part of its ppr vector this vertex knows about.
///
/// Leftover flow from source `s` is worth `flow[s]` times this vertex's own
/// ppr vector, plus whatever `s` left here as residual. Residuals without
/// matching flow are forwarded on their own. Residuals are cleared.
pub fn collect_results(
    context: &Context<SparseVec>,
    vertex: &mut VertexMut<VertexData>,
    settings: &CollectSettings,
) {
    let id = vertex.id();
    let VertexData { ppr, flow, residual } = vertex.data_mut();

    if !settings.no_index {
        for (&source, &weight) in flow.iter() {
            if weight < settings.threshold {
                continue;
            }
            let mut vector = ppr.scaled(weight);
            if let Some(retained) = residual.remove(source) {
                vector.add(id, retained);
            }
            context.signal(source, vector);
        }
    }

    for (&source, &weight) in residual.iter() {
        if weight < settings.threshold {
            continue;
        }
        context.signal(source, SparseVec::singleton(id, weight));
    }
    residual.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineOptions, Graph, Master};

    fn two_vertices() -> Graph<VertexData> {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);
        graph.finalize();
        graph
    }

    #[test]
    fn flow_is_scaled_by_ppr_and_joined_with_residual() {
        let mut graph = two_vertices();
        {
            let data = graph.data_mut(1);
            data.ppr = vec![(1, 0.6), (4, 0.4)].into_iter().collect();
            data.flow = SparseVec::singleton(0, 0.5);
            data.residual = SparseVec::singleton(0, 0.1);
        }

        let options = EngineOptions::default().with_max_rounds(1).with_nworkers(2);
        let mut master = Master::for_graph(CollectionProgram::default(), &graph, options);
        let settings = CollectSettings {
            threshold: 0.0,
            no_index: false,
        };
        let sent = master
            .transform_vertices(&mut graph, |context, vertex| {
                collect_results(context, vertex, &settings)
            })
            .unwrap();
        assert_eq!(sent, 1);
        master.start(&mut graph).unwrap();

        let ppr = &graph.data(0).ppr;
        assert!((ppr.get(1).unwrap() - (0.3 + 0.1)).abs() < 1e-12);
        assert!((ppr.get(4).unwrap() - 0.2).abs() < 1e-12);
        assert!(graph.data(1).residual.is_empty());
        assert_eq!(graph.data(1).ppr.len(), 2);
    }

    #[test]
    fn no_index_forwards_residuals_only() {
        let mut graph = two_vertices();
        {
            let data = graph.data_mut(1);
            data.ppr = SparseVec::singleton(1, 1.0);
            data.flow = SparseVec::singleton(0, 0.5);
            data.residual = vec![(0, 0.2), (1, 0.05)].into_iter().collect();
        }

        let options = EngineOptions::default().with_max_rounds(1).with_nworkers(1);
        let mut master = Master::for_graph(CollectionProgram::default(), &graph, options);
        let settings = CollectSettings {
            threshold: 0.1,
            no_index: true,
        };
        master
            .transform_vertices(&mut graph, |context, vertex| {
                collect_results(context, vertex, &settings)
            })
            .unwrap();
        master.start(&mut graph).unwrap();

        assert_eq!(graph.data(0).ppr, SparseVec::singleton(1, 0.2));
        // vertex 1's own residual was below threshold: its ppr is untouched.
        assert_eq!(graph.data(1).ppr, SparseVec::singleton(1, 1.0));
        assert!(graph.data(1).residual.is_empty());
    }
}
