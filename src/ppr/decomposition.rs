use super::VertexData;
use crate::error::Result;
use crate::{
    Context, Edge, EdgeDir, SparseVec, Vertex, VertexId, VertexMut, VertexProgram, Weight,
};

use std::collections::HashSet;
use std::sync::Arc;

/// Default probability of a random walk restarting at its source.
pub const RESET_PROB: Weight = 0.15;

/// Parameters shared by every decomposition program of a run.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub reset_prob: Weight,
    /// Propagated flow at or below this weight is dropped.
    pub threshold: Weight,
    /// Vertices seeded in round 0. `None` seeds every vertex.
    pub sources: Option<HashSet<VertexId>>,
}

impl FlowSettings {
    pub fn new(threshold: Weight) -> Self {
        FlowSettings {
            reset_prob: RESET_PROB,
            threshold,
            sources: None,
        }
    }

    pub fn with_reset_prob(mut self, reset_prob: Weight) -> Self {
        self.reset_prob = reset_prob;
        self
    }

    pub fn with_sources(mut self, sources: HashSet<VertexId>) -> Self {
        self.sources = Some(sources);
        self
    }

    fn is_seeded(&self, vid: VertexId) -> bool {
        match &self.sources {
            Some(sources) => sources.contains(&vid),
            None => true,
        }
    }
}

/// Pushes flow one hop per round and records what each vertex retains.
///
/// `flow` holds the flow that reached this vertex in the current round,
/// keyed by the source it started from.
#[derive(Debug, Clone)]
pub struct DecompositionProgram {
    settings: Arc<FlowSettings>,
    flow: SparseVec,
}

impl DecompositionProgram {
    pub fn new(settings: FlowSettings) -> Self {
        DecompositionProgram {
            settings: Arc::new(settings),
            flow: SparseVec::new(),
        }
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    pub fn flow(&self) -> &SparseVec {
        &self.flow
    }
}

impl VertexProgram for DecompositionProgram {
    type Data = VertexData;
    type Message = SparseVec;
    type Gather = ();

    fn init(
        &mut self,
        context: &Context<SparseVec>,
        vertex: Vertex<VertexData>,
        message: SparseVec,
    ) {
        if context.iteration() == 0 {
            self.flow.clear();
            if self.settings.is_seeded(vertex.id()) {
                self.flow.insert(vertex.id(), 1.0);
            }
        } else {
            self.flow = message;
        }
    }

    fn apply(
        &mut self,
        context: &Context<SparseVec>,
        vertex: &mut VertexMut<VertexData>,
        _total: &(),
    ) {
        if context.is_last_round() {
            vertex.data_mut().flow.merge_add(&self.flow);
            self.flow.clear();
            return;
        }

        let mut next = SparseVec::new();
        if !self.flow.is_empty() {
            let reset_prob = self.settings.reset_prob;
            let spread = match vertex.num_out_edges() {
                0 => 1.0,
                n => 1.0 / n as Weight,
            };
            let c = (1.0 - reset_prob) * spread;

            let residual = &mut vertex.data_mut().residual;
            for (&source, &weight) in &self.flow {
                residual.add(source, reset_prob * weight);
                let passed = c * weight;
                if passed > self.settings.threshold {
                    next.insert(source, passed);
                }
            }
        }
        self.flow = next;
    }

    fn scatter_edges(
        &self,
        _context: &Context<SparseVec>,
        _vertex: Vertex<VertexData>,
    ) -> EdgeDir {
        if self.flow.is_empty() {
            EdgeDir::None
        } else {
            EdgeDir::Out
        }
    }

    fn scatter(
        &self,
        context: &Context<SparseVec>,
        _vertex: Vertex<VertexData>,
        edge: Edge<VertexData>,
    ) {
        context.signal(edge.target_id(), self.flow.clone());
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        serde_json::to_writer(out, &self.flow)?;
        Ok(())
    }

    fn load(&mut self, bytes: &[u8]) -> Result<()> {
        self.flow = serde_json::from_slice(bytes)?;
        Ok(())
    }
}
