use crate::error::Result;
use crate::vertex::{Edge, Vertex, VertexMut};
use crate::Combine;
use crate::Context;

/// Which incident edges of a vertex take part in gather or scatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDir {
    None,
    In,
    Out,
    All,
}

impl EdgeDir {
    pub fn includes_in(self) -> bool {
        matches!(self, EdgeDir::In | EdgeDir::All)
    }

    pub fn includes_out(self) -> bool {
        matches!(self, EdgeDir::Out | EdgeDir::All)
    }
}

/// A vertex-centric algorithm run by the synchronous engine.
///
/// For every vertex with a pending message the engine clones a prototype
/// program and drives it through
///
/// ```text
/// init -> gather (per edge) -> apply || scatter (per edge) || next round
/// ```
///
/// where `||` is a global barrier. The program value only lives for one
/// round; whatever must persist goes into the vertex data during `apply`.
pub trait VertexProgram: Clone + Send + Sync {
    type Data: Send + Sync;
    type Message: Combine + Default + Send + Sync;
    type Gather: Combine + Default + Send + Sync;

    /// Receives the merged message delivered to this vertex.
    fn init(
        &mut self,
        context: &Context<Self::Message>,
        vertex: Vertex<Self::Data>,
        message: Self::Message,
    );

    fn gather_edges(
        &self,
        _context: &Context<Self::Message>,
        _vertex: Vertex<Self::Data>,
    ) -> EdgeDir {
        EdgeDir::None
    }

    /// Partial result for one edge. Partials are reduced with
    /// [`Combine::combine`] in no particular order.
    fn gather(
        &self,
        _context: &Context<Self::Message>,
        _vertex: Vertex<Self::Data>,
        _edge: Edge<Self::Data>,
    ) -> Self::Gather {
        Self::Gather::default()
    }

    fn apply(
        &mut self,
        context: &Context<Self::Message>,
        vertex: &mut VertexMut<Self::Data>,
        total: &Self::Gather,
    );

    fn scatter_edges(
        &self,
        _context: &Context<Self::Message>,
        _vertex: Vertex<Self::Data>,
    ) -> EdgeDir {
        EdgeDir::None
    }

    fn scatter(
        &self,
        _context: &Context<Self::Message>,
        _vertex: Vertex<Self::Data>,
        _edge: Edge<Self::Data>,
    ) {
    }

    /// Serializes the state that must survive from apply to scatter.
    fn save(&self, out: &mut Vec<u8>) -> Result<()>;

    /// Restores state written by [`VertexProgram::save`].
    fn load(&mut self, bytes: &[u8]) -> Result<()>;
}
