use crate::graph::{Topology, VertexId};

/// Read-only view of a vertex, handed to the init, gather and scatter
/// phases.
pub struct Vertex<'a, V> {
    id: VertexId,
    data: &'a [V],
    topology: &'a Topology,
}

impl<'a, V> Clone for Vertex<'a, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, V> Copy for Vertex<'a, V> {}

impl<'a, V> Vertex<'a, V> {
    pub(crate) fn new(id: VertexId, data: &'a [V], topology: &'a Topology) -> Self {
        Vertex { id, data, topology }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn data(&self) -> &'a V {
        &self.data[self.id as usize]
    }

    pub fn num_out_edges(&self) -> usize {
        self.topology.num_out_edges(self.id)
    }

    pub fn num_in_edges(&self) -> usize {
        self.topology.num_in_edges(self.id)
    }

    pub fn out_edges(&self) -> impl Iterator<Item = Edge<'a, V>> + 'a {
        let (id, data, topology) = (self.id, self.data, self.topology);
        topology
            .out_neighbors(id)
            .iter()
            .map(move |&target| Edge::new(id, target, data, topology))
    }

    pub fn in_edges(&self) -> impl Iterator<Item = Edge<'a, V>> + 'a {
        let (id, data, topology) = (self.id, self.data, self.topology);
        topology
            .in_neighbors(id)
            .iter()
            .map(move |&source| Edge::new(source, id, data, topology))
    }
}

/// Exclusive view of a vertex, handed to the apply phase. The only way a
/// vertex program can change persistent vertex data.
pub struct VertexMut<'a, V> {
    id: VertexId,
    data: &'a mut V,
    num_out_edges: usize,
    num_in_edges: usize,
}

impl<'a, V> VertexMut<'a, V> {
    pub(crate) fn new(id: VertexId, data: &'a mut V, topology: &Topology) -> Self {
        VertexMut {
            id,
            data,
            num_out_edges: topology.num_out_edges(id),
            num_in_edges: topology.num_in_edges(id),
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn data(&self) -> &V {
        self.data
    }

    pub fn data_mut(&mut self) -> &mut V {
        self.data
    }

    pub fn num_out_edges(&self) -> usize {
        self.num_out_edges
    }

    pub fn num_in_edges(&self) -> usize {
        self.num_in_edges
    }
}

/// A directed edge between two vertices of the graph.
pub struct Edge<'a, V> {
    source: VertexId,
    target: VertexId,
    data: &'a [V],
    topology: &'a Topology,
}

impl<'a, V> Edge<'a, V> {
    pub(crate) fn new(
        source: VertexId,
        target: VertexId,
        data: &'a [V],
        topology: &'a Topology,
    ) -> Self {
        Edge {
            source,
            target,
            data,
            topology,
        }
    }

    pub fn source_id(&self) -> VertexId {
        self.source
    }

    pub fn target_id(&self) -> VertexId {
        self.target
    }

    pub fn source(&self) -> Vertex<'a, V> {
        Vertex::new(self.source, self.data, self.topology)
    }

    pub fn target(&self) -> Vertex<'a, V> {
        Vertex::new(self.target, self.data, self.topology)
    }
}
