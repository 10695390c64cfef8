use crate::error::Result;
use crate::graph::{Topology, VertexId};
use crate::vertex::{Edge, Vertex, VertexMut};
use crate::Combine;
use crate::Context;
use crate::VertexProgram;

use std::ops::Range;
use std::time::Instant;
use tracing::debug;

/// Per-vertex program state between phases of one round.
pub(crate) enum ProgramSlot<P>
where
    P: VertexProgram,
{
    Idle,
    Live { program: P, total: P::Gather },
    Parked(Vec<u8>),
}

impl<P> Default for ProgramSlot<P>
where
    P: VertexProgram,
{
    fn default() -> Self {
        ProgramSlot::Idle
    }
}

/// Runs the phases of a round over one contiguous range of vertices.
///
/// The master hands every worker the slices of vertex data and program
/// slots that fall into its range, so workers never touch each other's
/// vertices. Signals go straight into the shared accumulator.
pub struct Worker {
    pub id: usize,
    pub range: Range<usize>,
    pub time_cost: u64,
    pub n_signals_sent: usize,
    pub n_vertices_activated: usize,
    pub n_active_vertices: usize,
}

impl Worker {
    pub fn new(id: usize, range: Range<usize>) -> Self {
        Worker {
            id,
            range,
            time_cost: 0,
            n_signals_sent: 0,
            n_vertices_activated: 0,
            n_active_vertices: 0,
        }
    }

    pub fn local_n_vertices(&self) -> usize {
        self.range.len()
    }

    fn vertex_id(&self, offset: usize) -> VertexId {
        (self.range.start + offset) as VertexId
    }

    fn clean(&mut self) {
        self.time_cost = 0;
        self.n_signals_sent = 0;
        self.n_vertices_activated = 0;
        self.n_active_vertices = 0;
    }

    fn record_signals<M>(&mut self, context: &Context<M>)
    where
        M: Combine,
    {
        self.n_signals_sent += context.signals_sent();
        self.n_vertices_activated += context.vertices_activated();
    }

    /// Consumes pending messages of the local range, then inits and gathers
    /// every vertex that had one.
    pub(crate) fn gather<P>(
        &mut self,
        context: &Context<P::Message>,
        prototype: &P,
        topology: &Topology,
        data: &[P::Data],
        slots: &mut [ProgramSlot<P>],
    ) where
        P: VertexProgram,
    {
        let now = Instant::now();
        self.clean();

        for (offset, slot) in slots.iter_mut().enumerate() {
            let vid = self.vertex_id(offset);
            let message = match context.accumulator().test_and_get(vid) {
                Some(message) => message,
                None => {
                    *slot = ProgramSlot::Idle;
                    continue;
                }
            };

            let vertex = Vertex::new(vid, data, topology);
            let mut program = prototype.clone();
            program.init(context, vertex, message);

            let direction = program.gather_edges(context, vertex);
            let mut total: Option<P::Gather> = None;
            let mut reduce = |edge: Edge<P::Data>| {
                let partial = program.gather(context, vertex, edge);
                match total.as_mut() {
                    Some(total) => total.combine(&partial),
                    None => total = Some(partial),
                }
            };
            if direction.includes_in() {
                vertex.in_edges().for_each(&mut reduce);
            }
            if direction.includes_out() {
                vertex.out_edges().for_each(&mut reduce);
            }

            *slot = ProgramSlot::Live {
                program,
                total: total.unwrap_or_default(),
            };
            self.n_active_vertices += 1;
        }

        self.time_cost += now.elapsed().as_millis() as u64;
    }

    /// Applies the gathered totals. With `persist` set, each program is
    /// serialized afterwards and dropped.
    pub(crate) fn apply<P>(
        &mut self,
        context: &Context<P::Message>,
        topology: &Topology,
        data: &mut [P::Data],
        slots: &mut [ProgramSlot<P>],
        persist: bool,
    ) -> Result<()>
    where
        P: VertexProgram,
    {
        let now = Instant::now();

        for (offset, (value, slot)) in data.iter_mut().zip(slots.iter_mut()).enumerate() {
            if let ProgramSlot::Live { program, total } = slot {
                let mut vertex = VertexMut::new(self.vertex_id(offset), value, topology);
                program.apply(context, &mut vertex, total);

                if persist {
                    let mut bytes = Vec::new();
                    program.save(&mut bytes)?;
                    *slot = ProgramSlot::Parked(bytes);
                }
            }
        }

        self.time_cost += now.elapsed().as_millis() as u64;
        Ok(())
    }

    /// Scatters from every vertex that ran this round and leaves all slots
    /// idle.
    pub(crate) fn scatter<P>(
        &mut self,
        context: &Context<P::Message>,
        prototype: &P,
        topology: &Topology,
        data: &[P::Data],
        slots: &mut [ProgramSlot<P>],
    ) -> Result<()>
    where
        P: VertexProgram,
    {
        let now = Instant::now();

        for (offset, slot) in slots.iter_mut().enumerate() {
            let program = match std::mem::take(slot) {
                ProgramSlot::Idle => continue,
                ProgramSlot::Live { program, .. } => program,
                ProgramSlot::Parked(bytes) => {
                    let mut program = prototype.clone();
                    program.load(&bytes)?;
                    program
                }
            };

            let vertex = Vertex::new(self.vertex_id(offset), data, topology);
            let direction = program.scatter_edges(context, vertex);
            if direction.includes_in() {
                for edge in vertex.in_edges() {
                    program.scatter(context, vertex, edge);
                }
            }
            if direction.includes_out() {
                for edge in vertex.out_edges() {
                    program.scatter(context, vertex, edge);
                }
            }
        }

        self.record_signals(context);
        self.time_cost += now.elapsed().as_millis() as u64;
        debug!(
            worker = self.id,
            active = self.n_active_vertices,
            signals = self.n_signals_sent,
            time_ms = self.time_cost,
            "worker finished round"
        );
        Ok(())
    }

    /// Runs `transform` on every local vertex outside of any round.
    pub(crate) fn transform<V, M, F>(
        &mut self,
        context: &Context<M>,
        topology: &Topology,
        data: &mut [V],
        transform: &F,
    ) where
        M: Combine,
        F: Fn(&Context<M>, &mut VertexMut<V>),
    {
        let now = Instant::now();
        self.clean();

        for (offset, value) in data.iter_mut().enumerate() {
            let mut vertex = VertexMut::new(self.vertex_id(offset), value, topology);
            transform(context, &mut vertex);
        }

        self.record_signals(context);
        self.time_cost = now.elapsed().as_millis() as u64;
    }
}
