use crate::Accumulator;
use crate::Combine;
use crate::VertexId;

use std::cell::Cell;

/// Engine state visible to a vertex program while it runs.
///
/// One context is created per worker per phase, so the signal counter needs
/// no synchronization.
pub struct Context<'a, M> {
    round: usize,
    max_rounds: usize,
    num_vertices: usize,
    num_edges: usize,
    accumulator: &'a Accumulator<M>,
    n_signals: Cell<usize>,
    n_activated: Cell<usize>,
}

impl<'a, M> Context<'a, M>
where
    M: Combine,
{
    pub(crate) fn new(
        round: usize,
        max_rounds: usize,
        num_edges: usize,
        accumulator: &'a Accumulator<M>,
    ) -> Self {
        Context {
            round,
            max_rounds,
            num_vertices: accumulator.size(),
            num_edges,
            accumulator,
            n_signals: Cell::new(0),
            n_activated: Cell::new(0),
        }
    }

    pub(crate) fn accumulator(&self) -> &'a Accumulator<M> {
        self.accumulator
    }

    /// Current round, starting at 0.
    pub fn iteration(&self) -> usize {
        self.round
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn is_last_round(&self) -> bool {
        self.round + 1 >= self.max_rounds
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Delivers `message` to `target` for the next round, merging it with
    /// whatever is already pending there.
    pub fn signal(&self, target: VertexId, message: M) {
        if self.accumulator.add(target, message) {
            self.n_activated.set(self.n_activated.get() + 1);
        }
        self.n_signals.set(self.n_signals.get() + 1);
    }

    pub fn signals_sent(&self) -> usize {
        self.n_signals.get()
    }

    /// Signals that landed in an empty slot.
    pub fn vertices_activated(&self) -> usize {
        self.n_activated.get()
    }
}
