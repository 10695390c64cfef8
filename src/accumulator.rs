use crate::Combine;
use crate::VertexId;

use parking_lot::Mutex;

/// Per-vertex pending-message table.
///
/// Every vertex owns one slot holding at most one pending payload. Signals
/// that reach an occupied slot are merged into the payload already there
/// with [`Combine::combine`], so a vertex always sees a single merged
/// message per round. Each slot has its own lock: adds to different
/// vertices never contend.
///
/// Vertex ids outside `0..size()` are caller bugs and panic.
pub struct Accumulator<M> {
    slots: Vec<Mutex<Option<M>>>,
}

impl<M> Accumulator<M>
where
    M: Combine,
{
    pub fn new(num_vertices: usize) -> Self {
        let mut accumulator = Accumulator { slots: Vec::new() };
        accumulator.resize(num_vertices);
        accumulator
    }

    /// Resets the table to `num_vertices` empty slots. Taking `&mut self`
    /// guarantees no add or get is in flight.
    pub fn resize(&mut self, num_vertices: usize) {
        self.slots.clear();
        self.slots.resize_with(num_vertices, || Mutex::new(None));
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, vid: VertexId) -> &Mutex<Option<M>> {
        let index = vid as usize;
        assert!(
            index < self.slots.len(),
            "vertex {} out of range for accumulator of {} slots",
            vid,
            self.slots.len()
        );
        &self.slots[index]
    }

    /// Stores `payload` for `vid`, merging it into any payload already
    /// pending. Returns `true` if the slot was empty.
    pub fn add(&self, vid: VertexId, payload: M) -> bool {
        let mut slot = self.slot(vid).lock();
        match slot.as_mut() {
            Some(pending) => {
                pending.combine(&payload);
                false
            }
            None => {
                *slot = Some(payload);
                true
            }
        }
    }

    /// Removes and returns the pending payload of `vid`, if any.
    pub fn test_and_get(&self, vid: VertexId) -> Option<M> {
        self.slot(vid).lock().take()
    }

    /// Removes and returns the pending payload of `vid`.
    ///
    /// # Panics
    ///
    /// If nothing is pending. Callers use this only after observing the slot
    /// as set through [`Accumulator::priority`].
    pub fn get(&self, vid: VertexId) -> M {
        let taken = self.slot(vid).lock().take();
        match taken {
            Some(payload) => payload,
            None => panic!("get on vertex {} with no pending payload", vid),
        }
    }

    /// Whether `vid` has a pending payload, and that payload's priority.
    /// Does not consume the payload.
    pub fn priority(&self, vid: VertexId) -> (bool, f64) {
        match self.slot(vid).lock().as_ref() {
            Some(pending) => (true, pending.priority()),
            None => (false, 0.0),
        }
    }

    pub fn is_set(&self, vid: VertexId) -> bool {
        self.slot(vid).lock().is_some()
    }

    /// Number of slots currently holding a payload.
    pub fn num_pending(&self) -> usize {
        self.slots.iter().filter(|slot| slot.lock().is_some()).count()
    }
}
