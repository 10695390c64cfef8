/**
 * Engine phase within a round.
 *
 * GATHER ---> APPLY ---> SCATTER ---> DONE
 *    ^                      |
 *    |                      |
 *     ----------------------
 *
 * Every transition is a barrier: all workers finish the phase before any
 * starts the next one.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Gather,  // consume pending messages, init and gather active vertices.
    Apply,   // apply gathered totals to vertex data.
    Scatter, // scatter from active vertices, round ends.
    Done,    // round cap reached or nothing left to run.
}
