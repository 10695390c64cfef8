/// Payloads that can be merged in place when several of them target the
/// same vertex in one round.
///
/// `combine` must be commutative and associative: concurrent signals reach
/// an accumulator slot in no particular order and the merged value must not
/// depend on it.
pub trait Combine: Send {
    fn combine(&mut self, other: &Self);

    /// Scheduling priority of a pending payload. Higher runs first.
    fn priority(&self) -> f64 {
        0.0
    }
}

impl Combine for () {
    fn combine(&mut self, _other: &Self) {}
}

impl Combine for f64 {
    fn combine(&mut self, other: &Self) {
        *self += *other;
    }

    fn priority(&self) -> f64 {
        self.abs()
    }
}

impl Combine for u64 {
    fn combine(&mut self, other: &Self) {
        *self += *other;
    }

    fn priority(&self) -> f64 {
        *self as f64
    }
}
