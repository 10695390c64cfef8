use crate::Combine;
use crate::VertexId;

use serde::{Deserialize, Serialize};
use std::collections::hash_map::{self, HashMap};

pub type Weight = f64;

/// Sparse vector of vertex weights.
///
/// Only significant entries are stored, an absent key reads as zero. Used
/// both as the message exchanged between vertices and as the per-vertex
/// `ppr`, `flow` and `residual` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseVec {
    entries: HashMap<VertexId, Weight>,
}

impl SparseVec {
    pub fn new() -> Self {
        SparseVec {
            entries: HashMap::new(),
        }
    }

    pub fn singleton(id: VertexId, weight: Weight) -> Self {
        let mut vec = SparseVec::new();
        vec.insert(id, weight);
        vec
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, id: VertexId) -> Option<Weight> {
        self.entries.get(&id).copied()
    }

    /// Overwrites the weight stored for `id`.
    pub fn insert(&mut self, id: VertexId, weight: Weight) {
        self.entries.insert(id, weight);
    }

    /// Adds `weight` to the entry for `id`, creating it if absent.
    pub fn add(&mut self, id: VertexId, weight: Weight) {
        *self.entries.entry(id).or_insert(0.0) += weight;
    }

    pub fn remove(&mut self, id: VertexId) -> Option<Weight> {
        self.entries.remove(&id)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, VertexId, Weight> {
        self.entries.iter()
    }

    /// Adds every entry of `other` into `self`.
    pub fn merge_add(&mut self, other: &SparseVec) {
        for (&id, &weight) in &other.entries {
            self.add(id, weight);
        }
    }

    /// Copy of `self` with every weight multiplied by `factor`.
    pub fn scaled(&self, factor: Weight) -> SparseVec {
        self.entries
            .iter()
            .map(|(&id, &weight)| (id, weight * factor))
            .collect()
    }

    pub fn sum(&self) -> Weight {
        self.entries.values().sum()
    }
}

impl Combine for SparseVec {
    fn combine(&mut self, other: &Self) {
        self.merge_add(other);
    }

    fn priority(&self) -> f64 {
        self.entries.values().map(|weight| weight.abs()).sum()
    }
}

impl FromIterator<(VertexId, Weight)> for SparseVec {
    fn from_iter<I: IntoIterator<Item = (VertexId, Weight)>>(iter: I) -> Self {
        let mut vec = SparseVec::new();
        for (id, weight) in iter {
            vec.add(id, weight);
        }
        vec
    }
}

impl<'a> IntoIterator for &'a SparseVec {
    type Item = (&'a VertexId, &'a Weight);
    type IntoIter = hash_map::Iter<'a, VertexId, Weight>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for SparseVec {
    type Item = (VertexId, Weight);
    type IntoIter = hash_map::IntoIter<VertexId, Weight>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small_vec() -> impl Strategy<Value = SparseVec> {
        // Integral weights keep float addition exact, so order checks can use ==.
        proptest::collection::vec((0_u32..16, -50_i32..50), 0..12).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(id, weight)| (id, weight as Weight))
                .collect()
        })
    }

    #[test]
    fn merge_add_creates_and_accumulates() {
        let mut a = SparseVec::singleton(1, 0.5);
        let b: SparseVec = vec![(1, 0.25), (4, 2.0)].into_iter().collect();

        a.merge_add(&b);

        assert_eq!(a.len(), 2);
        assert_eq!(a.get(1), Some(0.75));
        assert_eq!(a.get(4), Some(2.0));
        assert_eq!(a.get(9), None);
    }

    #[test]
    fn scaled_leaves_source_untouched() {
        let a: SparseVec = vec![(0, 0.5), (3, 0.25)].into_iter().collect();
        let b = a.scaled(2.0);

        assert_eq!(b.get(0), Some(1.0));
        assert_eq!(b.get(3), Some(0.5));
        assert_eq!(a.get(0), Some(0.5));
    }

    #[test]
    fn clear_empties() {
        let mut a = SparseVec::singleton(7, 1.0);
        assert!(!a.is_empty());
        a.clear();
        assert!(a.is_empty());
        assert_eq!(a.sum(), 0.0);
    }

    #[test]
    fn priority_is_total_magnitude() {
        let a: SparseVec = vec![(0, 0.5), (1, -0.25)].into_iter().collect();
        assert_eq!(a.priority(), 0.75);
    }

    #[test]
    fn json_round_trip_keeps_entries() {
        let a: SparseVec = vec![(0, 0.125), (42, 3.5)].into_iter().collect();
        let text = serde_json::to_string(&a).unwrap();
        let b: SparseVec = serde_json::from_str(&text).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn merge_add_is_commutative(a in small_vec(), b in small_vec()) {
            let mut ab = a.clone();
            ab.merge_add(&b);
            let mut ba = b.clone();
            ba.merge_add(&a);
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn merge_add_is_associative(a in small_vec(), b in small_vec(), c in small_vec()) {
            let mut left = a.clone();
            left.merge_add(&b);
            left.merge_add(&c);

            let mut bc = b.clone();
            bc.merge_add(&c);
            let mut right = a.clone();
            right.merge_add(&bc);

            prop_assert_eq!(left, right);
        }
    }
}
