//! Sparse flow store for the basic variables.
//!
//! The simplex only ever materialises the flows of basic arcs, so the store
//! is a mapping from the linear arc index `i·n + j` to a non-negative flow.
//! Presence in the store is the authoritative "is basic" predicate: a
//! degenerate basic arc is kept present with a small positive sentinel
//! (`ε_q`) so that presence and strict positivity stay distinguishable.
//!
//! Two representations are provided and chosen at construction. The dense
//! one backs the mapping with an `m·n` vector and uses NaN to mean "absent";
//! it is the faster option for instances up to roughly `m·n ≈ 10⁸`. The
//! sparse one is a plain hash map and only pays for what is basic, which
//! matters when a caller keeps many stores alive at once.

use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Main structs.

/// Flow store behind the two interchangeable representations.
///
/// Ideally this would be a trait object, but the store sits on the hottest
/// paths of the cycle engine and the enum keeps the dispatch branch-predictable
/// and the call sites monomorphic.
#[derive(Debug, Clone)]
pub enum FlowStore {
    Dense(DenseFlowStore),
    Sparse(SparseFlowStore),
}

/// Dense representation: an `m·n` vector with NaN marking absent entries.
#[derive(Debug, Clone)]
pub struct DenseFlowStore {
    flows: Vec<f64>,
}

/// Sparse representation: a hash map over the linear arc indices.
#[derive(Debug, Clone)]
pub struct SparseFlowStore {
    flows: HashMap<usize, f64>,
    capacity: usize,
}

// -------------------------------------------------------------------------------------------------
// Implementations.

impl FlowStore {
    /// Create an empty store able to address linear indices `0..capacity`.
    pub fn new(capacity: usize, sparse: bool) -> Self {
        if sparse {
            FlowStore::Sparse(SparseFlowStore {
                flows: HashMap::new(),
                capacity,
            })
        } else {
            FlowStore::Dense(DenseFlowStore {
                flows: vec![f64::NAN; capacity],
            })
        }
    }

    /// Number of addressable arcs (`m·n`), not the number of basic ones.
    pub fn capacity(&self) -> usize {
        match self {
            FlowStore::Dense(s) => s.flows.len(),
            FlowStore::Sparse(s) => s.capacity,
        }
    }

    /// Number of arcs currently present, i.e. the basis cardinality.
    pub fn basic_count(&self) -> usize {
        match self {
            FlowStore::Dense(s) => s.flows.iter().filter(|q| !q.is_nan()).count(),
            FlowStore::Sparse(s) => s.flows.len(),
        }
    }

    pub fn contains(&self, arc: usize) -> bool {
        match self {
            FlowStore::Dense(s) => !s.flows[arc].is_nan(),
            FlowStore::Sparse(s) => s.flows.contains_key(&arc),
        }
    }

    pub fn get(&self, arc: usize) -> Option<f64> {
        match self {
            FlowStore::Dense(s) => {
                let q = s.flows[arc];
                if q.is_nan() {
                    None
                } else {
                    Some(q)
                }
            }
            FlowStore::Sparse(s) => s.flows.get(&arc).copied(),
        }
    }

    pub fn set(&mut self, arc: usize, flow: f64) {
        match self {
            FlowStore::Dense(s) => s.flows[arc] = flow,
            FlowStore::Sparse(s) => {
                s.flows.insert(arc, flow);
            }
        }
    }

    pub fn remove(&mut self, arc: usize) {
        match self {
            FlowStore::Dense(s) => s.flows[arc] = f64::NAN,
            FlowStore::Sparse(s) => {
                s.flows.remove(&arc);
            }
        }
    }

    /// Iterate over the present `(arc, flow)` pairs in unspecified order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (usize, f64)> + '_> {
        match self {
            FlowStore::Dense(s) => Box::new(
                s.flows
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| !q.is_nan())
                    .map(|(c, q)| (c, *q)),
            ),
            FlowStore::Sparse(s) => Box::new(s.flows.iter().map(|(c, q)| (*c, *q))),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Unit tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(mut store: FlowStore) {
        assert_eq!(store.capacity(), 6);
        assert_eq!(store.basic_count(), 0);
        assert!(!store.contains(3));

        store.set(3, 7.5);
        store.set(0, 0.0);
        assert!(store.contains(3));
        assert!(store.contains(0), "zero flow must still count as present");
        assert_eq!(store.get(3), Some(7.5));
        assert_eq!(store.basic_count(), 2);

        store.set(3, 2.0);
        assert_eq!(store.get(3), Some(2.0), "set must overwrite");

        store.remove(3);
        assert!(!store.contains(3));
        assert_eq!(store.get(3), None);
        assert_eq!(store.basic_count(), 1);
    }

    #[test]
    fn dense_store_contains_get_set_remove() {
        exercise(FlowStore::new(6, false));
    }

    #[test]
    fn sparse_store_contains_get_set_remove() {
        exercise(FlowStore::new(6, true));
    }

    #[test]
    fn iter_visits_exactly_the_present_arcs() {
        for sparse in [false, true] {
            let mut store = FlowStore::new(4, sparse);
            store.set(1, 1.0);
            store.set(2, 4.0);
            let mut seen: Vec<(usize, f64)> = store.iter().collect();
            seen.sort_by_key(|(c, _)| *c);
            assert_eq!(seen, vec![(1, 1.0), (2, 4.0)]);
        }
    }
}
