//! Stepping-stone cycles.
//!
//! A cycle is the unique loop closed by a non-basic entering arc over the
//! basis tree. It is stored as the alternating sequence of arcs ("stones")
//! starting with the entering arc, which by convention carries sign `+`;
//! signs then alternate `+, −, +, −, …` along the sequence. The sequence
//! length is even and at least 4.
//!
//! Orientation matters for the bi-directional step of the multi-pivot round:
//! the *forward* orientation increases flow on the entering arc, the
//! *reverse* orientation swaps the sign assignment.

use crate::config::Epsilons;
use crate::flow::FlowStore;

// -------------------------------------------------------------------------------------------------
// Main structs.

/// One arc of a cycle (or of a root path while searching for one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stone {
    pub i: usize,
    pub j: usize,
}

/// The closed stepping-stone loop for one entering arc.
#[derive(Debug, Clone)]
pub struct Cycle {
    stones: Vec<Stone>,
    n: usize,
}

// -------------------------------------------------------------------------------------------------
// Implementations.

impl Stone {
    pub fn new(i: usize, j: usize) -> Self {
        Stone { i, j }
    }
}

impl Cycle {
    pub(crate) fn new(stones: Vec<Stone>, n: usize) -> Self {
        Cycle { stones, n }
    }

    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    /// The entering arc sits at position 0.
    pub fn entering(&self) -> Stone {
        self.stones[0]
    }

    pub fn stones(&self) -> &[Stone] {
        &self.stones
    }

    fn index(&self, stone: &Stone) -> usize {
        self.n * stone.i + stone.j
    }

    /// The min-ratio flow delta θ: the smallest current flow over the
    /// negative-sign arcs of the chosen orientation.
    ///
    /// The walk runs over the stones in reverse, and a candidate only
    /// replaces the minimum when strictly smaller by more than ε, which
    /// makes the tie-break deterministic: among ties the arc encountered
    /// first in the reverse walk wins.
    pub fn min_ratio(&self, flows: &FlowStore, eps: f64, forward: bool) -> f64 {
        let mut min_q = f64::MAX;
        let mut plus = !forward;
        for stone in self.stones.iter().rev() {
            if !plus {
                if let Some(q) = flows.get(self.index(stone)) {
                    if min_q > q + eps {
                        min_q = q;
                    }
                }
            }
            plus = !plus;
        }
        min_q
    }

    /// Objective delta of shipping `theta` around the cycle in the given
    /// orientation; negative means an improvement. Does not touch the flows.
    pub fn improvement(&self, costs: &[f64], theta: f64, forward: bool) -> f64 {
        let mut delta = 0.0;
        let mut plus = !forward;
        for stone in self.stones.iter().rev() {
            let c = costs[self.index(stone)];
            if plus {
                delta += theta * c;
            } else {
                delta -= theta * c;
            }
            plus = !plus;
        }
        delta
    }

    /// Ship `theta` around the cycle: add on `+` arcs, subtract on `−` arcs.
    ///
    /// An arc whose flow drops within ε of zero leaves the basis. When
    /// several `(−)` arcs tie at θ only the first (in reverse-walk order)
    /// actually leaves and is reported through `exited`; the others are kept
    /// at the sentinel `ε_q` to preserve basis cardinality. With
    /// `remove_leaving` unset the leaving arc is parked at flow `0.0`
    /// instead of being dropped from the store, which is what the
    /// multi-pivot first pass wants: the tree update is deferred to the
    /// second pass.
    ///
    /// `+` arcs rising from an ε-level flow are reported through `unzeroed`.
    /// Returns the number of arcs that hit zero.
    pub fn move_flow(
        &self,
        theta: f64,
        flows: &mut FlowStore,
        eps: &Epsilons,
        remove_leaving: bool,
        forward: bool,
        exited: &mut Vec<Stone>,
        unzeroed: &mut Vec<Stone>,
    ) -> usize {
        let mut zeroed = 0usize;
        let mut plus = !forward;
        for stone in self.stones.iter().rev() {
            let c = self.index(stone);
            let current = flows.get(c);
            if plus {
                match current {
                    Some(q) => {
                        flows.set(c, q + theta);
                        if !(q > eps.eps) {
                            unzeroed.push(*stone);
                        }
                    }
                    None => flows.set(c, theta),
                }
            } else {
                debug_assert!(current.is_some(), "negative-sign arc must be basic");
                let q = current.unwrap_or(f64::MAX);
                if q > theta + eps.eps {
                    flows.set(c, q - theta);
                } else {
                    if remove_leaving {
                        flows.remove(c);
                    } else {
                        flows.set(c, 0.0);
                    }
                    zeroed += 1;
                    if zeroed > 1 {
                        flows.set(c, eps.eps_q);
                    } else {
                        exited.push(*stone);
                    }
                }
            }
            plus = !plus;
        }
        zeroed
    }
}

// -------------------------------------------------------------------------------------------------
// Unit tests.
