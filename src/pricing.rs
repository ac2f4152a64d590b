//! Reduced-cost pricing.
//!
//! Four interchangeable policies select the entering arcs from the
//! non-basic cells with negative reduced cost `rc[i,j] = c[i,j] − u[i] −
//! v[j]`. They share one outcome shape: the entering candidates sorted by
//! non-increasing `−rc` (most negative first), a `refreshed` flag set when
//! the policy recomputed its working set (that is what the driver counts as
//! a macro-iteration), and a `full_scan` flag set when the scan covered the
//! whole list — an empty result on a full scan is the optimality witness.
//!
//! The policy is picked once at solver construction and dispatched through
//! the [crate::config::PricingPolicy] tag; pricing cost is dominated by the
//! reduced-cost arithmetic, not the dispatch.

use log::info;

use crate::config::Epsilons;
use crate::flow::FlowStore;
use crate::heuristics::ArcList;
use crate::instance::TpInstance;
use crate::shielding::{self, Grid};
use crate::spanning_tree::{SpanningTree, TreeError};

// -------------------------------------------------------------------------------------------------
// Main structs.

/// A priced cell: position, unit cost, reduced cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub i: usize,
    pub j: usize,
    pub cost: f64,
    pub rc: f64,
}

/// What one pricing call hands back to the driver.
#[derive(Debug, Clone, Default)]
pub struct PricingOutcome {
    /// Entering arcs, most negative reduced cost first. Empty means no
    /// entering arc was found by this call.
    pub entering: Vec<Candidate>,
    /// The policy rebuilt its working set (short-list or neighbourhood).
    pub refreshed: bool,
    /// The scan covered the whole candidate universe of the policy.
    pub full_scan: bool,
}

/// Working state of the shielding policy, owned by the driver across
/// macro-iterations. An empty grid table means "not generated yet".
#[derive(Debug, Clone, Default)]
pub struct ShieldingData {
    pub grid: Grid,
    pub supp: Vec<Vec<usize>>,
    pub neighborhood: Vec<Candidate>,
    /// Macro-iterations since the last neighbourhood refresh.
    pub h: u64,
}

// -------------------------------------------------------------------------------------------------
// Implementations.

impl Candidate {
    pub fn new(i: usize, j: usize, cost: f64, rc: f64) -> Self {
        Candidate { i, j, cost, rc }
    }
}

/// Sort entering candidates by non-increasing `−rc`.
pub fn sort_by_most_negative(candidates: &mut [Candidate]) {
    candidates.sort_unstable_by(|a, b| a.rc.total_cmp(&b.rc));
}

/// P0 — Dantzig: scan all non-basic arcs, take the single most negative.
pub(crate) fn dantzig(
    instance: &TpInstance,
    us: &[f64],
    vs: &[f64],
    eps: &Epsilons,
) -> PricingOutcome {
    let n = instance.n;
    let mut best: Option<Candidate> = None;
    for i in 0..instance.m {
        for j in 0..n {
            let rc = instance.costs[n * i + j] - us[i] - vs[j];
            if rc < -eps.eps && best.map_or(true, |b| rc + eps.eps < b.rc) {
                best = Some(Candidate::new(i, j, instance.costs[n * i + j], rc));
            }
        }
    }
    PricingOutcome {
        entering: best.into_iter().collect(),
        refreshed: true,
        full_scan: true,
    }
}

/// P1 — first negative: scan in fixed row-major order, stop at the first
/// arc priced below `−ε`.
pub(crate) fn first_negative(
    instance: &TpInstance,
    us: &[f64],
    vs: &[f64],
    eps: &Epsilons,
) -> PricingOutcome {
    let n = instance.n;
    let mut entering = Vec::new();
    'scan: for i in 0..instance.m {
        for j in 0..n {
            let rc = instance.costs[n * i + j] - us[i] - vs[j];
            if rc < -eps.eps {
                entering.push(Candidate::new(i, j, instance.costs[n * i + j], rc));
                break 'scan;
            }
        }
    }
    let full_scan = entering.is_empty();
    PricingOutcome {
        entering,
        refreshed: true,
        full_scan,
    }
}

/// P3 — windowed short-list over the clustered arc list.
///
/// A non-empty short-list is re-priced first (single-pivot mode): stale
/// entries are dropped, the first still-negative arc enters. When the
/// short-list runs dry the next window of `window_len` arcs is scanned from
/// the front of the clustered list, doubling (or, lazily, jumping to the
/// full list) while it comes back empty. Exhausting the list with an empty
/// short-list completes a full scan.
#[allow(clippy::too_many_arguments)]
pub(crate) fn windowed(
    instance: &TpInstance,
    arcs: &ArcList,
    shortlist: &mut Vec<Candidate>,
    window_len: usize,
    lazy_growth: bool,
    multi_pivot: bool,
    us: &[f64],
    vs: &[f64],
    eps: &Epsilons,
) -> PricingOutcome {
    let n = instance.n;
    let mut entering = Vec::new();

    if !multi_pivot && !shortlist.is_empty() {
        while let Some(c) = shortlist.pop() {
            let rc = instance.costs[n * c.i + c.j] - us[c.i] - vs[c.j];
            if rc < -eps.eps {
                entering.push(Candidate::new(c.i, c.j, c.cost, rc));
                break;
            }
        }
        if !entering.is_empty() {
            return PricingOutcome {
                entering,
                refreshed: false,
                full_scan: false,
            };
        }
    }

    // Rebuild the short-list from the clustered list.
    shortlist.clear();
    let mut lim = window_len.min(arcs.len());
    let mut u = 0usize;
    loop {
        while u < lim {
            let rc = arcs.cs[u] - us[arcs.is[u]] - vs[arcs.js[u]];
            if rc < -eps.eps {
                shortlist.push(Candidate::new(arcs.is[u], arcs.js[u], arcs.cs[u], rc));
            }
            u += 1;
        }
        if shortlist.is_empty() && lim < arcs.len() {
            lim = if lazy_growth {
                arcs.len()
            } else {
                (lim * 2).min(arcs.len())
            };
        } else {
            break;
        }
    }
    let full_scan = u >= arcs.len();

    if !shortlist.is_empty() {
        if multi_pivot {
            entering = std::mem::take(shortlist);
            sort_by_most_negative(&mut entering);
        } else {
            // Serve the cheapest-cluster arc first; the rest stays listed
            // for the next calls.
            shortlist.reverse();
            if let Some(c) = shortlist.pop() {
                entering.push(c);
            }
        }
    }

    PricingOutcome {
        entering,
        refreshed: true,
        full_scan,
    }
}

/// P4 — shielding: price only the geometric neighbourhood of the current
/// basic support, refreshing it every `refresh_cap` macro-iterations or
/// when it runs dry. Optimality needs an empty result right after a
/// refresh.
///
/// Every negative-rc neighbour is returned, sorted most negative first,
/// whether or not multi-pivot is active; in single-pivot mode the driver
/// simply pivots through the list one arc at a time.
#[allow(clippy::too_many_arguments)]
pub(crate) fn shielding(
    instance: &TpInstance,
    tree: &SpanningTree,
    flows: &FlowStore,
    data: &mut ShieldingData,
    refresh_cap: u64,
    us: &[f64],
    vs: &[f64],
    eps: &Epsilons,
) -> Result<PricingOutcome, TreeError> {
    let m = instance.m;
    let n = instance.n;

    if data.grid.table.is_empty() {
        let g = (m as f64).sqrt().ceil() as usize;
        info!("Init shielding grid, {}x{} over {} sources", g, g, m);
        data.grid = shielding::square_grid(m, g);
        data.h = 0;
    }

    let mut entering: Vec<Candidate> = Vec::new();
    let mut refreshed = false;
    let mut optimal = false;
    let mut pass = 0u32;
    loop {
        let due = data.h > refresh_cap;
        data.h += 1;
        if due || data.neighborhood.is_empty() || (pass > 0 && entering.is_empty()) {
            data.supp = tree.shielding_support(flows, eps.eps_q + eps.eps)?;
            data.neighborhood = shielding::compute_shields(
                &instance.costs,
                m,
                n,
                &data.grid,
                &data.supp,
                &instance.supplies,
                &instance.demands,
                eps.eps_q + eps.eps,
            );
            refreshed = true;
            data.h = 0;
        }

        for c in &data.neighborhood {
            let rc = instance.costs[n * c.i + c.j] - us[c.i] - vs[c.j];
            if rc < -eps.eps {
                entering.push(Candidate::new(c.i, c.j, c.cost, rc));
            }
        }

        if entering.is_empty() && refreshed {
            optimal = true;
        }
        pass += 1;
        if !entering.is_empty() || optimal {
            break;
        }
    }

    sort_by_most_negative(&mut entering);

    Ok(PricingOutcome {
        entering,
        refreshed,
        full_scan: optimal,
    })
}

// -------------------------------------------------------------------------------------------------
// Unit tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CycleStrategy, DEFAULT_EPS};
    use crate::heuristics;
    use crate::spanning_tree::Stone;
    use std::str::FromStr;

    /// The 2x2 scenario instance: optimum ships over (0,1), (1,0), (1,1).
    fn instance_2x2() -> TpInstance {
        TpInstance::from_str("2 2 0\n10 20\n15 15\n4 1\n2 3\n").unwrap()
    }

    fn epsilons(inst: &TpInstance) -> Epsilons {
        Epsilons::derive(DEFAULT_EPS, inst.m, inst.n).unwrap()
    }

    /// Multipliers of the north-west corner basis of [instance_2x2]:
    /// basis (0,0), (1,0), (1,1); v1 = 0 anchors the system.
    fn nwc_duals() -> (Vec<f64>, Vec<f64>) {
        // u1 = c11 = 3, v0 = c10 - u1 = -1, u0 = c00 - v0 = 5.
        (vec![5.0, 3.0], vec![-1.0, 0.0])
    }

    #[test]
    fn dantzig_takes_the_most_negative_arc() {
        let inst = instance_2x2();
        let eps = epsilons(&inst);
        let (us, vs) = nwc_duals();

        let outcome = dantzig(&inst, &us, &vs, &eps);
        assert!(outcome.refreshed && outcome.full_scan);
        assert_eq!(outcome.entering.len(), 1);
        // rc(0,1) = 1 - 5 - 0 = -4, the only negative arc.
        let c = outcome.entering[0];
        assert_eq!((c.i, c.j), (0, 1));
        assert_eq!(c.rc, -4.0);
    }

    #[test]
    fn first_negative_stops_at_the_first_hit() {
        let inst = instance_2x2();
        let eps = epsilons(&inst);
        let (us, vs) = nwc_duals();

        let outcome = first_negative(&inst, &us, &vs, &eps);
        assert_eq!(outcome.entering.len(), 1);
        assert_eq!((outcome.entering[0].i, outcome.entering[0].j), (0, 1));
        assert!(!outcome.full_scan, "a hit short-circuits the scan");
    }

    #[test]
    fn pricing_at_optimum_reports_a_clean_full_scan() {
        let inst = instance_2x2();
        let eps = epsilons(&inst);
        // Duals of the optimal basis (0,1), (1,0), (1,1): v1=0, u1=3,
        // v0=-1, u0=1. All reduced costs are then non-negative.
        let us = vec![1.0, 3.0];
        let vs = vec![-1.0, 0.0];

        let outcome = dantzig(&inst, &us, &vs, &eps);
        assert!(outcome.entering.is_empty());
        assert!(outcome.full_scan);

        let outcome = first_negative(&inst, &us, &vs, &eps);
        assert!(outcome.entering.is_empty());
        assert!(outcome.full_scan, "an empty scan must report completion");
    }

    #[test]
    fn windowed_rebuilds_then_serves_from_the_shortlist() {
        let inst = instance_2x2();
        let eps = epsilons(&inst);
        let (us, vs) = nwc_duals();
        let arcs = heuristics::cluster_arcs(&inst, 0.0, false, DEFAULT_EPS);
        let mut shortlist = Vec::new();

        let outcome = windowed(
            &inst, &arcs, &mut shortlist, 2, false, false, &us, &vs, &eps,
        );
        assert!(outcome.refreshed, "first call rebuilds the short-list");
        assert_eq!(outcome.entering.len(), 1);
        assert_eq!((outcome.entering[0].i, outcome.entering[0].j), (0, 1));
    }

    #[test]
    fn windowed_grows_an_empty_window() {
        let inst = instance_2x2();
        let eps = epsilons(&inst);
        let (us, vs) = nwc_duals();
        // Sorted arc order: (0,1) rc<0 sits first, so shrink the window to
        // force growth over arcs priced non-negative first.
        let arcs = ArcList {
            cs: vec![4.0, 2.0, 3.0, 1.0],
            is: vec![0, 1, 1, 0],
            js: vec![0, 0, 1, 1],
        };
        let mut shortlist = Vec::new();

        let outcome = windowed(
            &inst, &arcs, &mut shortlist, 1, false, false, &us, &vs, &eps,
        );
        assert_eq!(outcome.entering.len(), 1);
        assert_eq!(
            (outcome.entering[0].i, outcome.entering[0].j),
            (0, 1),
            "window must double until it reaches the negative arc"
        );
        assert!(outcome.full_scan);
    }

    #[test]
    fn windowed_multi_pivot_returns_all_negatives_sorted() {
        let inst = instance_2x2();
        let eps = epsilons(&inst);
        // Force two negative arcs with artificial duals.
        let us = vec![5.0, 5.0];
        let vs = vec![0.0, 0.0];
        let arcs = heuristics::cluster_arcs(&inst, 0.0, false, DEFAULT_EPS);
        let mut shortlist = Vec::new();

        let outcome = windowed(
            &inst, &arcs, &mut shortlist, 4, false, true, &us, &vs, &eps,
        );
        assert!(outcome.entering.len() >= 2);
        assert!(
            outcome
                .entering
                .windows(2)
                .all(|w| w[0].rc <= w[1].rc),
            "most negative reduced cost first"
        );
        assert!(shortlist.is_empty(), "multi-pivot consumes the short-list");
    }

    #[test]
    fn shielding_finds_the_improving_arc_of_the_nwc_basis() {
        let inst = instance_2x2();
        let eps = epsilons(&inst);
        let (us, vs) = nwc_duals();

        // Build the NWC basis and its tree.
        let mut flows = FlowStore::new(4, false);
        let mut rows = vec![Vec::new(); 2];
        let mut cols = vec![Vec::new(); 2];
        heuristics::north_west_corner(&inst, &mut flows, &mut rows, &mut cols, &eps);
        let mut tree = SpanningTree::new(3, 4, 2).unwrap();
        tree.build(&rows, &cols).unwrap();

        let mut data = ShieldingData::default();
        let outcome = shielding(&inst, &tree, &flows, &mut data, 10, &us, &vs, &eps).unwrap();

        assert!(outcome.refreshed);
        assert_eq!(outcome.entering.len(), 1);
        assert_eq!((outcome.entering[0].i, outcome.entering[0].j), (0, 1));

        // Sanity: the improving arc indeed closes a cycle.
        tree.find_cycle(Stone::new(0, 1), CycleStrategy::TwoSidedApex)
            .unwrap();
    }

    #[test]
    fn shielding_returns_every_negative_candidate_untruncated() {
        // NWC basis (0,0), (1,0), (1,1), (2,1), (2,2); its duals price
        // exactly two non-basic arcs negative: (1,2) at -4 and (0,1) at -1.
        let inst =
            TpInstance::from_str("3 3 0\n5 5 5\n5 5 5\n1 1 9\n4 5 2\n9 8 9\n").unwrap();
        let eps = Epsilons::derive(DEFAULT_EPS, 3, 3).unwrap();
        let mut flows = FlowStore::new(9, false);
        let mut rows = vec![Vec::new(); 3];
        let mut cols = vec![Vec::new(); 3];
        heuristics::north_west_corner(&inst, &mut flows, &mut rows, &mut cols, &eps);
        let mut tree = SpanningTree::new(5, 6, 3).unwrap();
        tree.build(&rows, &cols).unwrap();

        let mut us = vec![f64::NAN; 3];
        let mut vs = vec![f64::NAN; 3];
        tree.propagate_multipliers(&inst.costs, &mut us, &mut vs, None)
            .unwrap();

        let mut data = ShieldingData::default();
        let outcome = shielding(&inst, &tree, &flows, &mut data, 10, &us, &vs, &eps).unwrap();

        // The whole negative set comes back, most negative first; the
        // driver pivots through it one arc at a time when multi-pivot is
        // off.
        assert_eq!(outcome.entering.len(), 2);
        assert_eq!((outcome.entering[0].i, outcome.entering[0].j), (1, 2));
        assert_eq!((outcome.entering[1].i, outcome.entering[1].j), (0, 1));
        assert!(outcome.entering[0].rc <= outcome.entering[1].rc);
    }

    #[test]
    fn shielding_optimality_needs_a_fresh_neighbourhood() {
        let inst = instance_2x2();
        let eps = epsilons(&inst);
        // Optimal duals: nothing prices negative.
        let us = vec![1.0, 3.0];
        let vs = vec![-1.0, 0.0];

        let mut flows = FlowStore::new(4, false);
        let mut rows = vec![Vec::new(); 2];
        let mut cols = vec![Vec::new(); 2];
        heuristics::north_west_corner(&inst, &mut flows, &mut rows, &mut cols, &eps);
        let mut tree = SpanningTree::new(3, 4, 2).unwrap();
        tree.build(&rows, &cols).unwrap();

        let mut data = ShieldingData::default();
        // Seed a stale neighbourhood so the policy must refresh before it
        // may declare optimality.
        data.neighborhood = vec![Candidate::new(0, 0, 4.0, 0.0)];
        data.h = 0;

        let outcome = shielding(&inst, &tree, &flows, &mut data, 10, &us, &vs, &eps).unwrap();
        assert!(outcome.entering.is_empty());
        assert!(outcome.refreshed, "optimality must follow a refresh");
        assert!(outcome.full_scan);
    }
}
