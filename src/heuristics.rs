//! Initial-basis constructors.
//!
//! Both constructors place exactly `m+n−1` basic cells: every placement
//! deactivates exactly one node, degenerate placements are stored at the
//! sentinel flow `ε_q`, and on simultaneous exhaustion the side with more
//! remaining nodes keeps its node active. The resulting cells span the
//! bipartite node set and feed the tree builder directly.
//!
//! The matrix-minimum rule wants the arcs in non-decreasing cost order.
//! Sorting all `m·n` of them is wasteful on large dense instances, so
//! [cluster_arcs] buckets them by cost instead: `L = mn/(α·(m+n))` buckets
//! filled in one linear scan, which is enough order for the rule (and for
//! the windowed pricing policy scanning the same list). `α < ε` requests
//! the exact sort.

use std::time::Instant;

use log::info;
use logging_timer::stime;

use crate::config::Epsilons;
use crate::flow::FlowStore;
use crate::instance::TpInstance;

// -------------------------------------------------------------------------------------------------
// Main structs.

/// The problem arcs laid out in (approximately) non-decreasing cost order.
#[derive(Debug, Clone)]
pub struct ArcList {
    pub cs: Vec<f64>,
    pub is: Vec<usize>,
    pub js: Vec<usize>,
}

/// What an initial-basis run reports back to the driver.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicOutcome {
    pub tag: &'static str,
    pub objective: f64,
    pub shipped: f64,
    /// Basic cells placed; a valid basis has `m+n−1`.
    pub placed: usize,
    pub run_ms: f64,
}

// -------------------------------------------------------------------------------------------------
// Cost clustering.

impl ArcList {
    pub fn len(&self) -> usize {
        self.cs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cs.is_empty()
    }
}

/// Arrange all arcs by cost: exact sort when `partition_factor < eps`,
/// otherwise a bucket partition (eager `L`-way, or a lazy two-way split
/// with the cheap half sorted).
#[stime("info")]
pub fn cluster_arcs(
    instance: &TpInstance,
    partition_factor: f64,
    lazy: bool,
    eps: f64,
) -> ArcList {
    let m = instance.m;
    let n = instance.n;
    let count = instance.arc_count();
    let mut pvars: Vec<(usize, f64)> = instance.costs.iter().copied().enumerate().collect();

    let ordered: Vec<(usize, f64)> = if partition_factor < eps {
        pvars.sort_unstable_by(|a, b| a.1.total_cmp(&b.1));
        pvars
    } else {
        let buckets = ((m * n) as f64 / (partition_factor * (m + n) as f64)).max(1.0) as usize;
        let minc = instance.min_cost;
        let maxc = instance.max_cost;
        if lazy {
            // Two-way split at the first bucket boundary; only the cheap
            // side gets sorted.
            let ct = (minc.min(1.0) + maxc - minc) / (buckets as f64 - 1.0) + minc + minc.min(1.0);
            let (mut cheap, expensive): (Vec<_>, Vec<_>) =
                pvars.into_iter().partition(|(_, c)| c + eps < ct);
            info!(
                "Lazy clustering: cost threshold {}, sizes {} / {}",
                ct,
                cheap.len(),
                expensive.len()
            );
            cheap.sort_unstable_by(|a, b| a.1.total_cmp(&b.1));
            cheap.extend(expensive);
            cheap
        } else {
            let span = 1.0 + maxc - minc;
            let mut partitions: Vec<Vec<(usize, f64)>> = vec![Vec::new(); buckets];
            for (c, cost) in pvars {
                let slot = ((1.0 + cost - minc) / span * (buckets - 1) as f64) as usize;
                partitions[slot.min(buckets - 1)].push((c, cost));
            }
            partitions.into_iter().flatten().collect()
        }
    };

    let mut list = ArcList {
        cs: Vec::with_capacity(count),
        is: Vec::with_capacity(count),
        js: Vec::with_capacity(count),
    };
    for (c, cost) in ordered {
        list.cs.push(cost);
        list.is.push(c / n);
        list.js.push(c % n);
    }
    list
}

// -------------------------------------------------------------------------------------------------
// North-west corner.

/// Greedy walk from cell `(0,0)`: ship the bottleneck, then step right or
/// down toward the exhausted side.
#[stime("info")]
pub fn north_west_corner(
    instance: &TpInstance,
    flows: &mut FlowStore,
    rows: &mut [Vec<usize>],
    cols: &mut [Vec<usize>],
    eps: &Epsilons,
) -> HeuristicOutcome {
    let start = Instant::now();
    let m = instance.m;
    let n = instance.n;
    let mut at_src = instance.supplies.clone();
    let mut at_dst = instance.demands.clone();
    let mut active = vec![true; m + n];

    let mut srcs_done = 0usize;
    let mut dsts_done = 0usize;
    let (mut i, mut j) = (0usize, 0usize);
    let mut placed = 0usize;
    let mut tot_cost = 0.0;
    let mut tot_q = 0.0;

    loop {
        // Walking off the matrix means the instance needed the zero-row/
        // column preprocessing; stop short and let the caller reject the
        // incomplete basis.
        if i >= m || j >= n {
            break;
        }

        let q = at_src[i].min(at_dst[j]);
        at_src[i] -= q;
        at_dst[j] -= q;
        tot_q += q;
        tot_cost += instance.cost(i, j) * q;

        flows.set(i * n + j, if q > eps.eps { q } else { eps.eps_q });
        rows[i].push(j);
        cols[j].push(i);

        if at_src[i].round() < eps.eps && at_dst[j].round() < eps.eps {
            active[if dsts_done > srcs_done { i } else { m + j }] = false;
        } else {
            active[if at_src[i].round() < eps.eps { i } else { m + j }] = false;
        }
        if active[i] {
            dsts_done += 1;
            j += 1;
        } else {
            srcs_done += 1;
            i += 1;
        }

        placed += 1;
        if placed >= m + n - 1 {
            break;
        }
    }

    let outcome = HeuristicOutcome {
        tag: "NWC",
        objective: tot_cost,
        shipped: tot_q,
        placed,
        run_ms: start.elapsed().as_secs_f64() * 1000.0,
    };
    info!(
        "North-west corner (NWC) t cost = {:.1}, shipped q = {:.0}, {} cells",
        outcome.objective, outcome.shipped, outcome.placed
    );
    outcome
}

// -------------------------------------------------------------------------------------------------
// Matrix minimum rule.

/// Scan the clustered arc list in order; ship the bottleneck on every cell
/// whose row and column are both still active.
#[stime("info")]
pub fn matrix_min_rule(
    instance: &TpInstance,
    arcs: &ArcList,
    flows: &mut FlowStore,
    rows: &mut [Vec<usize>],
    cols: &mut [Vec<usize>],
    eps: &Epsilons,
) -> HeuristicOutcome {
    let start = Instant::now();
    let m = instance.m;
    let n = instance.n;
    let mut at_src = instance.supplies.clone();
    let mut at_dst = instance.demands.clone();
    let mut active = vec![true; m + n];

    let mut rows_done = 0usize;
    let mut cols_done = 0usize;
    let mut placed = 0usize;
    let mut tot_cost = 0.0;
    let mut tot_q = 0.0;

    let mut c = 0usize;
    while c < arcs.len() && placed < m + n - 1 {
        let i = arcs.is[c];
        let j = arcs.js[c];
        c += 1;
        if !(active[i] && active[m + j]) {
            continue;
        }

        let q = at_src[i].min(at_dst[j]);
        at_src[i] -= q;
        at_dst[j] -= q;
        tot_q += q;
        tot_cost += instance.cost(i, j) * q;

        flows.set(i * n + j, if q > eps.eps { q } else { eps.eps_q });
        rows[i].push(j);
        cols[j].push(i);

        if at_src[i].round() < eps.eps && at_dst[j].round() < eps.eps {
            active[if cols_done > rows_done { i } else { m + j }] = false;
        } else {
            active[if at_src[i].round() < eps.eps { i } else { m + j }] = false;
        }
        if active[i] {
            cols_done += 1;
        } else {
            rows_done += 1;
        }
        placed += 1;
    }

    let outcome = HeuristicOutcome {
        tag: "MMR",
        objective: tot_cost,
        shipped: tot_q,
        placed,
        run_ms: start.elapsed().as_secs_f64() * 1000.0,
    };
    info!(
        "Matrix minimum rule (MMR) t cost = {:.1}, shipped q = {:.0}, {} cells",
        outcome.objective, outcome.shipped, outcome.placed
    );
    outcome
}

// -------------------------------------------------------------------------------------------------
// Unit tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EPS;
    use crate::instance::GenerateParams;
    use crate::spanning_tree::SpanningTree;
    use std::str::FromStr;

    fn instance_3x3() -> TpInstance {
        TpInstance::from_str("3 3 0\n5 5 5\n5 5 5\n1 2 3\n4 5 6\n7 8 9\n").unwrap()
    }

    fn epsilons(inst: &TpInstance) -> Epsilons {
        Epsilons::derive(DEFAULT_EPS, inst.m, inst.n).unwrap()
    }

    fn run_nwc(inst: &TpInstance) -> (HeuristicOutcome, FlowStore, Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let eps = epsilons(inst);
        let mut flows = FlowStore::new(inst.arc_count(), false);
        let mut rows = vec![Vec::new(); inst.m];
        let mut cols = vec![Vec::new(); inst.n];
        let out = north_west_corner(inst, &mut flows, &mut rows, &mut cols, &eps);
        (out, flows, rows, cols)
    }

    #[test]
    fn nw_corner_places_the_expected_degenerate_basis() {
        let inst = instance_3x3();
        let eps = epsilons(&inst);
        let (out, flows, _, _) = run_nwc(&inst);

        assert_eq!(out.placed, 5);
        assert_eq!(out.objective, 1.0 * 5.0 + 5.0 * 5.0 + 9.0 * 5.0);
        assert_eq!(flows.get(0), Some(5.0)); // (0,0)
        assert_eq!(flows.get(3), Some(eps.eps_q)); // (1,0) degenerate
        assert_eq!(flows.get(4), Some(5.0)); // (1,1)
        assert_eq!(flows.get(7), Some(eps.eps_q)); // (2,1) degenerate
        assert_eq!(flows.get(8), Some(5.0)); // (2,2)
        assert_eq!(flows.basic_count(), 5);
    }

    #[test]
    fn nw_corner_basis_spans_the_tree() {
        let inst = instance_3x3();
        let (_, _, rows, cols) = run_nwc(&inst);
        let mut tree = SpanningTree::new(5, 6, 3).unwrap();
        tree.build(&rows, &cols).unwrap();
        assert_eq!(tree.detached_count(), 0);
    }

    #[test]
    fn nw_corner_handles_single_row() {
        let inst = TpInstance::from_str("1 3 0\n30\n10 10 10\n5 6 7\n").unwrap();
        let (out, flows, _, _) = run_nwc(&inst);
        assert_eq!(out.placed, 3);
        assert_eq!(flows.get(0), Some(10.0));
        assert_eq!(flows.get(1), Some(10.0));
        assert_eq!(flows.get(2), Some(10.0));
    }

    #[test]
    fn exact_sort_orders_arcs_by_cost() {
        let inst = instance_3x3();
        let arcs = cluster_arcs(&inst, 0.0, false, DEFAULT_EPS);
        assert_eq!(arcs.len(), 9);
        assert!(arcs.cs.windows(2).all(|w| w[0] <= w[1]));
        // (0,0) carries the global minimum cost.
        assert_eq!((arcs.is[0], arcs.js[0]), (0, 0));
    }

    #[test]
    fn bucket_partition_keeps_cheap_arcs_in_front() {
        let inst = TpInstance::generate(GenerateParams {
            m: 12,
            n: 12,
            min_quantity: 1,
            max_quantity: 30,
            min_cost: 1,
            max_cost: 500,
            seed: 11,
        })
        .unwrap();
        for lazy in [false, true] {
            let arcs = cluster_arcs(&inst, 0.25, lazy, DEFAULT_EPS);
            assert_eq!(arcs.len(), inst.arc_count());
            let cheapest = arcs.cs[0];
            assert!(
                cheapest <= inst.min_cost + (inst.max_cost - inst.min_cost) / 2.0,
                "a cheap arc must lead the clustered list"
            );
        }
    }

    #[test]
    fn mmr_on_sorted_arcs_beats_or_matches_nw_corner() {
        let inst = instance_3x3();
        let eps = epsilons(&inst);
        let (nwc, ..) = run_nwc(&inst);

        let arcs = cluster_arcs(&inst, 0.0, false, DEFAULT_EPS);
        let mut flows = FlowStore::new(inst.arc_count(), false);
        let mut rows = vec![Vec::new(); inst.m];
        let mut cols = vec![Vec::new(); inst.n];
        let mmr = matrix_min_rule(&inst, &arcs, &mut flows, &mut rows, &mut cols, &eps);

        assert_eq!(mmr.placed, 5);
        assert!(mmr.objective <= nwc.objective);

        let mut tree = SpanningTree::new(5, 6, 3).unwrap();
        tree.build(&rows, &cols).unwrap();
        assert_eq!(tree.detached_count(), 0);
    }

    #[test]
    fn mmr_produces_a_spanning_basis_on_random_instances() {
        for seed in [1u64, 2, 3] {
            let inst = TpInstance::generate(GenerateParams {
                m: 9,
                n: 14,
                min_quantity: 1,
                max_quantity: 40,
                min_cost: 1,
                max_cost: 60,
                seed,
            })
            .unwrap();
            let eps = epsilons(&inst);
            let arcs = cluster_arcs(&inst, 0.25, false, DEFAULT_EPS);
            let mut flows = FlowStore::new(inst.arc_count(), false);
            let mut rows = vec![Vec::new(); inst.m];
            let mut cols = vec![Vec::new(); inst.n];
            let out = matrix_min_rule(&inst, &arcs, &mut flows, &mut rows, &mut cols, &eps);

            assert_eq!(out.placed, inst.node_count() - 1, "seed {}", seed);
            assert_eq!(flows.basic_count(), inst.node_count() - 1);

            let mut tree =
                SpanningTree::new(inst.node_count() - 1, inst.node_count(), inst.m).unwrap();
            tree.build(&rows, &cols).unwrap();
            assert_eq!(tree.detached_count(), 0, "seed {}", seed);

            // Flow conservation at every node.
            for i in 0..inst.m {
                let row_sum: f64 = (0..inst.n)
                    .filter_map(|j| flows.get(i * inst.n + j))
                    .sum();
                assert!(
                    (row_sum - inst.supplies[i]).abs() <= eps.eps * inst.node_count() as f64 + 1e-6,
                    "supply {} violated",
                    i
                );
            }
        }
    }
}
