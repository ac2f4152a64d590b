//! The transportation simplex driver.
//!
//! One macro-iteration of the driver: propagate the dual multipliers from
//! the basis tree, price for entering arcs, pivot. The loop ends when
//! pricing comes back empty in its policy's full-scan sense (optimal), when
//! the wall clock passes the limit, or when the macro-iteration cap is hit;
//! the three outcomes surface as [TerminationStatus] values, never as
//! errors.
//!
//! Two pivoting paths share the loop. The single-pivot path applies one
//! entering arc per iteration and afterwards re-propagates multipliers only
//! below the dirty subroot of the pivot. The multi-pivot path takes the
//! whole candidate list at once: a first pass pivots every arc the tree
//! colour oracle accepts (moving flow only; the tree is structurally
//! untouched and freshly-zeroed arcs are parked at zero), then a second
//! pass re-prices each survivor in both cycle orientations, applies the
//! better move, and performs the deferred tree update. This second,
//! "inside-out", pass is what distinguishes the iterated inside-out
//! algorithm from a plain block-pivoting simplex.

use std::time::Instant;

use displaydoc::Display;
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{
    AlgMode, Algorithm, ConfigError, Epsilons, InitialBasis, PricingPolicy, SolverConfig,
};
use crate::flow::FlowStore;
use crate::heuristics::{self, ArcList};
use crate::instance::{InstanceError, TpInstance};
use crate::pricing::{self, Candidate, ShieldingData};
use crate::result::{Counters, SolveReport, TerminationStatus, Timings};
use crate::spanning_tree::{SpanningTree, Stone, TreeError};

const BUG: &str = "[Bug in pivoting]";

// -------------------------------------------------------------------------------------------------
// Main structs.

/// A solver instance owns the problem data and the decoded configuration;
/// construction validates both, [Solver::solve] runs the simplex.
#[derive(Debug)]
pub struct Solver {
    instance: TpInstance,
    config: SolverConfig,
    mode: AlgMode,
    eps: Epsilons,
}

/// Represents a solver failure; limits are not failures (see
/// [TerminationStatus]).
#[derive(Debug, Display, Error)]
pub enum SolverError {
    /// Configuration rejected: {0}
    Config(#[from] ConfigError),
    /// Instance rejected: {0}
    Instance(#[from] InstanceError),
    /// Basis tree failure: {0}
    Tree(#[from] TreeError),
    /// Initial heuristic placed {placed} basic arcs but the basis needs {needed}
    IncompleteBasis { placed: usize, needed: usize },
}

struct PivotOutcome {
    changes: u64,
    step1_ms: f64,
    step2_ms: f64,
}

fn ms(t: Instant) -> f64 {
    t.elapsed().as_secs_f64() * 1000.0
}

// -------------------------------------------------------------------------------------------------
// Implementations.

impl Solver {
    pub fn new(instance: TpInstance, config: SolverConfig) -> Result<Self, SolverError> {
        let mode = config.mode()?;
        let eps = Epsilons::derive(config.eps, instance.m, instance.n)?;
        if config.algorithm == Algorithm::Lp {
            warn!("LP algorithm requested; solving with the transportation simplex core");
        }
        Ok(Solver {
            instance,
            config,
            mode,
            eps,
        })
    }

    pub fn instance(&self) -> &TpInstance {
        &self.instance
    }

    /// Tag carried into the result record: `<algorithm>_<alg_mode>`.
    pub fn algorithm_tag(&self) -> String {
        format!("{}_{}", self.config.algorithm.tag(), self.config.alg_mode)
    }

    /// Run the transportation simplex to termination.
    pub fn solve(&mut self) -> Result<SolveReport, SolverError> {
        let t0 = Instant::now();
        let m = self.instance.m;
        let n = self.instance.n;
        let nodes = m + n;
        let mut counters = Counters::default();
        let mut timings = Timings::default();

        info!(
            "T. simplex mode: multi-pivot {}, colour oracle {} (greed {}), pricing {:?}, initial basis {:?}",
            self.mode.multi_pivot,
            self.mode.color_oracle,
            self.mode.greed_level,
            self.mode.pricing,
            self.mode.initial_basis
        );
        info!(
            "eps {:e} ::: eps_q {:e} ::: eps_rt {:e}",
            self.eps.eps, self.eps.eps_q, self.eps.eps_rt
        );

        // Clustered arc list, shared by the MMR heuristic and the windowed
        // pricing policy.
        let needs_arcs = self.mode.pricing == PricingPolicy::Windowed
            || self.mode.initial_basis == InitialBasis::MatrixMinimumRule;
        let arcs: ArcList = if needs_arcs {
            let t = Instant::now();
            let pf = self.config.clamped_partition_factor(m, n);
            let list = heuristics::cluster_arcs(
                &self.instance,
                pf,
                self.config.lazy_clustering,
                self.eps.eps,
            );
            timings.init_ms = ms(t);
            list
        } else {
            ArcList {
                cs: Vec::new(),
                is: Vec::new(),
                js: Vec::new(),
            }
        };

        // Initial basis.
        let t = Instant::now();
        let mut flows = FlowStore::new(m * n, self.config.sparse_flows);
        let mut rows = vec![Vec::new(); m];
        let mut cols = vec![Vec::new(); n];
        let heur = match self.mode.initial_basis {
            InitialBasis::NorthWestCorner => heuristics::north_west_corner(
                &self.instance,
                &mut flows,
                &mut rows,
                &mut cols,
                &self.eps,
            ),
            InitialBasis::MatrixMinimumRule => heuristics::matrix_min_rule(
                &self.instance,
                &arcs,
                &mut flows,
                &mut rows,
                &mut cols,
                &self.eps,
            ),
        };
        timings.heuristic_ms = ms(t);
        if heur.placed + 1 < nodes {
            return Err(SolverError::IncompleteBasis {
                placed: heur.placed,
                needed: nodes - 1,
            });
        }

        // Basis tree, rooted at the last column node.
        let mut tree = SpanningTree::new(nodes - 1, nodes, m)?;
        tree.build(&rows, &cols)?;
        let detached = tree.detached_count();
        if detached > 0 {
            return Err(SolverError::Tree(TreeError::InconsistentBasis(format!(
                "initial basis leaves {} nodes detached",
                detached
            ))));
        }

        let mut us = vec![f64::NAN; m];
        let mut vs = vec![f64::NAN; n];
        let mut shortlist: Vec<Candidate> = Vec::new();
        let mut shield = ShieldingData::default();
        let mut entering: Vec<Candidate> = Vec::new();
        let window_len = self.config.window_len(m, n);
        let refresh_cap = self.config.shield_refresh_cap();

        info!("Simplex iterations ...");
        let status = loop {
            // Dual multipliers; only the dirty subtree after a single pivot.
            let t = Instant::now();
            let subroot = self.dirty_subroot(&tree, &entering);
            tree.propagate_multipliers(&self.instance.costs, &mut us, &mut vs, subroot)?;
            timings.multipliers_ms += ms(t);

            // Pricing.
            let t = Instant::now();
            let outcome = match self.mode.pricing {
                PricingPolicy::Dantzig => pricing::dantzig(&self.instance, &us, &vs, &self.eps),
                PricingPolicy::FirstNegative => {
                    pricing::first_negative(&self.instance, &us, &vs, &self.eps)
                }
                PricingPolicy::Windowed => pricing::windowed(
                    &self.instance,
                    &arcs,
                    &mut shortlist,
                    window_len,
                    self.config.lazy_clustering,
                    self.mode.multi_pivot,
                    &us,
                    &vs,
                    &self.eps,
                ),
                PricingPolicy::Shielding => pricing::shielding(
                    &self.instance,
                    &tree,
                    &flows,
                    &mut shield,
                    refresh_cap,
                    &us,
                    &vs,
                    &self.eps,
                )?,
            };
            timings.pricing_ms += ms(t);

            if outcome.refreshed || self.mode.pricing == PricingPolicy::Shielding {
                counters.macro_iters += 1;
            }
            if outcome.refreshed && self.mode.pricing == PricingPolicy::Shielding {
                counters.shield_refreshes += 1;
            }
            if outcome.full_scan {
                counters.full_pricings += 1;
            }
            entering = outcome.entering;

            // Pivoting.
            if !entering.is_empty() {
                counters.tested_candidates += entering.len() as u64;
                let t = Instant::now();
                let pivot = self.pivoting(&mut tree, &mut flows, &mut entering)?;
                timings.pivot_ms += ms(t);
                timings.step1_ms += pivot.step1_ms;
                timings.step2_ms += pivot.step2_ms;
                counters.basis_changes += pivot.changes;
            }
            counters.iters += 1;
            debug!(
                "iter {} ::: candidates {} ::: basis changes {}",
                counters.iters,
                entering.len(),
                counters.basis_changes
            );

            // Exit checks, later conditions overriding earlier ones.
            let mut stop = None;
            if entering.is_empty() {
                stop = Some(TerminationStatus::Optimal);
            }
            if let Some(limit) = self.config.time_limit_secs {
                if limit + self.eps.eps < t0.elapsed().as_secs_f64() {
                    stop = Some(TerminationStatus::TimeLimit);
                }
            }
            if counters.iters >= self.config.max_macro_iters {
                stop = Some(TerminationStatus::IterationLimit);
            }
            if let Some(status) = stop {
                break status;
            }
        };
        info!("{}", status);

        // Recompute the objective from scratch with one tree walk.
        let (obj_value, shipped) = tree.objective(&self.instance.costs, &flows)?;
        timings.total_ms = ms(t0);

        let report = SolveReport {
            instance_tag: if self.instance.name.is_empty() {
                "instance".to_string()
            } else {
                self.instance.name.clone()
            },
            algorithm_tag: self.algorithm_tag(),
            status,
            root_lprlx: f64::NAN,
            root_time: f64::NAN,
            best_bound: f64::NAN,
            obj_value,
            opt_gap: f64::NAN,
            run_time: t0.elapsed().as_secs_f64(),
            initial_obj_value: heur.objective,
            counters,
            timings,
        };
        report.log_summary();
        info!("Total shipped quantity {:.0}", shipped);
        Ok(report)
    }

    /// After a single pivot, the subtree below the entering arc's parent
    /// endpoint is the only part with stale multipliers. When the entering
    /// arc touches the root the attach may just have re-rooted the tree, so
    /// the selection falls back to a full propagation.
    ///
    /// A longer candidate list means several pivots were applied this
    /// iteration (a multi-pivot round, or a policy handing the single-pivot
    /// loop more than one arc to walk through); no single subtree covers
    /// the stale region then, so the whole tree is re-propagated.
    fn dirty_subroot(&self, tree: &SpanningTree, entering: &[Candidate]) -> Option<usize> {
        match entering {
            [ev] => {
                let m = self.instance.m;
                if ev.i == tree.root() || m + ev.j == tree.root() {
                    return None;
                }
                if tree.parent_of(ev.i) == Some(m + ev.j) {
                    Some(m + ev.j)
                } else {
                    Some(ev.i)
                }
            }
            _ => None,
        }
    }

    /// Pivot the entering candidates.
    ///
    /// Single-pivot: find the cycle, move θ, swap the arcs in the tree.
    ///
    /// Multi-pivot step 1: for each candidate the colour oracle accepts,
    /// move θ around its cycle without touching the tree; merge the colours
    /// of arcs that regained flow, cut a fresh colour below the zeroed arc.
    /// Step 2: re-examine every survivor in both orientations, apply the
    /// better move when it wins by more than `ε_rt`, and only then swap the
    /// tree arcs.
    fn pivoting(
        &self,
        tree: &mut SpanningTree,
        flows: &mut FlowStore,
        entering: &mut [Candidate],
    ) -> Result<PivotOutcome, SolverError> {
        let m = self.instance.m;
        let n = self.instance.n;
        let is_multi = self.mode.multi_pivot && entering.len() > 1;

        let mut exited: Vec<Stone> = Vec::new();
        let mut zeroed_arcs: Vec<Stone> = Vec::new();
        let mut unzeroed: Vec<Stone> = Vec::new();
        let mut step1_changes = 0u64;

        let s1 = Instant::now();
        for idx in 0..entering.len() {
            let ev = entering[idx];

            if is_multi && self.mode.color_oracle {
                let safe = tree.check_arc((ev.i, m + ev.j), self.mode.greed_level)?;
                if !safe {
                    entering[idx].rc = f64::NAN;
                    continue;
                }
            }

            let cycle = tree.find_cycle(Stone::new(ev.i, ev.j), self.config.cycle_strategy)?;
            let theta = cycle.min_ratio(flows, self.eps.eps, true);
            unzeroed.clear();
            cycle.move_flow(
                theta,
                flows,
                &self.eps,
                !is_multi,
                true,
                if is_multi { &mut zeroed_arcs } else { &mut exited },
                &mut unzeroed,
            );

            if !is_multi {
                let leave = exited
                    .last()
                    .copied()
                    .unwrap_or_else(|| panic!("{} no arc left the basis", BUG));
                tree.swap_arc(
                    (leave.i, m + leave.j),
                    (ev.i, m + ev.j),
                    self.config.update_levels,
                )?;
            } else if self.mode.color_oracle {
                if self.mode.greed_level < 2 {
                    for s in &unzeroed {
                        tree.merge_subtree((s.i, m + s.j))?;
                    }
                }
                let zero = zeroed_arcs
                    .last()
                    .copied()
                    .unwrap_or_else(|| panic!("{} no arc zeroed in multi-pivot step 1", BUG));
                tree.color_subtree((zero.i, m + zero.j))?;
            }
            step1_changes += 1;
        }
        if self.mode.color_oracle {
            tree.reset_colors();
        }
        let step1_ms = ms(s1);

        if !is_multi {
            return Ok(PivotOutcome {
                changes: step1_changes,
                step1_ms,
                step2_ms: 0.0,
            });
        }

        // Step 2.
        let s2 = Instant::now();
        let mut changes = 0u64;
        for ev in entering.iter().filter(|ev| !ev.rc.is_nan()) {
            let cycle = tree.find_cycle(Stone::new(ev.i, ev.j), self.config.cycle_strategy)?;

            let theta_fwd = cycle.min_ratio(flows, self.eps.eps, true);
            let delta_fwd = cycle.improvement(&self.instance.costs, theta_fwd, true);
            let theta_rev = cycle.min_ratio(flows, self.eps.eps, false);
            let delta_rev = cycle.improvement(&self.instance.costs, theta_rev, false);

            unzeroed.clear();
            if delta_fwd - delta_rev < self.eps.eps_rt
                || (delta_fwd.abs() < self.eps.eps_rt && delta_rev.abs() < self.eps.eps_rt)
            {
                cycle.move_flow(
                    theta_fwd,
                    flows,
                    &self.eps,
                    true,
                    true,
                    &mut exited,
                    &mut unzeroed,
                );
            } else {
                cycle.move_flow(
                    theta_rev,
                    flows,
                    &self.eps,
                    true,
                    false,
                    &mut exited,
                    &mut unzeroed,
                );
            }

            // The tree update was deferred from step 1; apply it unless the
            // reverse move just priced the entering arc back out.
            if flows.contains(n * ev.i + ev.j) {
                let leave = exited
                    .last()
                    .copied()
                    .unwrap_or_else(|| panic!("{} step 2 produced no leaving arc", BUG));
                tree.swap_arc(
                    (leave.i, m + leave.j),
                    (ev.i, m + ev.j),
                    self.config.update_levels,
                )?;
            }
            changes += 1;
        }

        Ok(PivotOutcome {
            changes,
            step1_ms,
            step2_ms: ms(s2),
        })
    }
}

// -------------------------------------------------------------------------------------------------
// Unit tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfigBuilder;
    use crate::instance::GenerateParams;
    use crate::testing_utils::assert_err;
    use std::str::FromStr;

    fn solve_with_mode(text: &str, alg_mode: u64) -> SolveReport {
        crate::testing_utils::init_logger();
        let instance = TpInstance::from_str(text).unwrap();
        let config = SolverConfigBuilder::default()
            .alg_mode(alg_mode)
            .build()
            .unwrap();
        Solver::new(instance, config).unwrap().solve().unwrap()
    }

    fn solve_generated(params: GenerateParams, alg_mode: u64) -> SolveReport {
        let instance = TpInstance::generate(params).unwrap();
        let config = SolverConfigBuilder::default()
            .alg_mode(alg_mode)
            .build()
            .unwrap();
        Solver::new(instance, config).unwrap().solve().unwrap()
    }

    const SMALL_2X2: &str = "2 2 0\n10 20\n15 15\n4 1\n2 3\n";
    const DIAG_3X3: &str = "3 3 0\n1 1 1\n1 1 1\n0 1 1\n1 0 1\n1 1 0\n";
    const FLAT_3X3: &str = "3 3 0\n5 5 5\n5 5 5\n1 2 3\n4 5 6\n7 8 9\n";

    #[test]
    fn small_2x2_reaches_the_known_optimum() {
        for alg_mode in [10000u64, 11000, 13000, 14000, 20000] {
            let report = solve_with_mode(SMALL_2X2, alg_mode);
            assert_eq!(report.status, TerminationStatus::Optimal, "mode {}", alg_mode);
            assert!(
                (report.obj_value - 55.0).abs() < 1e-6,
                "mode {} found {}",
                alg_mode,
                report.obj_value
            );
        }
    }

    #[test]
    fn diagonal_3x3_solves_to_zero_with_mmr() {
        let report = solve_with_mode(DIAG_3X3, 20000);
        assert_eq!(report.status, TerminationStatus::Optimal);
        assert_eq!(report.obj_value, 0.0);
        assert_eq!(report.initial_obj_value, 0.0, "MMR starts on the diagonal");
    }

    #[test]
    fn separable_costs_make_every_basis_optimal() {
        // c[i,j] = 3i + j + 1 is separable, so the NWC basis is already
        // optimal at 75 and the first full scan must terminate the loop.
        let report = solve_with_mode(FLAT_3X3, 10000);
        assert_eq!(report.status, TerminationStatus::Optimal);
        assert_eq!(report.initial_obj_value, 75.0);
        assert_eq!(report.obj_value, 75.0);
        assert_eq!(report.counters.iters, 1);
        assert!(report.counters.full_pricings >= 1);
    }

    #[test]
    fn mmr_initial_objective_never_beats_nwc_upward() {
        let nwc = solve_with_mode(FLAT_3X3, 10000);
        let mmr = solve_with_mode(FLAT_3X3, 20000);
        assert!(mmr.initial_obj_value <= nwc.initial_obj_value);
        assert_eq!(mmr.obj_value, nwc.obj_value);
    }

    #[test]
    fn single_row_and_single_column_instances() {
        let row = solve_with_mode("1 3 0\n30\n10 10 10\n5 6 7\n", 10000);
        assert_eq!(row.status, TerminationStatus::Optimal);
        assert_eq!(row.obj_value, 50.0 + 60.0 + 70.0);

        let col = solve_with_mode("3 1 0\n10 10 10\n30\n5\n6\n7\n", 10000);
        assert_eq!(col.status, TerminationStatus::Optimal);
        assert_eq!(col.obj_value, 50.0 + 60.0 + 70.0);
    }

    #[test]
    fn single_active_pair_forces_the_only_feasible_flow() {
        let report = solve_with_mode("2 2 0\n0 10\n0 10\n1 2\n3 4\n", 10000);
        assert_eq!(report.status, TerminationStatus::Optimal);
        assert_eq!(report.obj_value, 40.0);
    }

    #[test]
    fn all_equal_costs_terminate_on_the_first_full_scan() {
        let report = solve_with_mode("3 3 0\n4 4 4\n4 4 4\n2 2 2\n2 2 2\n2 2 2\n", 10000);
        assert_eq!(report.status, TerminationStatus::Optimal);
        assert_eq!(report.obj_value, 24.0);
        assert_eq!(report.counters.iters, 1);
    }

    #[test]
    fn dantzig_and_windowed_agree_on_a_random_50x50() {
        let params = GenerateParams {
            m: 50,
            n: 50,
            min_quantity: 1,
            max_quantity: 100,
            min_cost: 1,
            max_cost: 1000,
            seed: 7,
        };
        let p0 = solve_generated(params, 10000);
        let p3 = solve_generated(params, 13000);
        assert_eq!(p0.status, TerminationStatus::Optimal);
        assert_eq!(p3.status, TerminationStatus::Optimal);
        assert!(
            (p0.obj_value - p3.obj_value).abs() <= 1e-9 * p0.obj_value.abs(),
            "P0 found {}, P3 found {}",
            p0.obj_value,
            p3.obj_value
        );
    }

    #[test]
    fn first_negative_agrees_with_dantzig() {
        let params = GenerateParams {
            m: 20,
            n: 30,
            min_quantity: 1,
            max_quantity: 50,
            min_cost: 1,
            max_cost: 200,
            seed: 3,
        };
        let p0 = solve_generated(params, 10000);
        let p1 = solve_generated(params, 11000);
        assert!((p0.obj_value - p1.obj_value).abs() <= 1e-9 * p0.obj_value.abs());
    }

    #[test]
    fn multi_pivot_converges_to_the_single_pivot_optimum() {
        for seed in [1u64, 2, 3] {
            let params = GenerateParams {
                m: 20,
                n: 20,
                min_quantity: 1,
                max_quantity: 60,
                min_cost: 1,
                max_cost: 400,
                seed,
            };
            let single = solve_generated(params, 13000);
            for alg_mode in [13011u64, 13111, 13211] {
                let multi = solve_generated(params, alg_mode);
                assert_eq!(
                    multi.status,
                    TerminationStatus::Optimal,
                    "seed {} mode {}",
                    seed,
                    alg_mode
                );
                assert!(
                    (single.obj_value - multi.obj_value).abs()
                        <= 1e-9 * single.obj_value.abs(),
                    "seed {} mode {}: single {} multi {}",
                    seed,
                    alg_mode,
                    single.obj_value,
                    multi.obj_value
                );
            }
        }
    }

    /// Sources and destinations share one 3x3 grid and costs are squared
    /// grid distances, the regime the shielding theorem covers exactly.
    fn geometric_grid_text() -> String {
        let g = 3usize;
        let mut text = String::from("9 9 0\n3 1 2 2 1 3 1 2 3\n2 2 1 3 2 1 3 2 2\n");
        for i in 0..9 {
            let (ri, ci) = ((i / g) as i64, (i % g) as i64);
            let row: Vec<String> = (0..9)
                .map(|j| {
                    let (rj, cj) = ((j / g) as i64, (j % g) as i64);
                    format!("{}", (ri - rj).pow(2) + (ci - cj).pow(2))
                })
                .collect();
            text.push_str(&row.join(" "));
            text.push('\n');
        }
        text
    }

    #[test]
    fn shielding_single_pivot_walks_multi_candidate_lists_to_the_optimum() {
        // The shielding policy hands the single-pivot loop every negative
        // neighbour at once; the driver must pivot through the whole list
        // and fall back to full multiplier propagation afterwards.
        let text = geometric_grid_text();
        let p0 = solve_with_mode(&text, 10000);
        let p4 = solve_with_mode(&text, 14000);

        assert_eq!(p0.status, TerminationStatus::Optimal);
        assert_eq!(p4.status, TerminationStatus::Optimal);
        assert!(
            (p0.obj_value - p4.obj_value).abs() <= 1e-9 * p0.obj_value.abs().max(1.0),
            "P0 found {}, P4 found {}",
            p0.obj_value,
            p4.obj_value
        );
    }

    #[test]
    fn iteration_cap_stops_the_loop_with_exit_code_three() {
        let instance = TpInstance::generate(GenerateParams {
            m: 15,
            n: 15,
            min_quantity: 1,
            max_quantity: 40,
            min_cost: 1,
            max_cost: 300,
            seed: 5,
        })
        .unwrap();
        let config = SolverConfigBuilder::default()
            .alg_mode(10000u64)
            .max_macro_iters(1)
            .build()
            .unwrap();
        let report = Solver::new(instance, config).unwrap().solve().unwrap();
        assert_eq!(report.status, TerminationStatus::IterationLimit);
        assert_eq!(report.status.exit_code(), 3);
        assert_eq!(report.counters.iters, 1);
    }

    #[test]
    fn zero_time_limit_reports_a_timeout() {
        let instance = TpInstance::generate(GenerateParams {
            m: 15,
            n: 15,
            min_quantity: 1,
            max_quantity: 40,
            min_cost: 1,
            max_cost: 300,
            seed: 5,
        })
        .unwrap();
        let config = SolverConfigBuilder::default()
            .alg_mode(10000u64)
            .time_limit_secs(Some(0.0))
            .build()
            .unwrap();
        let report = Solver::new(instance, config).unwrap().solve().unwrap();
        assert_eq!(report.status, TerminationStatus::TimeLimit);
        assert_eq!(report.status.exit_code(), 2);
    }

    #[test]
    fn sparse_store_and_path_cut_strategy_agree_with_the_defaults() {
        let params = GenerateParams {
            m: 18,
            n: 12,
            min_quantity: 1,
            max_quantity: 50,
            min_cost: 1,
            max_cost: 250,
            seed: 9,
        };
        let base = solve_generated(params, 10000);

        let instance = TpInstance::generate(params).unwrap();
        let config = SolverConfigBuilder::default()
            .alg_mode(10000u64)
            .sparse_flows(true)
            .cycle_strategy(crate::config::CycleStrategy::PathThenCut)
            .update_levels(true)
            .build()
            .unwrap();
        let other = Solver::new(instance, config).unwrap().solve().unwrap();
        assert_eq!(base.obj_value, other.obj_value);
    }

    #[test]
    fn invalid_mode_is_rejected_at_construction() {
        let instance = TpInstance::from_str(SMALL_2X2).unwrap();
        let config = SolverConfigBuilder::default()
            .alg_mode(12000u64)
            .build()
            .unwrap();
        assert_err!(
            Solver::new(instance, config),
            Err(SolverError::Config(ConfigError::BadModeDigit { .. }))
        );
    }

    #[test]
    fn report_carries_the_record_tags() {
        let instance = TpInstance::from_str(SMALL_2X2).unwrap();
        let config = SolverConfigBuilder::default()
            .alg_mode(10000u64)
            .build()
            .unwrap();
        let report = Solver::new(instance, config).unwrap().solve().unwrap();
        assert_eq!(report.algorithm_tag, "ts_10000");
        assert_eq!(report.instance_tag, "instance");
        assert!(report.run_time >= 0.0);
        assert!(report.opt_gap.is_nan());
    }
}
