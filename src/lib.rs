// Copyright ⓒ 2024 the tplex contributors
// Licensed under the MIT license
// (see LICENSE or <http://opensource.org/licenses/MIT>) All files in the project carrying such
// notice may not be copied, modified, or distributed except according to those terms.

//! # Exact transportation-problem solver in Rust
//!
//! Implementation of the transportation simplex with the iterated
//! inside-out multi-pivot scheme: given `m` sources with supplies, `n`
//! destinations with demands (equal totals) and a dense unit-cost matrix,
//! find non-negative flows meeting all supply and demand equalities at
//! minimum total cost.
//!
//! ## What is contained in this code
//!
//! The solver core keeps the basis as a rooted spanning tree over the
//! `m+n` bipartite nodes and iterates macro-steps of dual-multiplier
//! propagation, reduced-cost pricing and stepping-stone pivoting. Four
//! pricing policies are available (Dantzig, first-negative, a windowed
//! short-list over a cost-clustered arc list, and a geometric shielding
//! neighbourhood), two initial-basis constructors (north-west corner and
//! matrix minimum rule), and an optional multi-pivot mode that applies many
//! entering arcs per macro-iteration under a tree-colouring safety oracle,
//! followed by a bi-directional improvement pass.
//!
//! ## How this code can be used
//!
//! There is both a Rust API and a CLI. The API in short:
//!
//! ```
//! use std::str::FromStr;
//!
//! use tplex::{Solver, SolverConfigBuilder, TerminationStatus, TpInstance};
//!
//! fn main() {
//!     // m n seed, supplies, demands, row-major costs.
//!     let instance = TpInstance::from_str(
//!         "2 2 0\n10 20\n15 15\n4 1\n2 3\n",
//!     )
//!     .unwrap();
//!
//!     // North-west corner basis, windowed pricing, multi-pivot rounds
//!     // guarded by the tree-colour oracle.
//!     let config = SolverConfigBuilder::default()
//!         .alg_mode(13011)
//!         .time_limit_secs(Some(60.0))
//!         .build()
//!         .unwrap();
//!
//!     let mut solver = Solver::new(instance, config).unwrap();
//!     let report = solver.solve().unwrap();
//!
//!     assert_eq!(report.status, TerminationStatus::Optimal);
//!     assert_eq!(report.obj_value, 55.0);
//!     println!("{}", report.record_line());
//! }
//! ```
//!
//! Instances can also be generated from a seed (see
//! [TpInstance::generate]), and configurations read from TOML files (see
//! [SolverConfig::deserialize]); the CLI wires both to the result-record
//! file format consumed by the downstream tooling.

pub mod cli;
pub mod utils;

mod flow;
pub use flow::FlowStore;

mod instance;
pub use instance::{GenerateParams, InstanceError, TpInstance};

mod config;
pub use config::{
    AlgMode, Algorithm, ConfigError, CycleStrategy, Epsilons, InitialBasis, PricingPolicy,
    SolverConfig, SolverConfigBuilder, DEFAULT_EPS, MAX_ERT,
};

mod spanning_tree;
pub use spanning_tree::{Cycle, SpanningTree, Stone, TreeError};

mod heuristics;
pub use heuristics::{cluster_arcs, matrix_min_rule, north_west_corner, ArcList, HeuristicOutcome};

mod pricing;
pub use pricing::{Candidate, PricingOutcome, ShieldingData};

mod shielding;
pub use shielding::{compute_shields, square_grid, Grid, GridCell, Rect};

mod solver;
pub use solver::{Solver, SolverError};

mod result;
pub use result::{Counters, ReportWriteError, SolveReport, TerminationStatus, Timings};

#[cfg(test)]
mod testing_utils;
