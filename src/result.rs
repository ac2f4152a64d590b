//! Solve reports and the result record file.
//!
//! Downstream tooling consumes the `.optres` record line positionally, so
//! the field order is frozen: tags, optimality flag, six doubles
//! (`root_lprlx root_time best_bound obj_value opt_gap run_time`), the
//! integer counters, then the per-phase timing doubles. The LP-relaxation
//! slots stay NaN for the transportation simplex; they exist so LP and TS
//! runs share one record layout.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::info;
use thiserror::Error;

// -------------------------------------------------------------------------------------------------
// Main structs.

/// Why the macro-loop stopped. Time and iteration limits are ordinary
/// outcomes here, not errors; they surface through the record and the
/// process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    Optimal,
    TimeLimit,
    IterationLimit,
}

/// Integer counters of the record, in record order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    /// Macro-iterations: pricing rounds that recomputed their working set.
    pub macro_iters: u64,
    /// Driver loop iterations.
    pub iters: u64,
    /// Basis changes (pivots applied).
    pub basis_changes: u64,
    /// Pricing calls that completed a full scan of their list.
    pub full_pricings: u64,
    /// Shielding neighbourhood refreshes.
    pub shield_refreshes: u64,
    /// Entering candidates handed to the pivoting phase.
    pub tested_candidates: u64,
}

/// Per-phase wall-clock milliseconds, in record order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timings {
    pub init_ms: f64,
    pub heuristic_ms: f64,
    pub multipliers_ms: f64,
    pub pricing_ms: f64,
    pub pivot_ms: f64,
    pub step1_ms: f64,
    pub step2_ms: f64,
    pub total_ms: f64,
}

/// Everything a solve run reports back.
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub instance_tag: String,
    pub algorithm_tag: String,
    pub status: TerminationStatus,

    pub root_lprlx: f64,
    pub root_time: f64,
    pub best_bound: f64,
    pub obj_value: f64,
    pub opt_gap: f64,
    /// Seconds.
    pub run_time: f64,

    /// Objective of the initial heuristic basis; logged, not in the record.
    pub initial_obj_value: f64,
    pub counters: Counters,
    pub timings: Timings,
}

#[derive(Error, Debug)]
pub enum ReportWriteError {
    #[error("Problem writing the result record")]
    FileWriteError(#[from] std::io::Error),
}

// -------------------------------------------------------------------------------------------------
// Implementations.

impl TerminationStatus {
    /// Process exit code contract: 1 optimal, 2 time limit, 3 iteration cap.
    pub fn exit_code(&self) -> i32 {
        match self {
            TerminationStatus::Optimal => 1,
            TerminationStatus::TimeLimit => 2,
            TerminationStatus::IterationLimit => 3,
        }
    }

    /// The record's optimality flag.
    pub fn tag(&self) -> &'static str {
        match self {
            TerminationStatus::Optimal => "Optimal",
            _ => "NotOptimal",
        }
    }
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TerminationStatus::Optimal => write!(f, "optimal solution found"),
            TerminationStatus::TimeLimit => write!(f, "time limit reached"),
            TerminationStatus::IterationLimit => write!(f, "iteration limit reached"),
        }
    }
}

impl SolveReport {
    /// The record file name `<instance>_<alg>_<mode>.optres`; the algorithm
    /// tag already carries the mode digits.
    pub fn file_name(instance_tag: &str, algorithm_tag: &str) -> String {
        format!("{}_{}.optres", instance_tag, algorithm_tag)
    }

    /// The single record line, fields in the frozen order.
    pub fn record_line(&self) -> String {
        let c = &self.counters;
        let t = &self.timings;
        format!(
            "{} {} {} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
            self.instance_tag,
            self.algorithm_tag,
            self.status.tag(),
            self.root_lprlx,
            self.root_time,
            self.best_bound,
            self.obj_value,
            self.opt_gap,
            self.run_time,
            c.macro_iters,
            c.iters,
            c.basis_changes,
            c.full_pricings,
            c.shield_refreshes,
            c.tested_candidates,
            t.init_ms,
            t.heuristic_ms,
            t.multipliers_ms,
            t.pricing_ms,
            t.pivot_ms,
            t.step1_ms,
            t.step2_ms,
            t.total_ms,
        )
    }

    /// Write the record line to `path`.
    pub fn write(&self, path: &Path) -> Result<(), ReportWriteError> {
        let mut file = File::create(path)?;
        writeln!(file, "{}", self.record_line())?;
        info!("Result record written to {:?}", path);
        Ok(())
    }

    pub fn log_summary(&self) {
        info!("----------------------------------------");
        info!("{:>16} {:>24.0}", "objf", self.obj_value);
        info!("{:>16} {:>24.3} [s]", "time", self.run_time);
        info!("{:>16} {:>24}", "iterations", self.counters.iters);
        info!("{:>16} {:>24}", "basis changes", self.counters.basis_changes);
        info!("{:>16} {:>24}", "full pricings", self.counters.full_pricings);
        info!("----------------------------------------");
    }
}

// -------------------------------------------------------------------------------------------------
// Unit tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SolveReport {
        SolveReport {
            instance_tag: "tp_1_100_1_1000_50_50_1".into(),
            algorithm_tag: "ts_23011".into(),
            status: TerminationStatus::Optimal,
            root_lprlx: f64::NAN,
            root_time: f64::NAN,
            best_bound: f64::NAN,
            obj_value: 55.0,
            opt_gap: f64::NAN,
            run_time: 0.125,
            initial_obj_value: 75.0,
            counters: Counters {
                macro_iters: 3,
                iters: 12,
                basis_changes: 11,
                full_pricings: 1,
                shield_refreshes: 0,
                tested_candidates: 40,
            },
            timings: Timings::default(),
        }
    }

    #[test]
    fn record_line_field_order_is_frozen() {
        let line = report().record_line();
        let fields: Vec<&str> = line.split(' ').collect();

        assert_eq!(fields[0], "tp_1_100_1_1000_50_50_1");
        assert_eq!(fields[1], "ts_23011");
        assert_eq!(fields[2], "Optimal");
        // Six doubles, with obj_value fourth among them.
        assert_eq!(fields[6], "55.0000");
        assert_eq!(fields[8], "0.1250");
        // Integer counters follow.
        assert_eq!(fields[9], "3");
        assert_eq!(fields[10], "12");
        assert_eq!(fields[11], "11");
        // Eight timing doubles close the line.
        assert_eq!(fields.len(), 9 + 6 + 8);
    }

    #[test]
    fn exit_codes_match_contract() {
        assert_eq!(TerminationStatus::Optimal.exit_code(), 1);
        assert_eq!(TerminationStatus::TimeLimit.exit_code(), 2);
        assert_eq!(TerminationStatus::IterationLimit.exit_code(), 3);
        assert_eq!(TerminationStatus::TimeLimit.tag(), "NotOptimal");
    }

    #[test]
    fn file_name_derivation() {
        assert_eq!(
            SolveReport::file_name("inst7", "ts_23011"),
            "inst7_ts_23011.optres"
        );
    }
}
