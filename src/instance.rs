//! Transportation problem instances.
//!
//! The text format is whitespace separated: a header `m n seed`, then `m`
//! supply quantities, then `n` demand quantities, then the `m·n` row-major
//! cost matrix. Quantities are integral in the target regime but parsed as
//! doubles.
//!
//! Instances can also be generated from a seed, which is how the randomized
//! tests and the benchmarks get balanced inputs without shipping fixture
//! files.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use log::info;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::config::DEFAULT_EPS;

// -------------------------------------------------------------------------------------------------
// Main structs.

/// A balanced transportation problem: `m` sources with supplies, `n`
/// destinations with demands, and a dense row-major unit-cost matrix.
#[derive(Debug, Clone)]
pub struct TpInstance {
    pub m: usize,
    pub n: usize,
    pub seed: u64,
    pub supplies: Vec<f64>,
    pub demands: Vec<f64>,
    /// Row-major, `costs[i * n + j]`.
    pub costs: Vec<f64>,
    pub total_supply: f64,
    pub total_demand: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub avg_cost: f64,
    /// Tag used in log lines and the result record; set from the file stem
    /// by the CLI, or synthesised by the generator.
    pub name: String,
}

/// Parameters for the seeded random generator.
///
/// Supplies and demands are drawn uniformly from `[min_quantity,
/// max_quantity]` (scaled on the longer side so both totals have the same
/// expectation) and then patched until the totals match exactly. Costs are
/// drawn uniformly from `[min_cost, max_cost]` as integers.
#[derive(Debug, Clone, Copy)]
pub struct GenerateParams {
    pub m: usize,
    pub n: usize,
    pub min_quantity: u64,
    pub max_quantity: u64,
    pub min_cost: u64,
    pub max_cost: u64,
    pub seed: u64,
}

#[derive(Error, Debug)]
pub enum InstanceError {
    #[error("Instance must have at least one source and one destination")]
    EmptyDimension,
    #[error("Instance too large, m*n overflows the arc index type")]
    TooLarge,
    #[error("Malformed {field} at position {pos}")]
    MalformedField { field: &'static str, pos: usize },
    #[error("Negative {field} at position {pos}")]
    NegativeQuantity { field: &'static str, pos: usize },
    #[error("Unbalanced instance: total supply {supply} != total demand {demand}")]
    Unbalanced { supply: f64, demand: f64 },
    #[error("Problem reading instance file")]
    FileReadError(#[from] std::io::Error),
}

// -------------------------------------------------------------------------------------------------
// Parsing.

/// Pull the next whitespace-separated token and parse it.
fn next_token<T: FromStr>(
    tokens: &mut dyn Iterator<Item = &str>,
    field: &'static str,
    pos: usize,
) -> Result<T, InstanceError> {
    tokens
        .next()
        .and_then(|t| t.parse::<T>().ok())
        .ok_or(InstanceError::MalformedField { field, pos })
}

impl FromStr for TpInstance {
    type Err = InstanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();

        let m: usize = next_token(&mut tokens, "m", 0)?;
        let n: usize = next_token(&mut tokens, "n", 1)?;
        let seed: u64 = next_token(&mut tokens, "seed", 2)?;

        if m == 0 || n == 0 {
            return Err(InstanceError::EmptyDimension);
        }
        let arc_count = m
            .checked_mul(n)
            .filter(|mn| *mn <= i64::MAX as usize)
            .ok_or(InstanceError::TooLarge)?;

        let mut supplies = Vec::with_capacity(m);
        let mut total_supply = 0.0;
        for i in 0..m {
            let q: f64 = next_token(&mut tokens, "supply", i)?;
            if q < 0.0 {
                return Err(InstanceError::NegativeQuantity {
                    field: "supply",
                    pos: i,
                });
            }
            total_supply += q;
            supplies.push(q);
        }

        let mut demands = Vec::with_capacity(n);
        let mut total_demand = 0.0;
        for j in 0..n {
            let q: f64 = next_token(&mut tokens, "demand", j)?;
            if q < 0.0 {
                return Err(InstanceError::NegativeQuantity {
                    field: "demand",
                    pos: j,
                });
            }
            total_demand += q;
            demands.push(q);
        }

        if (total_supply - total_demand).abs() > DEFAULT_EPS * (m + n) as f64 {
            return Err(InstanceError::Unbalanced {
                supply: total_supply,
                demand: total_demand,
            });
        }

        let mut costs = Vec::with_capacity(arc_count);
        let mut min_cost = f64::MAX;
        let mut max_cost = f64::MIN;
        let mut avg_cost = 0.0;
        let cf = 1.0 / arc_count as f64;
        for c in 0..arc_count {
            let cost: f64 = next_token(&mut tokens, "cost", c)?;
            min_cost = min_cost.min(cost);
            max_cost = max_cost.max(cost);
            avg_cost += cost * cf;
            costs.push(cost);
        }

        Ok(TpInstance {
            m,
            n,
            seed,
            supplies,
            demands,
            costs,
            total_supply,
            total_demand,
            min_cost,
            max_cost,
            avg_cost,
            name: String::new(),
        })
    }
}

// -------------------------------------------------------------------------------------------------
// Implementations.

impl TpInstance {
    /// Read and parse an instance file, tagging it with the file stem.
    pub fn from_file(path: &Path) -> Result<Self, InstanceError> {
        let text = std::fs::read_to_string(path)?;
        let mut instance = Self::from_str(&text)?;
        instance.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(instance)
    }

    pub fn arc_count(&self) -> usize {
        self.m * self.n
    }

    pub fn node_count(&self) -> usize {
        self.m + self.n
    }

    pub fn cost(&self, i: usize, j: usize) -> f64 {
        self.costs[i * self.n + j]
    }

    /// Write the instance back out in the input text format.
    pub fn write_to(&self, w: &mut dyn Write) -> Result<(), InstanceError> {
        writeln!(w, "{} {} {}", self.m, self.n, self.seed)?;
        let line = |qs: &[f64]| {
            qs.iter()
                .map(|q| format!("{}", *q as u64))
                .collect::<Vec<_>>()
                .join(" ")
        };
        writeln!(w, "{}", line(&self.supplies))?;
        writeln!(w, "{}", line(&self.demands))?;
        for i in 0..self.m {
            let row: Vec<String> = (0..self.n).map(|j| format!("{}", self.cost(i, j))).collect();
            writeln!(w, "{}", row.join(" "))?;
        }
        Ok(())
    }

    /// Generate a random balanced instance from the given seed.
    pub fn generate(params: GenerateParams) -> Result<Self, InstanceError> {
        let GenerateParams {
            m,
            n,
            min_quantity,
            max_quantity,
            min_cost,
            max_cost,
            seed,
        } = params;

        if m == 0 || n == 0 {
            return Err(InstanceError::EmptyDimension);
        }
        let arc_count = m
            .checked_mul(n)
            .filter(|mn| *mn <= i64::MAX as usize)
            .ok_or(InstanceError::TooLarge)?;

        info!("Generate instance with random seed {} ...", seed);
        let mut rng = StdRng::seed_from_u64(seed);

        // Scale the smaller side up so both totals have the same expectation.
        let src_cf = (n as f64 / m as f64).ceil().max(1.0) as u64;
        let dst_cf = (m as f64 / n as f64).ceil().max(1.0) as u64;

        let src_distr = Uniform::new_inclusive(min_quantity, max_quantity * src_cf);
        let mut supplies: Vec<f64> = (0..m).map(|_| src_distr.sample(&mut rng) as f64).collect();
        let mut total_supply: f64 = supplies.iter().sum();

        let dst_distr = Uniform::new_inclusive(min_quantity, max_quantity * dst_cf);
        let mut demands: Vec<f64> = (0..n).map(|_| dst_distr.sample(&mut rng) as f64).collect();
        let mut total_demand: f64 = demands.iter().sum();

        // Patch random entries until the totals agree, never pushing an entry
        // over its side's cap.
        let row_pick = Uniform::new(0, m);
        let col_pick = Uniform::new(0, n);
        while (total_supply - total_demand).abs() > DEFAULT_EPS {
            let diff = (total_supply - total_demand).abs() as u64;
            let patch = Uniform::new_inclusive(min_quantity.min(diff), diff).sample(&mut rng) as f64;
            if total_supply < total_demand {
                let i = row_pick.sample(&mut rng);
                let add = patch.min((src_cf * max_quantity) as f64 - supplies[i]);
                supplies[i] += add;
                total_supply += add;
            } else {
                let j = col_pick.sample(&mut rng);
                let add = patch.min((dst_cf * max_quantity) as f64 - demands[j]);
                demands[j] += add;
                total_demand += add;
            }
        }

        let cost_distr = Uniform::new_inclusive(min_cost, max_cost);
        let mut costs = Vec::with_capacity(arc_count);
        let mut minc = f64::MAX;
        let mut maxc = f64::MIN;
        let mut avgc = 0.0;
        let cf = 1.0 / arc_count as f64;
        for _ in 0..arc_count {
            let c = cost_distr.sample(&mut rng) as f64;
            minc = minc.min(c);
            maxc = maxc.max(c);
            avgc += c * cf;
            costs.push(c);
        }

        let name = format!(
            "tp_{}_{}_{}_{}_{}_{}",
            min_quantity, max_quantity, min_cost, max_cost, m, n
        );

        Ok(TpInstance {
            m,
            n,
            seed,
            supplies,
            demands,
            costs,
            total_supply,
            total_demand,
            min_cost: minc,
            max_cost: maxc,
            avg_cost: avgc,
            name,
        })
    }

    pub fn log_info(&self) {
        info!(
            "T. problem has {} supply facilities and {} demand spots",
            self.m, self.n
        );
        info!(
            "Total supply {:.0}, total demand {:.0}",
            self.total_supply, self.total_demand
        );
        info!(
            "Cost range [{}, {}], average {:.3}",
            self.min_cost, self.max_cost, self.avg_cost
        );
    }
}

impl fmt::Display for TpInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}x{})", self.name, self.m, self.n)
    }
}

// -------------------------------------------------------------------------------------------------
// Unit tests.
