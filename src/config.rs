//! Solver configuration.
//!
//! The config is defined by a struct. A builder pattern is used to construct
//! the config in code, but it can also be constructed by deserializing a
//! TOML file. All fields have defaults, so the file only needs the settings
//! that differ:
//!
//! ```toml,ignore
//! # "ts" (transportation simplex) or "lp"; only "ts" is solved natively.
//! algorithm = "ts"
//!
//! # Packed policy digits, units first:
//! #   d0 multi-pivot on/off, d1 tree-color oracle on/off,
//! #   d2 oracle greed level (0..2), d3 pricing policy (0, 1, 3, 4),
//! #   d4 initial basis (1 = north-west corner, 2 = matrix minimum rule).
//! alg_mode = 23011
//!
//! window_size_factor = 10
//! window_size_2_factor = 10
//! time_limit_secs = 600.0
//! partition_factor = 0.25
//!
//! # Re-expressed build switches of the solver core.
//! cycle_strategy = "two-sided-apex"   # or "path-then-cut"
//! sparse_flows = false
//! lazy_clustering = false
//! update_levels = false
//! ```
//!
//! Example of the builder:
//! ```
//! use tplex::SolverConfigBuilder;
//!
//! let config = SolverConfigBuilder::default()
//!     .alg_mode(23011)
//!     .time_limit_secs(Some(30.0))
//!     .build()
//!     .unwrap();
//! assert!(config.mode().unwrap().multi_pivot);
//! ```

use std::{fs::File, io::Read, path::Path, str::FromStr};

use derive_builder::Builder;
use serde::Deserialize;
use thiserror::Error;

/// Base tolerance ε; everything below it is treated as zero.
pub const DEFAULT_EPS: f64 = 1.0e-9;

/// Hard cap on the derived round-trip tolerance `ε_rt`.
pub const MAX_ERT: f64 = 1.0e-1;

// -------------------------------------------------------------------------------------------------
// Main structs.

/// The solver configuration record.
///
/// `alg_mode` packs the five policy flags into base-10 digits (see the
/// module doc); [SolverConfig::mode] decodes and validates them.
#[derive(Deserialize, Debug, Clone, Builder)]
pub struct SolverConfig {
    #[serde(default = "defaults::algorithm")]
    #[builder(default = "Algorithm::Ts")]
    pub algorithm: Algorithm,

    #[serde(default = "defaults::alg_mode")]
    #[builder(default = "defaults::alg_mode()")]
    pub alg_mode: u64,

    /// Window size factor `W`: the windowed pricing policy scans
    /// `W·(m+n)` arcs per refill. Doubles as the shielding refresh cadence.
    #[serde(default = "defaults::window_size_factor")]
    #[builder(default = "10")]
    pub window_size_factor: u64,

    /// Secondary window factor `W₂` (reserved by the record layout).
    #[serde(default = "defaults::window_size_factor")]
    #[builder(default = "10")]
    pub window_size_2_factor: u64,

    /// Wall-clock limit in seconds; `None` disables the check.
    #[serde(default = "defaults::time_limit_secs")]
    #[builder(default = "Some(600.0)")]
    pub time_limit_secs: Option<f64>,

    /// Partition factor `α` of the cost clustering; `α < ε` requests a full
    /// sort instead of bucketing.
    #[serde(default = "defaults::partition_factor")]
    #[builder(default = "0.25")]
    pub partition_factor: f64,

    #[serde(default)]
    #[builder(default)]
    pub cycle_strategy: CycleStrategy,

    /// Use the hash-map flow store instead of the dense one.
    #[serde(default)]
    #[builder(default)]
    pub sparse_flows: bool,

    /// Split the clustered arc list lazily in two instead of eager
    /// bucketing, and grow exhausted pricing windows to the full list.
    #[serde(default)]
    #[builder(default)]
    pub lazy_clustering: bool,

    /// Maintain node depths through pivots.
    #[serde(default)]
    #[builder(default)]
    pub update_levels: bool,

    /// Macro-iteration cap; reaching it terminates with exit code 3.
    #[serde(default = "defaults::max_macro_iters")]
    #[builder(default = "u64::MAX")]
    pub max_macro_iters: u64,

    /// Base tolerance ε.
    #[serde(default = "defaults::eps")]
    #[builder(default = "DEFAULT_EPS")]
    pub eps: f64,
}

mod defaults {
    use super::{Algorithm, DEFAULT_EPS};

    pub fn algorithm() -> Algorithm {
        Algorithm::Ts
    }
    /// North-west corner initial basis, Dantzig pricing, single pivot.
    pub fn alg_mode() -> u64 {
        10000
    }
    pub fn window_size_factor() -> u64 {
        10
    }
    pub fn time_limit_secs() -> Option<f64> {
        Some(600.0)
    }
    pub fn partition_factor() -> f64 {
        0.25
    }
    pub fn max_macro_iters() -> u64 {
        u64::MAX
    }
    pub fn eps() -> f64 {
        DEFAULT_EPS
    }
}

/// Optimization algorithm tag carried into the result record.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Lp,
    Ts,
}

/// Cycle-finder strategy (a build switch in the solver core).
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CycleStrategy {
    /// Two simultaneous walks meeting at the apex; `O(cycle length)`.
    #[default]
    TwoSidedApex,
    /// Walk both sides fully to the root, then cut the common suffix.
    PathThenCut,
}

/// Pricing policy selected by `alg_mode` digit `d3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingPolicy {
    /// Full scan, single most negative reduced cost.
    Dantzig,
    /// Full scan in fixed order, first negative reduced cost.
    FirstNegative,
    /// Short-list over a window of the clustered arc list.
    Windowed,
    /// Geometric shielding neighbourhood.
    Shielding,
}

/// Initial-basis constructor selected by `alg_mode` digit `d4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialBasis {
    NorthWestCorner,
    MatrixMinimumRule,
}

/// Decoded `alg_mode` digits.
#[derive(Debug, Clone, Copy)]
pub struct AlgMode {
    pub multi_pivot: bool,
    pub color_oracle: bool,
    pub greed_level: u8,
    pub pricing: PricingPolicy,
    pub initial_basis: InitialBasis,
}

/// Derived tolerances, computed once per solve and passed around explicitly
/// so tests can vary them.
#[derive(Debug, Clone, Copy)]
pub struct Epsilons {
    /// Base tolerance ε.
    pub eps: f64,
    /// Sentinel flow `ε_q = (2 − 20·ε)·ε` carried by degenerate basic arcs.
    pub eps_q: f64,
    /// Round-trip improvement threshold `ε_rt = ε_q·(m+n)·√n`.
    pub eps_rt: f64,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown algorithm '{0}'")]
    UnknownAlgorithm(String),
    #[error("Invalid alg_mode digit {digit} for {field}")]
    BadModeDigit { field: &'static str, digit: u64 },
    #[error("ERT value too large, {0}: set a smaller eps value")]
    PrecisionTooCoarse(f64),
    #[error("Error reading the config file")]
    FileReadError(#[from] std::io::Error),
    #[error("Deserialization of the config file failed")]
    DeserializationError(#[from] toml::de::Error),
}

// -------------------------------------------------------------------------------------------------
// Implementations.

impl SolverConfig {
    /// Open and parse a TOML config file.
    pub fn deserialize(path: &Path) -> Result<Self, ConfigError> {
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        let config: SolverConfig = toml::from_str(&buf)?;
        Ok(config)
    }

    /// Decode and validate the packed `alg_mode` digits.
    pub fn mode(&self) -> Result<AlgMode, ConfigError> {
        AlgMode::decode(self.alg_mode)
    }

    /// Arcs scanned per pricing window: `W·(m+n)`, clamped to the full list
    /// when the factor is zero or the window would exceed it.
    pub fn window_len(&self, m: usize, n: usize) -> usize {
        let full = m * n;
        let w = self.window_size_factor as usize;
        match w.checked_mul(m + n) {
            Some(len) if w > 0 && len <= full => len,
            _ => full,
        }
    }

    /// Shielding refresh cadence `H_max`; the window factor doubles as it.
    pub fn shield_refresh_cap(&self) -> u64 {
        if self.window_size_factor > 0 {
            self.window_size_factor
        } else {
            u64::MAX
        }
    }

    /// Partition factor clamped so the bucket count stays at least one.
    pub fn clamped_partition_factor(&self, m: usize, n: usize) -> f64 {
        let nodes = (m + n) as f64;
        let arcs = (m * n) as f64;
        if self.partition_factor * nodes > arcs {
            arcs / nodes
        } else {
            self.partition_factor
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfigBuilder::default()
            .build()
            .expect("all builder fields carry defaults")
    }
}

impl AlgMode {
    pub fn decode(mode: u64) -> Result<Self, ConfigError> {
        let pricing = match mode / 1000 % 10 {
            0 => PricingPolicy::Dantzig,
            1 => PricingPolicy::FirstNegative,
            3 => PricingPolicy::Windowed,
            4 => PricingPolicy::Shielding,
            digit => {
                return Err(ConfigError::BadModeDigit {
                    field: "pricing policy",
                    digit,
                })
            }
        };
        let initial_basis = match mode / 10000 % 10 {
            1 => InitialBasis::NorthWestCorner,
            2 => InitialBasis::MatrixMinimumRule,
            digit => {
                return Err(ConfigError::BadModeDigit {
                    field: "initial basis",
                    digit,
                })
            }
        };
        let greed_level = (mode / 100 % 10) as u8;
        if greed_level > 2 {
            return Err(ConfigError::BadModeDigit {
                field: "oracle greed level",
                digit: greed_level as u64,
            });
        }

        Ok(AlgMode {
            multi_pivot: mode % 10 != 0,
            color_oracle: mode / 10 % 10 != 0,
            greed_level,
            pricing,
            initial_basis,
        })
    }
}

impl Epsilons {
    /// Derive `ε_q` and `ε_rt` for an `m×n` instance, enforcing the cap.
    pub fn derive(eps: f64, m: usize, n: usize) -> Result<Self, ConfigError> {
        let eps_q = (2.0 - 20.0 * eps) * eps;
        let eps_rt = eps_q * (m + n) as f64 * (n as f64).sqrt();
        if !(eps_rt + eps < MAX_ERT) {
            return Err(ConfigError::PrecisionTooCoarse(eps_rt));
        }
        Ok(Epsilons { eps, eps_q, eps_rt })
    }
}

impl Algorithm {
    pub fn tag(&self) -> &'static str {
        match self {
            Algorithm::Lp => "lp",
            Algorithm::Ts => "ts",
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lp" => Ok(Algorithm::Lp),
            "ts" => Ok(Algorithm::Ts),
            other => Err(ConfigError::UnknownAlgorithm(other.into())),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Unit tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing_utils::assert_err;

    #[test]
    fn mode_digits_decode_units_first() {
        let mode = AlgMode::decode(23011).unwrap();
        assert!(mode.multi_pivot);
        assert!(mode.color_oracle);
        assert_eq!(mode.greed_level, 0);
        assert_eq!(mode.pricing, PricingPolicy::Windowed);
        assert_eq!(mode.initial_basis, InitialBasis::MatrixMinimumRule);
    }

    #[test]
    fn mode_24111_selects_shielding_and_mmr() {
        let mode = AlgMode::decode(24111).unwrap();
        assert!(mode.multi_pivot);
        assert!(mode.color_oracle);
        assert_eq!(mode.greed_level, 1);
        assert_eq!(mode.pricing, PricingPolicy::Shielding);
        assert_eq!(mode.initial_basis, InitialBasis::MatrixMinimumRule);
    }

    #[test]
    fn bad_pricing_digit_is_rejected() {
        assert_err!(
            AlgMode::decode(12011),
            Err(ConfigError::BadModeDigit {
                field: "pricing policy",
                digit: 2
            })
        );
    }

    #[test]
    fn mode_zero_is_rejected() {
        assert_err!(
            AlgMode::decode(0),
            Err(ConfigError::BadModeDigit {
                field: "initial basis",
                digit: 0
            })
        );
    }

    #[test]
    fn epsilons_derive_matches_formula() {
        let e = Epsilons::derive(DEFAULT_EPS, 100, 100).unwrap();
        let eps_q = (2.0 - 20.0 * DEFAULT_EPS) * DEFAULT_EPS;
        assert_eq!(e.eps_q, eps_q);
        assert_eq!(e.eps_rt, eps_q * 200.0 * 10.0);
    }

    #[test]
    fn coarse_eps_fails_construction() {
        assert_err!(
            Epsilons::derive(1.0e-3, 10_000, 10_000),
            Err(ConfigError::PrecisionTooCoarse(_))
        );
    }

    #[test]
    fn toml_round_trip_with_partial_fields() {
        let config: SolverConfig =
            toml::from_str("alg_mode = 13011\ncycle_strategy = \"path-then-cut\"").unwrap();
        assert_eq!(config.alg_mode, 13011);
        assert_eq!(config.cycle_strategy, CycleStrategy::PathThenCut);
        assert_eq!(config.window_size_factor, 10);
        assert_eq!(config.time_limit_secs, Some(600.0));
        assert_eq!(config.algorithm, Algorithm::Ts);
    }

    #[test]
    fn window_len_clamps_to_full_list() {
        let mut config = SolverConfig::default();
        config.window_size_factor = 10;
        assert_eq!(config.window_len(100, 100), 2000);
        // Window larger than the arc list collapses to a full scan.
        assert_eq!(config.window_len(3, 3), 9);
        config.window_size_factor = 0;
        assert_eq!(config.window_len(100, 100), 10_000);
    }
}
