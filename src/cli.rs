//! Command Line Interface.
//!
//! Output of `--help`:
//! ```text
//! Exact transportation-problem solver (iterated inside-out simplex)
//!
//!     Usage: tplex [OPTIONS] <INSTANCE>
//!
//!     Arguments:
//!         <INSTANCE>  Path to the instance file ('-' reads stdin)
//!
//!     Options:
//!         -c, --config <CONFIG>          TOML file with the solver configuration
//!             --mode <MODE>              Packed alg_mode digits, overriding the config file
//!             --time-limit <TIME_LIMIT>  Wall-clock limit in seconds, overriding the config file
//!         -o, --out <OUT>                Write the result record here instead of the derived name
//!         -v, --verbose...               More output per occurrence
//!         -q, --quiet...                 Less output per occurrence
//!         -h, --help                     Print help
//!         -V, --version                  Print version
//! ```

use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use patharg::InputArg;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the instance file ('-' reads stdin).
    pub instance: InputArg,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// TOML file with the solver configuration (all fields optional).
    #[clap(short, long, value_parser)]
    pub config: Option<PathBuf>,

    /// Packed alg_mode digits, overriding the config file.
    #[arg(long)]
    pub mode: Option<u64>,

    /// Wall-clock limit in seconds, overriding the config file.
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// Write the result record here instead of the derived
    /// `<instance>_<alg>_<mode>.optres` name.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}
